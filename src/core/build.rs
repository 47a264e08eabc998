//! Distribution artifact build.

use std::fs;
use std::path::Path;

use glob_match::glob_match;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::utils::command;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Run the build command in the checkout and collect the artifacts it
/// produced in the dist directory.
pub fn run_build(checkout: &Path, config: &BuildConfig) -> Result<Vec<Artifact>> {
    let output = command::run_shell_in(checkout, &config.command, "build command")?;

    if !output.status.success() {
        return Err(Error::build_failed(format!(
            "'{}' exited with {}: {}",
            config.command,
            output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            command::error_text(&output)
        )));
    }

    let dist_dir = checkout.join(&config.dist_dir);
    let artifacts = collect_artifacts(&dist_dir, &config.artifact_glob)?;

    if artifacts.is_empty() {
        return Err(Error::build_failed(format!(
            "Build succeeded but produced no artifacts in {}",
            dist_dir.display()
        )));
    }

    Ok(artifacts)
}

/// List regular files in the dist directory whose names match the artifact
/// glob, digesting each.
pub fn collect_artifacts(dist_dir: &Path, pattern: &str) -> Result<Vec<Artifact>> {
    if !dist_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dist_dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("list {}", dist_dir.display())))
    })?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("list {}", dist_dir.display())))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !glob_match(pattern, &file_name) {
            continue;
        }

        let bytes = fs::read(&path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
        })?;

        artifacts.push(Artifact {
            path: path.display().to_string(),
            file_name,
            size_bytes: bytes.len() as u64,
            sha256: sha256_hex(&bytes),
        });
    }

    // Stable order for reports and tests
    artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(artifacts)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
