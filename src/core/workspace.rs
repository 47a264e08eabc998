//! Ephemeral checkout workspace.
//!
//! Every run gets a fresh temporary directory that holds the source checkout
//! and is deleted when the run ends, matching the disposable-runner model of
//! the workflow this tool replaces.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    checkout: PathBuf,
}

impl Workspace {
    /// Root of the source checkout inside the workspace.
    pub fn checkout_path(&self) -> &Path {
        &self.checkout
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Clone `source` at `tag` into a fresh workspace.
///
/// `source` is a remote URL or a local repository path (tilde-expanded).
/// A shallow single-branch clone is enough: the run only ever needs the
/// tagged tree.
pub fn checkout(source: &str, tag: &str) -> Result<Workspace> {
    let dir = TempDir::new().map_err(|e| {
        Error::internal_io(e.to_string(), Some("create workspace".to_string()))
    })?;

    let source = shellexpand::tilde(source).to_string();
    let checkout = dir.path().join("src");
    let target = checkout.to_string_lossy();

    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--branch", tag, source.as_str(), &*target])
        .output()
        .map_err(|e| Error::git_command_failed(format!("Failed to run git clone: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::checkout_failed(format!(
            "git clone of '{}' at '{}' failed: {}",
            source,
            tag,
            stderr.trim()
        )));
    }

    Ok(Workspace { dir, checkout })
}
