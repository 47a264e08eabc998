//! Package manifest discovery in a checkout.
//!
//! The publish step needs the package name and declared version. Manifest
//! formats are probed in order: `pyproject.toml`, `Cargo.toml`,
//! `package.json`. The first one found wins.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub manifest_file: String,
}

/// Read the package manifest from a checkout directory.
pub fn read(dir: &Path) -> Result<PackageManifest> {
    let pyproject = dir.join("pyproject.toml");
    if pyproject.exists() {
        return read_toml_manifest(&pyproject, "project");
    }

    let cargo = dir.join("Cargo.toml");
    if cargo.exists() {
        return read_toml_manifest(&cargo, "package");
    }

    let package_json = dir.join("package.json");
    if package_json.exists() {
        return read_package_json(&package_json);
    }

    Err(Error::build_failed(format!(
        "No package manifest found in {} (tried pyproject.toml, Cargo.toml, package.json)",
        dir.display()
    )))
}

fn read_toml_manifest(path: &Path, table: &str) -> Result<PackageManifest> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let value: toml::Value = content.parse().map_err(|e: toml::de::Error| {
        Error::build_failed(format!("Invalid TOML in {}: {}", path.display(), e))
    })?;

    let section = value.get(table).ok_or_else(|| {
        Error::config_missing_key(table, Some(path.display().to_string()))
    })?;

    let name = section
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::config_missing_key(format!("{}.name", table), Some(path.display().to_string()))
        })?;

    let version = section
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::config_missing_key(
                format!("{}.version", table),
                Some(path.display().to_string()),
            )
        })?;

    Ok(PackageManifest {
        name: name.to_string(),
        version: version.to_string(),
        manifest_file: file_name(path),
    })
}

fn read_package_json(path: &Path) -> Result<PackageManifest> {
    #[derive(Deserialize)]
    struct PackageJson {
        name: String,
        version: String,
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let parsed: PackageJson = serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;

    Ok(PackageManifest {
        name: parsed.name,
        version: parsed.version,
        manifest_file: file_name(path),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pyproject() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo-pkg\"\nversion = \"1.2.3\"\n",
        )
        .unwrap();

        let manifest = read(dir.path()).unwrap();
        assert_eq!(manifest.name, "demo-pkg");
        assert_eq!(manifest.version, "1.2.3");
        assert_eq!(manifest.manifest_file, "pyproject.toml");
    }

    #[test]
    fn reads_cargo_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"0.3.0\"\nedition = \"2021\"\n",
        )
        .unwrap();

        let manifest = read(dir.path()).unwrap();
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.version, "0.3.0");
    }

    #[test]
    fn reads_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            "{\"name\": \"demo-js\", \"version\": \"2.0.0\"}",
        )
        .unwrap();

        let manifest = read(dir.path()).unwrap();
        assert_eq!(manifest.name, "demo-js");
        assert_eq!(manifest.version, "2.0.0");
    }

    #[test]
    fn pyproject_wins_over_cargo() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"py\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"rs\"\nversion = \"2.0.0\"\n",
        )
        .unwrap();

        assert_eq!(read(dir.path()).unwrap().name, "py");
    }

    #[test]
    fn missing_manifest_is_build_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = read(dir.path()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::BuildFailed);
    }

    #[test]
    fn missing_version_field_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n",
        )
        .unwrap();

        let err = read(dir.path()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigMissingKey);
    }
}
