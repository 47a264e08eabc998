//! Language runtime provisioning check.
//!
//! The hosted runner this tool replaces provisioned a runtime per run. On a
//! workstation the runtime is already installed or it isn't: provisioning
//! reduces to locating the program and reporting its version.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::utils::command;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub program: String,
    pub version: String,
}

/// Verify the configured runtime is on PATH and extract its version.
pub fn provision(config: &RuntimeConfig) -> Result<RuntimeInfo> {
    let args: Vec<&str> = config.version_args.iter().map(String::as_str).collect();
    let output = command::run(&config.program, &args, "runtime version check")
        .map_err(|e| Error::runtime_unavailable(&config.program, e.message))?;

    let version = extract_version(&output).ok_or_else(|| {
        Error::runtime_unavailable(
            &config.program,
            format!("Could not parse a version from '{}'", output),
        )
    })?;

    Ok(RuntimeInfo {
        program: config.program.clone(),
        version,
    })
}

/// Pull the first dotted version number out of version-command output.
pub fn extract_version(output: &str) -> Option<String> {
    let re = Regex::new(r"(\d+\.\d+(?:\.\d+)?)").ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_version_from_typical_output() {
        assert_eq!(
            extract_version("Python 3.12.4"),
            Some("3.12.4".to_string())
        );
        assert_eq!(extract_version("v20.11"), Some("20.11".to_string()));
        assert_eq!(
            extract_version("rustc 1.80.0 (abc 2024)"),
            Some("1.80.0".to_string())
        );
    }

    #[test]
    fn no_version_in_output_is_none() {
        assert_eq!(extract_version("no digits here"), None);
    }

    #[test]
    fn missing_program_is_runtime_unavailable() {
        let config = RuntimeConfig {
            program: "definitely_not_a_runtime_xyz".to_string(),
            version_args: vec!["--version".to_string()],
        };
        let err = provision(&config).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::RuntimeUnavailable);
    }

    #[test]
    fn provision_reports_program_and_version() {
        // echo stands in for a runtime that prints its version
        let config = RuntimeConfig {
            program: "echo".to_string(),
            version_args: vec!["fake 9.9.9".to_string()],
        };
        let info = provision(&config).unwrap();
        assert_eq!(info.program, "echo");
        assert_eq!(info.version, "9.9.9");
    }
}
