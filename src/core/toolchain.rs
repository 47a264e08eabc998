//! Packaging tool installation at a pinned version.
//!
//! The install and version-check commands come from config so the tool step
//! works for any runtime, not just Python. `{runtime}`, `{package}` and
//! `{version}` placeholders expand before the commands run.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::runtime::RuntimeInfo;
use crate::utils::command;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub package: String,
    pub version: String,
}

/// Install the packaging tool into the runtime at the pinned version, then
/// verify the installed version actually matches the pin.
pub fn install(runtime: &RuntimeInfo, config: &ToolConfig) -> Result<ToolInfo> {
    let install_cmd = expand(&config.install_command, runtime, config);
    command::run("sh", &["-c", install_cmd.as_str()], "tool install")
        .map_err(|e| Error::tool_install_failed(e.message))?;

    let installed = installed_version(runtime, config)?;
    if installed != config.version {
        return Err(Error::tool_install_failed(format!(
            "Pinned {} {} but resolved {}",
            config.package, config.version, installed
        )));
    }

    Ok(ToolInfo {
        package: config.package.clone(),
        version: installed,
    })
}

fn installed_version(runtime: &RuntimeInfo, config: &ToolConfig) -> Result<String> {
    let version_cmd = expand(&config.version_command, runtime, config);
    let output = command::run("sh", &["-c", version_cmd.as_str()], "tool version check")
        .map_err(|e| Error::tool_install_failed(e.message))?;

    parse_show_version(&output).ok_or_else(|| {
        Error::tool_install_failed(format!(
            "Could not determine installed version of '{}'",
            config.package
        ))
    })
}

fn expand(template: &str, runtime: &RuntimeInfo, config: &ToolConfig) -> String {
    template
        .replace("{runtime}", &runtime.program)
        .replace("{package}", &config.package)
        .replace("{version}", &config.version)
}

/// Extract the `Version:` field from version-command output.
pub fn parse_show_version(output: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^Version:\s*(\S+)").ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(program: &str) -> RuntimeInfo {
        RuntimeInfo {
            program: program.to_string(),
            version: "0.0.0".to_string(),
        }
    }

    #[test]
    fn parses_version_field() {
        let output = "Name: build\nVersion: 1.2.2\nSummary: A build backend\n";
        assert_eq!(parse_show_version(output), Some("1.2.2".to_string()));
    }

    #[test]
    fn ignores_version_mentions_mid_line() {
        let output = "Summary: Version: tool\nVersion: 0.9.1\n";
        assert_eq!(parse_show_version(output), Some("0.9.1".to_string()));
    }

    #[test]
    fn missing_version_field_is_none() {
        assert_eq!(parse_show_version("Name: build\n"), None);
    }

    #[test]
    fn default_commands_expand_runtime_and_pin() {
        let config = ToolConfig::default();
        let cmd = expand(&config.install_command, &runtime("python3"), &config);
        assert_eq!(
            cmd,
            "python3 -m pip install --disable-pip-version-check --quiet build==1.2.2"
        );

        let cmd = expand(&config.version_command, &runtime("node"), &config);
        assert_eq!(cmd, "node -m pip show build");
    }

    #[test]
    fn install_runs_configured_commands() {
        // Fake commands stand in for a real installer
        let config = ToolConfig {
            install_command: "true".to_string(),
            version_command: "printf 'Version: 1.2.2\\n'".to_string(),
            ..ToolConfig::default()
        };

        let tool = install(&runtime("fakelang"), &config).unwrap();
        assert_eq!(tool.package, "build");
        assert_eq!(tool.version, "1.2.2");
    }

    #[test]
    fn resolved_version_mismatch_fails_install() {
        let config = ToolConfig {
            install_command: "true".to_string(),
            version_command: "printf 'Version: 9.9.9\\n'".to_string(),
            ..ToolConfig::default()
        };

        let err = install(&runtime("fakelang"), &config).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ToolInstallFailed);
        assert!(err.details["detail"]
            .as_str()
            .unwrap()
            .contains("Pinned build 1.2.2"));
    }
}
