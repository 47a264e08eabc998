//! Global configuration for release runs.
//!
//! Stored as pretty-printed JSON at `~/.config/tagship/tagship.json`.
//! A missing file yields the defaults; writes are atomic (temp file + rename).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub trigger: TriggerConfig,
    /// Repository to clone when `--repo` is not given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub runtime: RuntimeConfig,
    pub tool: ToolConfig,
    pub build: BuildConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerConfig {
    /// Glob pattern a pushed tag must match to qualify for release.
    pub pattern: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            pattern: "v*".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    /// Language runtime the build runs under.
    pub program: String,
    /// Arguments that make the runtime print its version.
    pub version_args: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            version_args: vec!["--version".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolConfig {
    /// Packaging tool installed into the runtime before building.
    pub package: String,
    /// Pinned tool version. Install fails if the resolved version differs.
    pub version: String,
    /// Shell command that installs the tool. `{runtime}`, `{package}` and
    /// `{version}` expand before it runs.
    pub install_command: String,
    /// Shell command whose output carries a `Version:` field for the
    /// installed tool. Same placeholders as `installCommand`.
    pub version_command: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            package: "build".to_string(),
            version: "1.2.2".to_string(),
            install_command:
                "{runtime} -m pip install --disable-pip-version-check --quiet {package}=={version}"
                    .to_string(),
            version_command: "{runtime} -m pip show {package}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Shell command that produces the distribution artifacts.
    pub command: String,
    /// Directory (relative to the checkout) the artifacts land in.
    pub dist_dir: String,
    /// Glob the artifact file names must match, e.g. `*.tar.gz`.
    pub artifact_glob: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: "python3 -m build".to_string(),
            dist_dir: "dist".to_string(),
            artifact_glob: "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryConfig {
    /// Registry identifier, used as the keychain entry key.
    pub id: String,
    /// Upload endpoint. Artifacts are PUT to `{uploadUrl}/{name}/{version}/{file}`.
    pub upload_url: String,
    /// Version lookup template with `{name}` and `{version}` placeholders.
    /// 200 means the version exists, 404 means it does not.
    pub lookup_url: String,
    /// Environment variable checked for the token before the keychain.
    pub token_env: String,
    /// Username paired with the token for basic auth.
    pub username: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id: "pypi".to_string(),
            upload_url: "https://upload.pypi.org/legacy/".to_string(),
            lookup_url: "https://pypi.org/pypi/{name}/{version}/json".to_string(),
            token_env: "TAGSHIP_REGISTRY_TOKEN".to_string(),
            username: "__token__".to_string(),
        }
    }
}

/// Load the global config, falling back to defaults if no file exists.
pub fn load() -> Result<Config> {
    let path = paths::tagship_json()?;
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
}

/// Persist the global config atomically.
pub fn save(config: &Config) -> Result<()> {
    let path = paths::tagship_json()?;
    let dir = path
        .parent()
        .ok_or_else(|| Error::internal_unexpected("Config path has no parent directory"))?;

    fs::create_dir_all(dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("create {}", dir.display())))
    })?;

    let payload = serde_json::to_string_pretty(config)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize config".to_string())))?;

    write_atomic(&path, &payload)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("write {}", tmp.display())))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("rename to {}", path.display())))
    })
}

/// Set a config value addressed by a dotted key, e.g. `trigger.pattern`.
///
/// Values parse as JSON first (numbers, booleans, arrays) and fall back to
/// plain strings, so `tagship config set trigger.pattern 'release-*'` works
/// without quoting gymnastics.
pub fn set(config: &mut Config, key: &str, raw_value: &str) -> Result<()> {
    let mut root = serde_json::to_value(&*config)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize config".to_string())))?;

    let value = parse_value(raw_value);
    set_dotted(&mut root, key, value)?;

    *config = serde_json::from_value(root).map_err(|e| {
        Error::config_invalid_value(key, Some(raw_value.to_string()), e.to_string())
    })?;

    Ok(())
}

fn parse_value(s: &str) -> Value {
    if let Ok(v) = serde_json::from_str(s) {
        return v;
    }
    Value::String(s.to_string())
}

fn set_dotted(root: &mut Value, key: &str, value: Value) -> Result<()> {
    if key.is_empty() {
        return Err(Error::validation_invalid_argument(
            "key",
            "Config key must not be empty",
            None,
        ));
    }

    let mut current = root;
    let segments: Vec<&str> = key.split('.').collect();

    for segment in &segments[..segments.len() - 1] {
        current = current
            .as_object_mut()
            .and_then(|obj| obj.get_mut(*segment))
            .ok_or_else(|| {
                Error::validation_invalid_argument(
                    "key",
                    format!("Unknown config section '{}'", segment),
                    Some(key.to_string()),
                )
            })?;
    }

    let leaf = segments[segments.len() - 1];
    let obj = current.as_object_mut().ok_or_else(|| {
        Error::validation_invalid_argument(
            "key",
            format!("'{}' does not address an object", key),
            None,
        )
    })?;

    obj.insert(leaf.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_v_star_pattern() {
        let config = Config::default();
        assert_eq!(config.trigger.pattern, "v*");
        assert_eq!(config.registry.username, "__token__");
    }

    #[test]
    fn set_updates_nested_key() {
        let mut config = Config::default();
        set(&mut config, "trigger.pattern", "release-*").unwrap();
        assert_eq!(config.trigger.pattern, "release-*");
    }

    #[test]
    fn set_parses_json_values() {
        let mut config = Config::default();
        set(&mut config, "runtime.versionArgs", "[\"-V\"]").unwrap();
        assert_eq!(config.runtime.version_args, vec!["-V".to_string()]);
    }

    #[test]
    fn set_rejects_unknown_section() {
        let mut config = Config::default();
        let err = set(&mut config, "nosuch.key", "1").unwrap_err();
        assert_eq!(
            err.code,
            crate::error::ErrorCode::ValidationInvalidArgument
        );
    }

    #[test]
    fn set_rejects_type_mismatch() {
        let mut config = Config::default();
        let err = set(&mut config, "trigger.pattern", "[1,2]").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tool.package, config.tool.package);
        assert_eq!(parsed.registry.upload_url, config.registry.upload_url);
    }

    #[test]
    fn load_defaults_then_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("TAGSHIP_CONFIG_DIR", dir.path());

        // No file yet: defaults
        let mut config = load().unwrap();
        assert_eq!(config.trigger.pattern, "v*");

        config.repository = Some("https://example.com/demo.git".to_string());
        save(&config).unwrap();

        let reloaded = load().unwrap();
        assert_eq!(
            reloaded.repository.as_deref(),
            Some("https://example.com/demo.git")
        );

        std::env::remove_var("TAGSHIP_CONFIG_DIR");
    }
}
