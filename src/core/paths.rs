use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base tagship config directory (universal ~/.config/tagship/ on all platforms).
///
/// `TAGSHIP_CONFIG_DIR` overrides the default, which keeps tests and CI
/// runners away from the real user config.
pub fn tagship() -> Result<PathBuf> {
    if let Ok(dir) = env::var("TAGSHIP_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected("APPDATA environment variable not set on Windows")
        })?;
        Ok(PathBuf::from(appdata).join("tagship"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected("HOME environment variable not set on Unix-like system")
        })?;
        Ok(PathBuf::from(home).join(".config").join("tagship"))
    }
}

/// Global tagship.json config file path
pub fn tagship_json() -> Result<PathBuf> {
    Ok(tagship()?.join("tagship.json"))
}
