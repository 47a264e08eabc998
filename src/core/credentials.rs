//! Registry token storage and resolution.
//!
//! Tokens live in the OS keychain (macOS Keychain, Linux Secret Service,
//! Windows Credential Manager) under the `tagship` service, or arrive via an
//! environment variable for headless runners. The value is never logged,
//! never serialized, and never written to disk.

use keyring::Entry;
use serde::Serialize;

use crate::config::RegistryConfig;
use crate::error::{Error, ErrorCode, Result};

const SERVICE_NAME: &str = "tagship";

/// An opaque registry token. `Debug` and `Display` are redacted so the value
/// cannot leak through logs or error messages.
#[derive(Clone)]
pub struct Token {
    value: String,
    pub source: TokenSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    Environment,
    Keychain,
}

impl Token {
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}

fn keyring_error(e: keyring::Error) -> Error {
    Error::new(
        ErrorCode::InternalUnexpected,
        format!("Keychain error: {}", e),
        serde_json::Value::Null,
    )
}

fn entry_key(registry_id: &str) -> String {
    format!("{}:token", registry_id)
}

/// Resolve the token for a registry: environment variable first, keychain
/// second. Absence of both is a credentials failure.
pub fn resolve(registry: &RegistryConfig) -> Result<Token> {
    if let Ok(value) = std::env::var(&registry.token_env) {
        if !value.trim().is_empty() {
            return Ok(Token {
                value,
                source: TokenSource::Environment,
            });
        }
    }

    if let Some(value) = get(&registry.id)? {
        return Ok(Token {
            value,
            source: TokenSource::Keychain,
        });
    }

    Err(Error::credentials_missing(&registry.id, &registry.token_env))
}

/// Store a token in the keychain for a registry.
pub fn store(registry_id: &str, value: &str) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, &entry_key(registry_id)).map_err(keyring_error)?;
    entry.set_password(value).map_err(keyring_error)?;
    Ok(())
}

/// Read the keychain token for a registry, `None` if absent.
pub fn get(registry_id: &str) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE_NAME, &entry_key(registry_id)).map_err(keyring_error)?;

    match entry.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(keyring_error(e)),
    }
}

/// Delete the keychain token for a registry. Deleting a missing entry is fine.
pub fn clear(registry_id: &str) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, &entry_key(registry_id)).map_err(keyring_error)?;

    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(keyring_error(e)),
    }
}

/// Whether a keychain token exists for a registry.
pub fn exists(registry_id: &str) -> bool {
    get(registry_id).map(|v| v.is_some()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = Token {
            value: "pypi-supersecret".to_string(),
            source: TokenSource::Environment,
        };
        let debug = format!("{:?}", token);
        let display = format!("{}", token);
        assert!(!debug.contains("supersecret"));
        assert!(!display.contains("supersecret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn resolve_prefers_environment() {
        let registry = RegistryConfig {
            token_env: "TAGSHIP_TEST_TOKEN_ENV".to_string(),
            ..RegistryConfig::default()
        };
        std::env::set_var("TAGSHIP_TEST_TOKEN_ENV", "from-env");
        let token = resolve(&registry).unwrap();
        assert_eq!(token.expose(), "from-env");
        assert_eq!(token.source, TokenSource::Environment);
        std::env::remove_var("TAGSHIP_TEST_TOKEN_ENV");
    }

    // Keychain tests require a real secret service and may prompt.
    // Run manually with: cargo test credentials -- --ignored

    #[test]
    #[ignore]
    fn store_get_clear_round_trip() {
        store("test-registry", "secret_value_123").unwrap();
        assert_eq!(
            get("test-registry").unwrap(),
            Some("secret_value_123".to_string())
        );

        clear("test-registry").unwrap();
        assert_eq!(get("test-registry").unwrap(), None);
    }
}
