use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidJson,

    RegistryNotConfigured,

    CheckoutFailed,
    RuntimeUnavailable,
    ToolInstallFailed,
    CredentialsMissing,
    BuildFailed,
    PublishFailed,
    PublishVersionExists,

    GitCommandFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::RegistryNotConfigured => "registry.not_configured",

            ErrorCode::CheckoutFailed => "release.checkout_failed",
            ErrorCode::RuntimeUnavailable => "release.runtime_unavailable",
            ErrorCode::ToolInstallFailed => "release.tool_install_failed",
            ErrorCode::CredentialsMissing => "release.credentials_missing",
            ErrorCode::BuildFailed => "release.build_failed",
            ErrorCode::PublishFailed => "publish.failed",
            ErrorCode::PublishVersionExists => "publish.version_exists",

            ErrorCode::GitCommandFailed => "git.command_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailureDetails {
    pub step: String,
    pub detail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionExistsDetails {
    pub package: String,
    pub version: String,
    pub registry: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        let details = serde_json::to_value(MissingArgumentDetails { args })
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            details,
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let details = serde_json::to_value(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            value,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let details = serde_json::to_value(ConfigMissingKeyDetails {
            key: key.into(),
            path,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details,
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = serde_json::json!({
            "path": path.into(),
            "error": err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = serde_json::json!({
            "key": key.into(),
            "value": value,
            "problem": problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn checkout_failed(detail: impl Into<String>) -> Self {
        Self::step_failure(
            ErrorCode::CheckoutFailed,
            "Checkout failed",
            "checkout",
            detail,
        )
    }

    pub fn runtime_unavailable(program: impl Into<String>, detail: impl Into<String>) -> Self {
        let program = program.into();
        Self::step_failure(
            ErrorCode::RuntimeUnavailable,
            format!("Runtime '{}' is not available", program),
            "runtime",
            detail,
        )
        .with_hint(format!("Install '{}' and ensure it is on PATH", program))
    }

    pub fn tool_install_failed(detail: impl Into<String>) -> Self {
        Self::step_failure(
            ErrorCode::ToolInstallFailed,
            "Packaging tool installation failed",
            "tool",
            detail,
        )
    }

    pub fn credentials_missing(registry: impl Into<String>, token_env: impl Into<String>) -> Self {
        let registry = registry.into();
        let token_env = token_env.into();
        let details = serde_json::json!({
            "registry": registry,
            "tokenEnv": token_env,
        });

        Self::new(
            ErrorCode::CredentialsMissing,
            "No registry token configured",
            details,
        )
        .with_hint(format!("Run 'tagship auth set --registry {}'", registry))
        .with_hint(format!("Or export the token via ${}", token_env))
    }

    pub fn build_failed(detail: impl Into<String>) -> Self {
        Self::step_failure(ErrorCode::BuildFailed, "Build failed", "build", detail)
    }

    pub fn publish_failed(detail: impl Into<String>) -> Self {
        Self::step_failure(ErrorCode::PublishFailed, "Publish failed", "publish", detail)
    }

    pub fn publish_version_exists(
        package: impl Into<String>,
        version: impl Into<String>,
        registry: impl Into<String>,
    ) -> Self {
        let package = package.into();
        let version = version.into();
        let details = serde_json::to_value(VersionExistsDetails {
            package: package.clone(),
            version: version.clone(),
            registry: registry.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::PublishVersionExists,
            format!("{} {} is already published", package, version),
            details,
        )
        .with_hint("Push a new version tag to publish a new release")
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn registry_not_configured(registry: impl Into<String>) -> Self {
        let registry = registry.into();
        Self::new(
            ErrorCode::RegistryNotConfigured,
            format!("Registry '{}' is not configured", registry),
            serde_json::json!({ "registry": registry }),
        )
        .with_hint("Run 'tagship config show' to inspect the registry settings")
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": error.into(),
            "context": context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": error.into(),
            "context": context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    fn step_failure(
        code: ErrorCode,
        message: impl Into<String>,
        step: &str,
        detail: impl Into<String>,
    ) -> Self {
        let details = serde_json::to_value(StepFailureDetails {
            step: step.to_string(),
            detail: detail.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(code, message, details)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dot_namespaced() {
        assert_eq!(
            ErrorCode::CheckoutFailed.as_str(),
            "release.checkout_failed"
        );
        assert_eq!(
            ErrorCode::PublishVersionExists.as_str(),
            "publish.version_exists"
        );
    }

    #[test]
    fn credentials_missing_carries_hints() {
        let err = Error::credentials_missing("pypi", "TAGSHIP_REGISTRY_TOKEN");
        assert_eq!(err.code, ErrorCode::CredentialsMissing);
        assert_eq!(err.hints.len(), 2);
        assert!(err.hints[0].message.contains("tagship auth set"));
    }

    #[test]
    fn version_exists_message_names_package_and_version() {
        let err = Error::publish_version_exists("demo", "1.2.3", "pypi");
        assert!(err.message.contains("demo 1.2.3"));
    }
}
