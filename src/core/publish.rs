//! Registry upload.
//!
//! The contract is deliberately small: a GET against the lookup URL answers
//! whether the version already exists (200 yes, 404 no), and each artifact is
//! PUT to `{uploadUrl}/{name}/{version}/{file}` with a basic-auth token and a
//! SHA-256 digest header. Re-running a tag whose version is already on the
//! registry fails before any bytes are uploaded.

use std::fs;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::build::Artifact;
use crate::config::RegistryConfig;
use crate::credentials::Token;
use crate::error::{Error, Result};
use crate::manifest::PackageManifest;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub registry: String,
    pub package: String,
    pub version: String,
    pub files: Vec<String>,
}

fn client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("tagship/{}", VERSION))
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))
}

/// Expand `{name}` and `{version}` placeholders in the lookup URL template.
pub fn lookup_url(template: &str, name: &str, version: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{version}", version)
}

/// Build the basic-auth header value for a registry token.
pub fn auth_header(username: &str, token: &Token) -> String {
    format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", username, token.expose()))
    )
}

/// Join the upload endpoint with the artifact path segments.
pub fn upload_target(base: &str, name: &str, version: &str, file: &str) -> String {
    format!("{}/{}/{}/{}", base.trim_end_matches('/'), name, version, file)
}

/// Query the registry for an existing release of this version.
pub fn version_exists(registry: &RegistryConfig, name: &str, version: &str) -> Result<bool> {
    if registry.lookup_url.trim().is_empty() {
        return Err(Error::registry_not_configured(&registry.id));
    }

    let url = lookup_url(&registry.lookup_url, name, version);
    let response = client()?
        .get(&url)
        .send()
        .map_err(|e| Error::publish_failed(format!("Version lookup failed: {}", e)).with_retryable(true))?;

    match response.status() {
        reqwest::StatusCode::OK => Ok(true),
        reqwest::StatusCode::NOT_FOUND => Ok(false),
        status => Err(Error::publish_failed(format!(
            "Version lookup returned {} for {}",
            status, url
        ))),
    }
}

/// Upload all artifacts for a release.
///
/// Fails before uploading anything if the version is already on the registry;
/// fails on the first artifact the registry rejects.
pub fn publish(
    registry: &RegistryConfig,
    manifest: &PackageManifest,
    artifacts: &[Artifact],
    token: &Token,
) -> Result<PublishReceipt> {
    if registry.upload_url.trim().is_empty() {
        return Err(Error::registry_not_configured(&registry.id));
    }

    if version_exists(registry, &manifest.name, &manifest.version)? {
        return Err(Error::publish_version_exists(
            &manifest.name,
            &manifest.version,
            &registry.id,
        ));
    }

    let client = client()?;
    let auth = auth_header(&registry.username, token);
    let mut files = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let bytes = fs::read(&artifact.path).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", artifact.path)))
        })?;

        let url = upload_target(
            &registry.upload_url,
            &manifest.name,
            &manifest.version,
            &artifact.file_name,
        );

        let response = client
            .put(&url)
            .header("Authorization", &auth)
            .header("X-Checksum-Sha256", &artifact.sha256)
            .body(bytes)
            .send()
            .map_err(|e| {
                Error::publish_failed(format!("Upload of {} failed: {}", artifact.file_name, e))
                    .with_retryable(true)
            })?;

        match response.status() {
            status if status.is_success() => files.push(artifact.file_name.clone()),
            reqwest::StatusCode::CONFLICT => {
                return Err(Error::publish_version_exists(
                    &manifest.name,
                    &manifest.version,
                    &registry.id,
                ));
            }
            status => {
                let body = response.text().unwrap_or_default();
                return Err(Error::publish_failed(format!(
                    "Registry rejected {} with {}: {}",
                    artifact.file_name,
                    status,
                    body.trim()
                )));
            }
        }
    }

    Ok(PublishReceipt {
        registry: registry.id.clone(),
        package: manifest.name.clone(),
        version: manifest.version.clone(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TokenSource;

    fn test_token(var: &str, value: &str) -> Token {
        // Tokens are only constructible through resolution paths in release
        // code; tests go through the environment resolver. Each test uses its
        // own variable name so parallel tests cannot race.
        std::env::set_var(var, value);
        let registry = RegistryConfig {
            token_env: var.to_string(),
            ..RegistryConfig::default()
        };
        let token = crate::credentials::resolve(&registry).unwrap();
        std::env::remove_var(var);
        assert_eq!(token.source, TokenSource::Environment);
        token
    }

    #[test]
    fn lookup_url_expands_placeholders() {
        let url = lookup_url("https://r.example/{name}/{version}/json", "demo", "1.2.3");
        assert_eq!(url, "https://r.example/demo/1.2.3/json");
    }

    #[test]
    fn upload_target_normalizes_trailing_slash() {
        assert_eq!(
            upload_target("https://up.example/legacy/", "demo", "1.0.0", "demo-1.0.0.tar.gz"),
            "https://up.example/legacy/demo/1.0.0/demo-1.0.0.tar.gz"
        );
    }

    #[test]
    fn auth_header_encodes_username_and_token() {
        let token = test_token("TAGSHIP_TEST_AUTH_HEADER_TOKEN", "sekrit");
        let header = auth_header("__token__", &token);
        assert!(header.starts_with("Basic "));
        let decoded = BASE64.decode(header.trim_start_matches("Basic ")).unwrap();
        assert_eq!(decoded, b"__token__:sekrit");
    }

    /// Minimal HTTP responder: answers one request per status line, then
    /// closes the connection. Request lines are reported back so tests can
    /// assert which calls the registry actually saw.
    fn spawn_registry_stub(
        statuses: Vec<&'static str>,
    ) -> (String, std::sync::mpsc::Receiver<String>) {
        use std::io::{BufRead, BufReader, Read as _, Write as _};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            for status in statuses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();

                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap_or(0);
                    }
                    if line == "\r\n" {
                        break;
                    }
                }
                if content_length > 0 {
                    let mut body = vec![0u8; content_length];
                    reader.read_exact(&mut body).unwrap();
                }

                tx.send(request_line.trim().to_string()).unwrap();

                let mut stream = reader.into_inner();
                write!(
                    stream,
                    "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    status
                )
                .unwrap();
            }
        });

        (base, rx)
    }

    fn stub_registry(base: &str, token_env: &str) -> RegistryConfig {
        RegistryConfig {
            lookup_url: format!("{}/lookup/{{name}}/{{version}}", base),
            upload_url: format!("{}/upload", base),
            token_env: token_env.to_string(),
            ..RegistryConfig::default()
        }
    }

    fn demo_manifest() -> PackageManifest {
        PackageManifest {
            name: "demo".to_string(),
            version: "1.0.0".to_string(),
            manifest_file: "pyproject.toml".to_string(),
        }
    }

    fn sample_artifact(dir: &std::path::Path) -> Artifact {
        let path = dir.join("demo-1.0.0.tar.gz");
        fs::write(&path, b"hello").unwrap();
        Artifact {
            path: path.display().to_string(),
            file_name: "demo-1.0.0.tar.gz".to_string(),
            size_bytes: 5,
            sha256: crate::build::sha256_hex(b"hello"),
        }
    }

    #[test]
    fn existing_version_fails_before_any_upload() {
        let (base, requests) = spawn_registry_stub(vec!["200 OK"]);
        let registry = stub_registry(&base, "TAGSHIP_TEST_EXISTS_LOOKUP_TOKEN");
        let token = test_token("TAGSHIP_TEST_EXISTS_LOOKUP_TOKEN", "x");

        let dir = tempfile::tempdir().unwrap();
        let artifact = sample_artifact(dir.path());

        let err = publish(&registry, &demo_manifest(), &[artifact], &token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::PublishVersionExists);

        // The registry saw the lookup and nothing else
        let seen: Vec<String> = requests.try_iter().collect();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("GET "));
    }

    #[test]
    fn upload_conflict_is_version_exists() {
        let (base, requests) = spawn_registry_stub(vec!["404 Not Found", "409 Conflict"]);
        let registry = stub_registry(&base, "TAGSHIP_TEST_CONFLICT_TOKEN");
        let token = test_token("TAGSHIP_TEST_CONFLICT_TOKEN", "x");

        let dir = tempfile::tempdir().unwrap();
        let artifact = sample_artifact(dir.path());

        let err = publish(&registry, &demo_manifest(), &[artifact], &token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::PublishVersionExists);

        assert!(requests.recv().unwrap().starts_with("GET "));
        assert!(requests
            .recv()
            .unwrap()
            .starts_with("PUT /upload/demo/1.0.0/demo-1.0.0.tar.gz"));
    }

    #[test]
    fn empty_upload_url_is_not_configured() {
        let registry = RegistryConfig {
            upload_url: String::new(),
            ..RegistryConfig::default()
        };
        let manifest = PackageManifest {
            name: "demo".to_string(),
            version: "1.0.0".to_string(),
            manifest_file: "pyproject.toml".to_string(),
        };
        let token = test_token("TAGSHIP_TEST_UPLOAD_URL_TOKEN", "x");

        let err = publish(&registry, &manifest, &[], &token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::RegistryNotConfigured);
    }
}
