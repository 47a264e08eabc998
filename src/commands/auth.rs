use std::io::Read;

use clap::{Args, Subcommand};
use serde::Serialize;

use tagship::{credentials, Error};

use super::CmdResult;

#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    command: AuthCommand,
}

#[derive(Subcommand)]
enum AuthCommand {
    /// Store a registry token in the OS keychain
    Set {
        /// Registry ID (defaults to the configured registry)
        #[arg(long)]
        registry: Option<String>,
        /// Token value; omit to read it from stdin
        #[arg(long)]
        token: Option<String>,
    },
    /// Report whether a token is configured (never prints the value)
    Status {
        #[arg(long)]
        registry: Option<String>,
    },
    /// Remove the stored token
    Clear {
        #[arg(long)]
        registry: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum AuthOutput {
    #[serde(rename = "auth.set")]
    Set { registry: String },
    #[serde(rename = "auth.status")]
    Status {
        registry: String,
        keychain: bool,
        token_env: String,
        env_set: bool,
    },
    #[serde(rename = "auth.clear")]
    Clear { registry: String },
}

fn registry_id(explicit: Option<String>) -> tagship::Result<(String, String)> {
    let config = tagship::config::load()?;
    let id = explicit.unwrap_or_else(|| config.registry.id.clone());
    Ok((id, config.registry.token_env))
}

fn read_token(token: Option<String>) -> tagship::Result<String> {
    if let Some(token) = token {
        return Ok(token);
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| Error::internal_io(e.to_string(), Some("read stdin".to_string())))?;

    let token = buf.trim().to_string();
    if token.is_empty() {
        return Err(Error::validation_missing_argument(vec!["token".to_string()]));
    }
    Ok(token)
}

pub fn run(args: AuthArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<AuthOutput> {
    match args.command {
        AuthCommand::Set { registry, token } => {
            let (id, _) = registry_id(registry)?;
            let token = read_token(token)?;
            credentials::store(&id, &token)?;
            Ok((AuthOutput::Set { registry: id }, 0))
        }
        AuthCommand::Status { registry } => {
            let (id, token_env) = registry_id(registry)?;
            let env_set = std::env::var(&token_env)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            Ok((
                AuthOutput::Status {
                    registry: id.clone(),
                    keychain: credentials::exists(&id),
                    token_env,
                    env_set,
                },
                0,
            ))
        }
        AuthCommand::Clear { registry } => {
            let (id, _) = registry_id(registry)?;
            credentials::clear(&id)?;
            Ok((AuthOutput::Clear { registry: id }, 0))
        }
    }
}
