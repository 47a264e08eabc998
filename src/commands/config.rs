use clap::{Args, Subcommand};
use serde::Serialize;

use tagship::config::{self, Config};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Set a value by dotted key, e.g. `trigger.pattern v*`
    Set { key: String, value: String },
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ConfigOutput {
    #[serde(rename = "config.show")]
    Show { config: Config },
    #[serde(rename = "config.path")]
    Path { path: String },
    #[serde(rename = "config.set")]
    Set { key: String, config: Config },
}

pub fn run(args: ConfigArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show => {
            let config = config::load()?;
            Ok((ConfigOutput::Show { config }, 0))
        }
        ConfigCommand::Path => {
            let path = tagship::paths::tagship_json()?;
            Ok((
                ConfigOutput::Path {
                    path: path.display().to_string(),
                },
                0,
            ))
        }
        ConfigCommand::Set { key, value } => {
            let mut config = config::load()?;
            config::set(&mut config, &key, &value)?;
            config::save(&config)?;
            Ok((ConfigOutput::Set { key, config }, 0))
        }
    }
}
