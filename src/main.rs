use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{auth, config, release};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "tagship")]
#[command(version = VERSION)]
#[command(about = "Publishes a package to a registry when a version tag is pushed")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a pushed ref and run the release sequence if it matches
    Run(release::RunArgs),
    /// Preview the release sequence for a ref without executing it
    Plan(release::PlanArgs),
    /// Manage registry authentication tokens
    Auth(auth::AuthArgs),
    /// Manage global tagship configuration
    Config(config::ConfigArgs),
}

fn run_json(command: Commands, global: &GlobalArgs) -> (tagship::Result<serde_json::Value>, i32) {
    match command {
        Commands::Run(args) => output::map_cmd_result_to_json(release::run(args, global)),
        Commands::Plan(args) => output::map_cmd_result_to_json(release::plan(args, global)),
        Commands::Auth(args) => output::map_cmd_result_to_json(auth::run(args, global)),
        Commands::Config(args) => output::map_cmd_result_to_json(config::run(args, global)),
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = run_json(cli.command, &global);
    let exit_code = final_exit_code(output::print_json_result(json_result), exit_code);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

/// A run that cannot report its result did not succeed: a failed stdout write
/// (other than the BrokenPipe case swallowed by the printer) turns an
/// otherwise clean exit into a failure.
fn final_exit_code(print_result: tagship::Result<()>, exit_code: i32) -> i32 {
    if print_result.is_err() && exit_code == 0 {
        1
    } else {
        exit_code
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
