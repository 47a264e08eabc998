use clap::Args;
use serde::Serialize;

use tagship::pipeline::RunStatus;
use tagship::release::{self, ReleaseOutcome, ReleasePlan};

use super::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Pushed ref to evaluate (e.g. refs/tags/v1.2.3 or v1.2.3)
    pub ref_name: String,

    /// Repository URL or local path, overriding the configured one
    #[arg(long)]
    pub repo: Option<String>,

    /// Plan only, execute nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Pushed ref to evaluate (e.g. refs/tags/v1.2.3 or v1.2.3)
    pub ref_name: String,

    /// Repository URL or local path, overriding the configured one
    #[arg(long)]
    pub repo: Option<String>,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ReleaseOutput {
    #[serde(rename = "release.plan")]
    Plan { plan: ReleasePlan },
    #[serde(rename = "release.run")]
    Run { outcome: ReleaseOutcome },
}

pub fn run(args: RunArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ReleaseOutput> {
    let config = tagship::config::load()?;

    if args.dry_run {
        let plan = release::plan(&args.ref_name, &config, args.repo.as_deref())?;
        return Ok((ReleaseOutput::Plan { plan }, 0));
    }

    let outcome = release::run(&args.ref_name, &config, args.repo.as_deref())?;
    let exit_code = match &outcome {
        ReleaseOutcome::Skipped { .. } => 0,
        ReleaseOutcome::Completed(report) => match report.result.status {
            RunStatus::Success | RunStatus::Skipped => 0,
            RunStatus::Failed => 20,
        },
    };

    Ok((ReleaseOutput::Run { outcome }, exit_code))
}

pub fn plan(args: PlanArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ReleaseOutput> {
    let config = tagship::config::load()?;
    let plan = release::plan(&args.ref_name, &config, args.repo.as_deref())?;
    Ok((ReleaseOutput::Plan { plan }, 0))
}
