//! Tag-triggered release orchestration.
//!
//! `plan` decides whether a pushed ref qualifies and lays out the step
//! sequence; `run` executes the same plan through the fail-fast step runner.
//! What you preview is what you execute.

use chrono::Utc;
use semver::Version;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::build::{self, Artifact};
use crate::config::Config;
use crate::credentials::{self, Token};
use crate::error::{Error, Result};
use crate::manifest::{self, PackageManifest};
use crate::pipeline::{self, RunResult, Step, StepExecutor, StepKind};
use crate::publish;
use crate::runtime::{self, RuntimeInfo};
use crate::toolchain;
use crate::trigger;
use crate::workspace::{self, Workspace};
use crate::log_status;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePlan {
    pub ref_name: String,
    pub pattern: String,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReport {
    pub run_id: String,
    pub ref_name: String,
    pub tag: String,
    pub version: String,
    pub started_at: String,
    pub finished_at: String,
    pub result: RunResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ReleaseOutcome {
    Skipped {
        ref_name: String,
        pattern: String,
        skipped: bool,
    },
    Completed(Box<ReleaseReport>),
}

/// Plan a release for a pushed ref.
///
/// A non-matching ref yields `matched: false` with no steps. A matching ref
/// must carry a parseable version and a resolvable repository, otherwise
/// planning fails.
pub fn plan(ref_name: &str, config: &Config, repo_override: Option<&str>) -> Result<ReleasePlan> {
    let pattern = config.trigger.pattern.clone();

    if !trigger::ref_matches(ref_name, &pattern) {
        return Ok(ReleasePlan {
            ref_name: ref_name.to_string(),
            pattern,
            matched: false,
            tag: None,
            version: None,
            repository: None,
            steps: Vec::new(),
        });
    }

    let tag = trigger::tag_name(ref_name).to_string();
    let version = trigger::version_from_tag(&tag)?;
    let repository = resolve_repository(config, repo_override)?;

    let steps = build_steps(config, &repository, &tag, &version);

    Ok(ReleasePlan {
        ref_name: ref_name.to_string(),
        pattern,
        matched: true,
        tag: Some(tag),
        version: Some(version.to_string()),
        repository: Some(repository),
        steps,
    })
}

/// Execute a release for a pushed ref: plan, then run the plan.
pub fn run(ref_name: &str, config: &Config, repo_override: Option<&str>) -> Result<ReleaseOutcome> {
    let release_plan = plan(ref_name, config, repo_override)?;

    if !release_plan.matched {
        log_status!(
            "release",
            "Ref '{}' does not match '{}', skipping",
            ref_name,
            release_plan.pattern
        );
        return Ok(ReleaseOutcome::Skipped {
            ref_name: release_plan.ref_name,
            pattern: release_plan.pattern,
            skipped: true,
        });
    }

    // plan() guarantees these for matched refs
    let tag = release_plan
        .tag
        .clone()
        .ok_or_else(|| Error::internal_unexpected("Matched plan without tag"))?;
    let version = release_plan
        .version
        .clone()
        .ok_or_else(|| Error::internal_unexpected("Matched plan without version"))?;
    let repository = release_plan
        .repository
        .clone()
        .ok_or_else(|| Error::internal_unexpected("Matched plan without repository"))?;

    let mut executor = ReleaseStepExecutor::new(config.clone(), repository, tag.clone(), version.clone());

    let started_at = Utc::now().to_rfc3339();
    let result = pipeline::run(&release_plan.steps, &mut executor);
    let finished_at = Utc::now().to_rfc3339();

    Ok(ReleaseOutcome::Completed(Box::new(ReleaseReport {
        run_id: Uuid::new_v4().to_string(),
        ref_name: ref_name.to_string(),
        tag,
        version,
        started_at,
        finished_at,
        result,
    })))
}

fn resolve_repository(config: &Config, repo_override: Option<&str>) -> Result<String> {
    if let Some(repo) = repo_override {
        return Ok(repo.to_string());
    }
    config.repository.clone().ok_or_else(|| {
        Error::config_missing_key("repository", None)
            .with_hint("Pass --repo <url|path> or run 'tagship config set repository <url>'")
    })
}

fn build_steps(config: &Config, repository: &str, tag: &str, version: &Version) -> Vec<Step> {
    vec![
        Step::new(
            StepKind::Checkout,
            format!("Checkout {} at {}", repository, tag),
        ),
        Step::new(
            StepKind::Runtime,
            format!("Provision runtime '{}'", config.runtime.program),
        ),
        Step::new(
            StepKind::Tool,
            format!("Install {} {}", config.tool.package, config.tool.version),
        ),
        Step::new(
            StepKind::Credentials,
            format!("Resolve token for '{}'", config.registry.id),
        ),
        Step::new(StepKind::Build, format!("Build distribution {}", version)),
        Step::new(
            StepKind::Publish,
            format!("Publish {} to '{}'", version, config.registry.id),
        ),
    ]
}

/// Concrete executor for the release sequence. State produced by earlier
/// steps (workspace, runtime, token, artifacts) flows to later ones through
/// the executor itself; the token never enters any report payload.
struct ReleaseStepExecutor {
    config: Config,
    repository: String,
    tag: String,
    version: String,
    workspace: Option<Workspace>,
    runtime: Option<RuntimeInfo>,
    manifest: Option<PackageManifest>,
    token: Option<Token>,
    artifacts: Vec<Artifact>,
}

impl ReleaseStepExecutor {
    fn new(config: Config, repository: String, tag: String, version: String) -> Self {
        Self {
            config,
            repository,
            tag,
            version,
            workspace: None,
            runtime: None,
            manifest: None,
            token: None,
            artifacts: Vec::new(),
        }
    }

    fn checkout(&mut self) -> Result<Option<serde_json::Value>> {
        let ws = workspace::checkout(&self.repository, &self.tag)?;
        log_status!("release", "Checked out {} at {}", self.repository, self.tag);
        let data = json!({ "path": ws.checkout_path().display().to_string() });
        self.workspace = Some(ws);
        Ok(Some(data))
    }

    fn provision_runtime(&mut self) -> Result<Option<serde_json::Value>> {
        let info = runtime::provision(&self.config.runtime)?;
        log_status!("release", "Runtime {} {}", info.program, info.version);
        let data = serde_json::to_value(&info)
            .map_err(|e| Error::internal_json(e.to_string(), Some("runtime info".to_string())))?;
        self.runtime = Some(info);
        Ok(Some(data))
    }

    fn install_tool(&mut self) -> Result<Option<serde_json::Value>> {
        let runtime = require(self.runtime.as_ref(), "runtime")?;
        let tool = toolchain::install(runtime, &self.config.tool)?;
        log_status!("release", "Installed {} {}", tool.package, tool.version);
        let data = serde_json::to_value(&tool)
            .map_err(|e| Error::internal_json(e.to_string(), Some("tool info".to_string())))?;
        Ok(Some(data))
    }

    fn resolve_credentials(&mut self) -> Result<Option<serde_json::Value>> {
        let token = credentials::resolve(&self.config.registry)?;
        // Only the source is reported; the value stays inside the executor.
        let data = json!({ "source": token.source });
        self.token = Some(token);
        Ok(Some(data))
    }

    fn build(&mut self) -> Result<Option<serde_json::Value>> {
        let ws = require(self.workspace.as_ref(), "workspace")?;
        let manifest = manifest::read(ws.checkout_path())?;

        if manifest.version != self.version {
            return Err(Error::build_failed(format!(
                "Tag {} does not match {} version {}",
                self.tag, manifest.manifest_file, manifest.version
            )));
        }

        let artifacts = build::run_build(ws.checkout_path(), &self.config.build)?;
        log_status!(
            "release",
            "Built {} artifact(s) for {} {}",
            artifacts.len(),
            manifest.name,
            manifest.version
        );

        let data = json!({
            "package": manifest,
            "artifacts": artifacts,
        });
        self.manifest = Some(manifest);
        self.artifacts = artifacts;
        Ok(Some(data))
    }

    fn publish(&mut self) -> Result<Option<serde_json::Value>> {
        let manifest = require(self.manifest.as_ref(), "manifest")?;
        let token = require(self.token.as_ref(), "token")?;

        let receipt = publish::publish(&self.config.registry, manifest, &self.artifacts, token)?;
        log_status!(
            "release",
            "Published {} {} to '{}'",
            receipt.package,
            receipt.version,
            receipt.registry
        );

        let data = serde_json::to_value(&receipt)
            .map_err(|e| Error::internal_json(e.to_string(), Some("publish receipt".to_string())))?;
        Ok(Some(data))
    }
}

fn require<'a, T>(value: Option<&'a T>, what: &str) -> Result<&'a T> {
    value.ok_or_else(|| {
        Error::internal_unexpected(format!("{} not available; step ordering violated", what))
    })
}

impl StepExecutor for ReleaseStepExecutor {
    fn execute_step(&mut self, step: &Step) -> Result<Option<serde_json::Value>> {
        match step.kind {
            StepKind::Checkout => self.checkout(),
            StepKind::Runtime => self.provision_runtime(),
            StepKind::Tool => self.install_tool(),
            StepKind::Credentials => self.resolve_credentials(),
            StepKind::Build => self.build(),
            StepKind::Publish => self.publish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config_with_repo() -> Config {
        Config {
            repository: Some("https://example.com/demo.git".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn non_matching_ref_plans_nothing() {
        let plan = plan("refs/tags/nightly", &config_with_repo(), None).unwrap();
        assert!(!plan.matched);
        assert!(plan.steps.is_empty());
        assert!(plan.tag.is_none());
    }

    #[test]
    fn branch_ref_plans_nothing() {
        let plan = plan("refs/heads/v1.0.0", &config_with_repo(), None).unwrap();
        assert!(!plan.matched);
    }

    #[test]
    fn matching_ref_plans_full_sequence() {
        let plan = plan("refs/tags/v1.2.3", &config_with_repo(), None).unwrap();
        assert!(plan.matched);
        assert_eq!(plan.tag.as_deref(), Some("v1.2.3"));
        assert_eq!(plan.version.as_deref(), Some("1.2.3"));

        let ids: Vec<&str> = plan.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["checkout", "runtime", "tool", "credentials", "build", "publish"]
        );
    }

    #[test]
    fn repo_override_beats_config() {
        let plan = plan("v1.0.0", &config_with_repo(), Some("/local/path")).unwrap();
        assert_eq!(plan.repository.as_deref(), Some("/local/path"));
    }

    #[test]
    fn matched_ref_without_repository_fails() {
        let config = Config::default();
        let err = plan("v1.0.0", &config, None).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigMissingKey);
    }

    #[test]
    fn matched_ref_with_bad_version_fails() {
        let err = plan("vNext", &config_with_repo(), None).unwrap_err();
        assert_eq!(
            err.code,
            crate::error::ErrorCode::ValidationInvalidArgument
        );
    }

    #[test]
    fn run_skips_non_matching_ref_without_repository() {
        // A skip must not require a repository to be configured.
        let outcome = run("refs/heads/main", &Config::default(), None).unwrap();
        match outcome {
            ReleaseOutcome::Skipped { skipped, .. } => assert!(skipped),
            ReleaseOutcome::Completed(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn run_is_invoked_once_per_ref() {
        // The gate is pure: the same ref always makes the same decision.
        let config = config_with_repo();
        for _ in 0..3 {
            let outcome = run("refs/tags/nightly", &config, None).unwrap();
            assert!(matches!(outcome, ReleaseOutcome::Skipped { .. }));
        }
    }
}
