//! Sequential fail-fast step runner.
//!
//! Steps run strictly in order on a disposable workspace. The first failure
//! aborts the run: there are no retries and no rollback, because nothing
//! durable is mutated before the publish step. Remaining steps are recorded
//! as skipped so the report always accounts for the full plan.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Checkout,
    Runtime,
    Tool,
    Credentials,
    Build,
    Publish,
}

impl StepKind {
    pub fn id(&self) -> &'static str {
        match self {
            StepKind::Checkout => "checkout",
            StepKind::Runtime => "runtime",
            StepKind::Tool => "tool",
            StepKind::Credentials => "credentials",
            StepKind::Build => "build",
            StepKind::Publish => "publish",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub kind: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Step {
    pub fn new(kind: StepKind, label: impl Into<String>) -> Self {
        Self {
            id: kind.id().to_string(),
            kind,
            label: Some(label.into()),
        }
    }
}

/// Executes one step, carrying whatever state flows between steps internally.
///
/// Returning `Ok` may include a JSON payload for the run report. Returning
/// `Err` fails the step and aborts the run.
pub trait StepExecutor {
    fn execute_step(&mut self, step: &Step) -> Result<Option<Value>>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub id: String,
    pub kind: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_steps: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub steps: Vec<StepResult>,
    pub status: RunStatus,
    pub summary: RunSummary,
}

/// Run steps in order, stopping at the first failure.
pub fn run(steps: &[Step], executor: &mut dyn StepExecutor) -> RunResult {
    let mut results = Vec::with_capacity(steps.len());
    let mut failed = false;

    for step in steps {
        if failed {
            results.push(StepResult {
                id: step.id.clone(),
                kind: step.kind,
                label: step.label.clone(),
                status: StepStatus::Skipped,
                duration_ms: None,
                data: None,
                error: None,
            });
            continue;
        }

        let started = Instant::now();
        match executor.execute_step(step) {
            Ok(data) => results.push(StepResult {
                id: step.id.clone(),
                kind: step.kind,
                label: step.label.clone(),
                status: StepStatus::Success,
                duration_ms: Some(started.elapsed().as_millis() as u64),
                data,
                error: None,
            }),
            Err(err) => {
                failed = true;
                results.push(StepResult {
                    id: step.id.clone(),
                    kind: step.kind,
                    label: step.label.clone(),
                    status: StepStatus::Failed,
                    duration_ms: Some(started.elapsed().as_millis() as u64),
                    data: None,
                    error: Some(err.message.clone()),
                });
            }
        }
    }

    let summary = build_summary(&results);
    let status = if failed {
        RunStatus::Failed
    } else {
        RunStatus::Success
    };

    RunResult {
        steps: results,
        status,
        summary,
    }
}

fn build_summary(results: &[StepResult]) -> RunSummary {
    RunSummary {
        total_steps: results.len(),
        succeeded: results
            .iter()
            .filter(|r| r.status == StepStatus::Success)
            .count(),
        failed: results
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .count(),
        skipped: results
            .iter()
            .filter(|r| r.status == StepStatus::Skipped)
            .count(),
    }
}
