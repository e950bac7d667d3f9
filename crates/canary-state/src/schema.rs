//! Execution records persisted by the execution repository.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    Pipeline,
    Orchestration,
}

/// Lifecycle status shared by executions and stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    NotStarted,
    Running,
    Paused,
    Suspended,
    Succeeded,
    FailedContinue,
    Terminal,
    Canceled,
    Redirect,
    Stopped,
    Skipped,
    Buffered,
}

impl ExecutionStatus {
    /// Whether the status is final.
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded
                | ExecutionStatus::FailedContinue
                | ExecutionStatus::Terminal
                | ExecutionStatus::Canceled
                | ExecutionStatus::Stopped
                | ExecutionStatus::Skipped
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::NotStarted => "NOT_STARTED",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Paused => "PAUSED",
            ExecutionStatus::Suspended => "SUSPENDED",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::FailedContinue => "FAILED_CONTINUE",
            ExecutionStatus::Terminal => "TERMINAL",
            ExecutionStatus::Canceled => "CANCELED",
            ExecutionStatus::Redirect => "REDIRECT",
            ExecutionStatus::Stopped => "STOPPED",
            ExecutionStatus::Skipped => "SKIPPED",
            ExecutionStatus::Buffered => "BUFFERED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a pipeline execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageExecution {
    /// Unique id within the execution.
    pub id: String,
    /// Stable reference id used by callers to find the stage.
    pub ref_id: String,
    /// Display name; keys the `exceptions` summary.
    pub name: String,
    #[serde(rename = "type")]
    pub stage_type: String,
    pub status: ExecutionStatus,
    /// Inputs and error annotations (`exception`).
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Values produced by the stage.
    #[serde(default)]
    pub outputs: Map<String, Value>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl StageExecution {
    pub fn new(
        ref_id: impl Into<String>,
        name: impl Into<String>,
        stage_type: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ref_id: ref_id.into(),
            name: name.into(),
            stage_type: stage_type.into(),
            status: ExecutionStatus::NotStarted,
            context: Map::new(),
            outputs: Map::new(),
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// The stage's `exception` annotation, if any.
    pub fn exception(&self) -> Option<&Value> {
        self.context.get("exception")
    }
}

/// A pipeline execution and its ordered stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineExecution {
    pub id: String,
    #[serde(rename = "type")]
    pub execution_type: ExecutionType,
    pub name: String,
    pub application: String,
    pub status: ExecutionStatus,
    pub stages: Vec<StageExecution>,
    pub build_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl PipelineExecution {
    /// A new, not yet started pipeline execution with a random id.
    pub fn new_pipeline(
        name: impl Into<String>,
        application: impl Into<String>,
        stages: Vec<StageExecution>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            execution_type: ExecutionType::Pipeline,
            name: name.into(),
            application: application.into(),
            status: ExecutionStatus::NotStarted,
            stages,
            build_time: Utc::now(),
            start_time: None,
            end_time: None,
        }
    }

    /// All stages carrying `ref_id`, in stage order.
    pub fn stages_by_ref_id<'a>(
        &'a self,
        ref_id: &'a str,
    ) -> impl Iterator<Item = &'a StageExecution> + 'a {
        self.stages.iter().filter(move |s| s.ref_id == ref_id)
    }

    pub fn stage_by_ref_id(&self, ref_id: &str) -> Option<&StageExecution> {
        self.stages.iter().find(|s| s.ref_id == ref_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_statuses() {
        assert!(ExecutionStatus::Succeeded.is_complete());
        assert!(ExecutionStatus::Terminal.is_complete());
        assert!(ExecutionStatus::Canceled.is_complete());
        assert!(!ExecutionStatus::Running.is_complete());
        assert!(!ExecutionStatus::NotStarted.is_complete());
        assert!(!ExecutionStatus::Buffered.is_complete());
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ExecutionStatus::FailedContinue).unwrap();
        assert_eq!(json, "\"FAILED_CONTINUE\"");
        assert_eq!(ExecutionStatus::FailedContinue.to_string(), "FAILED_CONTINUE");
    }

    #[test]
    fn stage_lookup_by_ref_id_keeps_order() {
        let exec = PipelineExecution::new_pipeline(
            "judge-comparison",
            "canary",
            vec![
                StageExecution::new("a", "First", "t"),
                StageExecution::new("b", "Second", "t"),
                StageExecution::new("b", "Third", "t"),
            ],
        );
        assert_eq!(exec.stage_by_ref_id("b").unwrap().name, "Second");
        assert_eq!(exec.stages_by_ref_id("b").count(), 2);
        assert!(exec.stage_by_ref_id("c").is_none());
    }

    #[test]
    fn stage_exception_comes_from_context() {
        let stage = StageExecution::new("x", "X", "t")
            .with_context("exception", serde_json::json!("timeout"));
        assert_eq!(stage.exception(), Some(&serde_json::json!("timeout")));
    }
}
