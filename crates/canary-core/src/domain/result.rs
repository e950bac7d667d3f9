//! Judgement results returned by canary judges.

use serde::{Deserialize, Serialize};

/// Outcome for a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricClassification {
    Pass,
    High,
    Low,
    Nodata,
    Error,
}

impl MetricClassification {
    /// Whether the metric has data to be scored.
    pub fn is_classified(&self) -> bool {
        matches!(
            self,
            MetricClassification::Pass | MetricClassification::High | MetricClassification::Low
        )
    }
}

/// Outcome for a whole judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreClassification {
    Pass,
    Marginal,
    Fail,
    Nodata,
}

/// Per-metric analysis detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAnalysisResult {
    pub name: String,
    pub id: Option<String>,
    pub classification: MetricClassification,
    pub classification_reason: Option<String>,
    pub groups: Vec<String>,
    pub critical: bool,
    pub control_mean: Option<f64>,
    pub experiment_mean: Option<f64>,
    pub relative_delta: Option<f64>,
}

/// Score of one metric group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupScore {
    pub name: String,
    pub score: f64,
    pub classified_metrics: usize,
    pub passing_metrics: usize,
}

/// Overall score and its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgementScore {
    pub score: f64,
    pub classification: ScoreClassification,
    pub classification_reason: Option<String>,
}

/// Structured output of one judge invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryJudgeResult {
    pub judge_name: String,
    pub results: Vec<MetricAnalysisResult>,
    pub group_scores: Vec<GroupScore>,
    pub score: JudgementScore,
}
