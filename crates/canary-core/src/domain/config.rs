//! Canary configuration documents and classification thresholds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::{JudgeError, Result};

/// Direction of change that counts as a regression for a metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Only an increase over the control fails the metric.
    Increase,
    /// Only a decrease below the control fails the metric.
    Decrease,
    /// A change in either direction fails the metric.
    #[default]
    Either,
}

impl Direction {
    pub fn flags_increase(&self) -> bool {
        matches!(self, Direction::Increase | Direction::Either)
    }

    pub fn flags_decrease(&self) -> bool {
        matches!(self, Direction::Decrease | Direction::Either)
    }
}

/// Per-metric settings read by judges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAnalysisConfig {
    #[serde(default)]
    pub direction: Direction,
    /// Allowed relative deviation of the experiment mean from the control mean.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// A failing critical metric fails the whole judgement.
    #[serde(default)]
    pub critical: bool,
}

fn default_tolerance() -> f64 {
    0.1
}

impl Default for MetricAnalysisConfig {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            tolerance: default_tolerance(),
            critical: false,
        }
    }
}

/// A metric declared by a canary configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryMetricConfig {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Metric source query; opaque to judges.
    #[serde(default)]
    pub query: serde_json::Value,
    #[serde(default)]
    pub analysis: MetricAnalysisConfig,
}

/// Judge preference carried by a configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryJudgeConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Judge-specific settings.
    #[serde(default)]
    pub judge_configurations: serde_json::Map<String, serde_json::Value>,
}

/// Weights applied to metric groups when scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryClassifierConfig {
    #[serde(default)]
    pub group_weights: BTreeMap<String, f64>,
}

/// A stored canary configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<CanaryMetricConfig>,
    #[serde(default)]
    pub classifier: Option<CanaryClassifierConfig>,
    #[serde(default)]
    pub judge: Option<CanaryJudgeConfig>,
}

impl CanaryConfig {
    /// The preferred judge name, if one is set and non-empty.
    pub fn judge_preference(&self) -> Option<&str> {
        self.judge
            .as_ref()
            .and_then(|j| j.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    pub fn metric(&self, name: &str) -> Option<&CanaryMetricConfig> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn group_weights(&self) -> Option<&BTreeMap<String, f64>> {
        self.classifier
            .as_ref()
            .map(|c| &c.group_weights)
            .filter(|w| !w.is_empty())
    }
}

/// Score cutoffs supplied with each judge invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    pub pass: f64,
    pub marginal: f64,
}

impl ClassifierThresholds {
    /// Both cutoffs must be finite numbers.
    pub fn new(pass: f64, marginal: f64) -> Result<Self> {
        if !pass.is_finite() {
            return Err(JudgeError::InvalidArgument(format!(
                "passThreshold must be a finite number, got {pass}"
            )));
        }
        if !marginal.is_finite() {
            return Err(JudgeError::InvalidArgument(format!(
                "marginalThreshold must be a finite number, got {marginal}"
            )));
        }
        Ok(Self { pass, marginal })
    }
}
