//! Metric set pairs: control and experiment series for one metric.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const CONTROL: &str = "control";
pub const EXPERIMENT: &str = "experiment";

/// Paired control/experiment series for a single metric.
///
/// Missing samples are stored as `null` and skipped by judges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSetPair {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub values: BTreeMap<String, Vec<Option<f64>>>,
}

impl MetricSetPair {
    pub fn new(name: impl Into<String>, control: Vec<f64>, experiment: Vec<f64>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(CONTROL.to_string(), control.into_iter().map(Some).collect());
        values.insert(
            EXPERIMENT.to_string(),
            experiment.into_iter().map(Some).collect(),
        );
        Self {
            name: name.into(),
            values,
            ..Default::default()
        }
    }

    /// Finite control samples.
    pub fn control(&self) -> Vec<f64> {
        self.samples(CONTROL)
    }

    /// Finite experiment samples.
    pub fn experiment(&self) -> Vec<f64> {
        self.samples(EXPERIMENT)
    }

    fn samples(&self, key: &str) -> Vec<f64> {
        self.values
            .get(key)
            .map(|series| series.iter().flatten().copied().filter(|v| v.is_finite()).collect())
            .unwrap_or_default()
    }
}
