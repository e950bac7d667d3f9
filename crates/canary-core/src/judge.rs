//! The canary judge capability.

use serde::{Deserialize, Serialize};

use crate::domain::{CanaryConfig, CanaryJudgeResult, ClassifierThresholds, MetricSetPair, Result};

/// A named, stateless comparator of control and experiment metrics.
///
/// Implementations must be deterministic for identical inputs and must not
/// keep state between calls; the registry shares one instance across requests.
pub trait CanaryJudge: Send + Sync {
    /// Unique name within the registry.
    fn name(&self) -> &str;

    /// Whether the judge is advertised by `GET /judges`.
    fn is_visible(&self) -> bool {
        true
    }

    fn judge(
        &self,
        config: &CanaryConfig,
        thresholds: &ClassifierThresholds,
        metric_set_pairs: &[MetricSetPair],
    ) -> Result<CanaryJudgeResult>;
}

/// Public description of a registered judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeDescriptor {
    pub name: String,
    pub visible: bool,
}

impl JudgeDescriptor {
    pub fn of(judge: &dyn CanaryJudge) -> Self {
        Self {
            name: judge.name().to_string(),
            visible: judge.is_visible(),
        }
    }
}
