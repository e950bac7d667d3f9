//! Domain models for the judge service.
//!
//! - `CanaryConfig`: stored configuration, optionally naming a judge
//! - `MetricSetPair`: control/experiment series fed to judges
//! - `CanaryJudgeResult`: what a judge returns
//! - `JudgeError`: the error taxonomy shared by every operation

pub mod config;
pub mod error;
pub mod metrics;
pub mod result;

pub use config::{
    CanaryClassifierConfig, CanaryConfig, CanaryJudgeConfig, CanaryMetricConfig,
    ClassifierThresholds, Direction, MetricAnalysisConfig,
};
pub use error::{ErrorKind, JudgeError, Result};
pub use metrics::MetricSetPair;
pub use result::{
    CanaryJudgeResult, GroupScore, JudgementScore, MetricAnalysisResult, MetricClassification,
    ScoreClassification,
};
