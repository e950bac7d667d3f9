//! Canary-Core: judges and the judge service
//!
//! ## Key Components
//!
//! - `CanaryJudge`: a named, stateless comparator of control/experiment metrics
//! - `JudgeRegistry`: unique-name registry with an explicit default judge
//! - `JudgeService`: synchronous judging, comparison kickoff, comparison reads
//! - `ExecutionMapper`: seam to the engine that runs comparison executions
//! - `MeanDeltaJudge`: the built-in judge

pub mod comparison;
pub mod domain;
pub mod judge;
pub mod mean_delta;
pub mod obs;
pub mod registry;
pub mod service;
pub mod telemetry;

pub use comparison::{
    summarize_comparison, ComparisonSummary, COMPARE_JUDGE_RESULTS_REF_ID, COMPARISON_RESULT_KEY,
};
pub use domain::{
    CanaryClassifierConfig, CanaryConfig, CanaryJudgeConfig, CanaryJudgeResult,
    CanaryMetricConfig, ClassifierThresholds, Direction, ErrorKind, GroupScore, JudgeError,
    JudgementScore, MetricAnalysisConfig, MetricAnalysisResult, MetricClassification,
    MetricSetPair, Result, ScoreClassification,
};
pub use judge::{CanaryJudge, JudgeDescriptor};
pub use mean_delta::{MeanDeltaJudge, DEFAULT_MEAN_DELTA_JUDGE};
pub use registry::JudgeRegistry;
pub use service::{
    load_canary_config, load_metric_set_pairs, CanaryExecutionResponse, ComparisonRequest,
    ExecutionMapper, JudgeComparisonPlan, JudgeRequest, JudgeService, JUDGE_COMPARISON_PIPELINE,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
