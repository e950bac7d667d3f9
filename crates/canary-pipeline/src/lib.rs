//! Canary-Pipeline: in-process judge comparison executions
//!
//! Provides an execution mapper that:
//! - Builds a `judge-comparison` execution with stages `judge1`, `judge2`
//!   and `compareJudgeResults`
//! - Stores it before returning its id
//! - Runs the stages on the tokio runtime, recording every transition

pub mod mapper;
pub mod pipeline;
pub mod stage;

pub use mapper::PipelineExecutionMapper;
pub use pipeline::{JudgeComparisonPipeline, PipelineOutcome};
pub use stage::{exception_context, ComparisonStage, CANARY_JUDGE_STAGE_TYPE, OVERRIDE_JUDGE_KEY};
