//! Comparison result aggregation.
//!
//! A judge comparison execution ends in a stage with ref id
//! [`COMPARE_JUDGE_RESULTS_REF_ID`]. Its `comparisonResult` output is only
//! reported once the execution as a whole has succeeded. Stage exceptions
//! are reported whenever present.

use std::collections::BTreeMap;

use canary_state::{ExecutionStatus, PipelineExecution};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{JudgeError, Result};

/// Ref id of the stage holding the comparison output.
pub const COMPARE_JUDGE_RESULTS_REF_ID: &str = "compareJudgeResults";

/// Output key written by the comparison stage.
pub const COMPARISON_RESULT_KEY: &str = "comparisonResult";

/// Summary of a comparison execution. Either key may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<BTreeMap<String, Value>>,
}

/// Derive the summary of a stored comparison execution.
pub fn summarize_comparison(execution: &PipelineExecution) -> Result<ComparisonSummary> {
    let mut matching = execution.stages_by_ref_id(COMPARE_JUDGE_RESULTS_REF_ID);
    let stage = matching.next().ok_or_else(|| JudgeError::StageNotFound {
        execution_id: execution.id.clone(),
        ref_id: COMPARE_JUDGE_RESULTS_REF_ID.to_string(),
    })?;

    let extra = matching.count();
    if extra > 0 {
        tracing::warn!(
            execution_id = %execution.id,
            ref_id = COMPARE_JUDGE_RESULTS_REF_ID,
            matches = extra + 1,
            "several comparison stages found, using the first"
        );
    }

    let comparison_result = if execution.status.is_complete()
        && execution
            .status
            .as_str()
            .eq_ignore_ascii_case(ExecutionStatus::Succeeded.as_str())
    {
        stage.outputs.get(COMPARISON_RESULT_KEY).cloned()
    } else {
        None
    };

    let exceptions: BTreeMap<String, Value> = execution
        .stages
        .iter()
        .filter_map(|s| s.exception().map(|e| (s.name.clone(), e.clone())))
        .collect();

    Ok(ComparisonSummary {
        comparison_result,
        exceptions: (!exceptions.is_empty()).then_some(exceptions),
    })
}
