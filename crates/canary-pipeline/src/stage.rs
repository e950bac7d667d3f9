//! Stages of a judge comparison execution.

use canary_core::{JudgeComparisonPlan, COMPARE_JUDGE_RESULTS_REF_ID};
use canary_state::StageExecution;
use serde_json::{json, Value};

/// Stage type recorded on judge stages.
pub const CANARY_JUDGE_STAGE_TYPE: &str = "canaryJudge";

/// Context key holding a judge stage's override name.
pub const OVERRIDE_JUDGE_KEY: &str = "overrideCanaryJudge";

/// The fixed stages of a judge comparison, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonStage {
    Judge1,
    Judge2,
    CompareJudgeResults,
}

impl ComparisonStage {
    pub const ALL: [ComparisonStage; 3] = [
        ComparisonStage::Judge1,
        ComparisonStage::Judge2,
        ComparisonStage::CompareJudgeResults,
    ];

    pub fn ref_id(&self) -> &'static str {
        match self {
            ComparisonStage::Judge1 => "judge1",
            ComparisonStage::Judge2 => "judge2",
            ComparisonStage::CompareJudgeResults => COMPARE_JUDGE_RESULTS_REF_ID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComparisonStage::Judge1 => "Judge 1",
            ComparisonStage::Judge2 => "Judge 2",
            ComparisonStage::CompareJudgeResults => "Compare Judge Results",
        }
    }

    pub fn stage_type(&self) -> &'static str {
        match self {
            ComparisonStage::Judge1 | ComparisonStage::Judge2 => CANARY_JUDGE_STAGE_TYPE,
            ComparisonStage::CompareJudgeResults => COMPARE_JUDGE_RESULTS_REF_ID,
        }
    }

    /// Key under which the comparison output holds this judge's result.
    pub fn result_key(&self) -> Option<&'static str> {
        match self {
            ComparisonStage::Judge1 => Some("judge1Result"),
            ComparisonStage::Judge2 => Some("judge2Result"),
            ComparisonStage::CompareJudgeResults => None,
        }
    }

    pub fn from_ref_id(ref_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.ref_id() == ref_id)
    }

    fn override_judge<'a>(&self, plan: &'a JudgeComparisonPlan) -> Option<&'a str> {
        match self {
            ComparisonStage::Judge1 => plan.override_canary_judge1.as_deref(),
            ComparisonStage::Judge2 => plan.override_canary_judge2.as_deref(),
            ComparisonStage::CompareJudgeResults => None,
        }
    }

    /// A not-started stage carrying the plan inputs it needs.
    pub fn build(&self, plan: &JudgeComparisonPlan) -> StageExecution {
        let stage = StageExecution::new(self.ref_id(), self.name(), self.stage_type());
        match self {
            ComparisonStage::Judge1 | ComparisonStage::Judge2 => stage
                .with_context("canaryConfigId", json!(plan.canary_config_id))
                .with_context("metricSetPairListId", json!(plan.metric_set_pair_list_id))
                .with_context("storageAccountName", json!(plan.storage_account_name))
                .with_context(
                    "configurationAccountName",
                    json!(plan.configuration_account_name),
                )
                .with_context(
                    "scoreThresholds",
                    json!({"pass": plan.thresholds.pass, "marginal": plan.thresholds.marginal}),
                )
                .with_context(
                    OVERRIDE_JUDGE_KEY,
                    self.override_judge(plan).map_or(Value::Null, |n| json!(n)),
                ),
            ComparisonStage::CompareJudgeResults => stage,
        }
    }
}

/// Context recorded on a stage that failed.
pub fn exception_context(error: &str) -> Value {
    json!({
        "details": {
            "error": error,
            "errors": [error],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_core::{CanaryConfig, ClassifierThresholds};

    fn plan() -> JudgeComparisonPlan {
        JudgeComparisonPlan {
            application: "judge-comparison".to_string(),
            pipeline_name: "judge-comparison".to_string(),
            canary_config_id: "cfg".to_string(),
            canary_config: CanaryConfig::default(),
            override_canary_judge1: Some("DreddJudge".to_string()),
            override_canary_judge2: None,
            metric_set_pair_list_id: "pairs".to_string(),
            thresholds: ClassifierThresholds::new(95.0, 75.0).unwrap(),
            configuration_account_name: "configs".to_string(),
            storage_account_name: "metrics".to_string(),
        }
    }

    #[test]
    fn stages_are_found_by_ref_id() {
        for stage in ComparisonStage::ALL {
            assert_eq!(ComparisonStage::from_ref_id(stage.ref_id()), Some(stage));
        }
        assert_eq!(ComparisonStage::from_ref_id("judge3"), None);
    }

    #[test]
    fn judge_stage_records_override() {
        let plan = plan();
        let first = ComparisonStage::Judge1.build(&plan);
        let second = ComparisonStage::Judge2.build(&plan);
        assert_eq!(first.context[OVERRIDE_JUDGE_KEY], json!("DreddJudge"));
        assert_eq!(second.context[OVERRIDE_JUDGE_KEY], Value::Null);
        assert_eq!(first.context["storageAccountName"], json!("metrics"));
        assert_eq!(first.name, "Judge 1");
    }

    #[test]
    fn compare_stage_uses_contract_ref_id() {
        let stage = ComparisonStage::CompareJudgeResults.build(&plan());
        assert_eq!(stage.ref_id, "compareJudgeResults");
        assert!(stage.context.is_empty());
    }

    #[test]
    fn exception_context_lists_error() {
        let ctx = exception_context("boom");
        assert_eq!(ctx["details"]["error"], json!("boom"));
        assert_eq!(ctx["details"]["errors"], json!(["boom"]));
    }
}
