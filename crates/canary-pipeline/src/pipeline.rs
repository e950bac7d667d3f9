//! Judge comparison execution: build, run and record.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use canary_core::obs;
use canary_core::{
    load_metric_set_pairs, JudgeComparisonPlan, JudgeError, JudgeRegistry, COMPARISON_RESULT_KEY,
};
use canary_state::{
    ExecutionRepository, ExecutionStatus, ExecutionType, PipelineExecution, StageExecution,
    StorageError, StorageResult, StorageServiceRepository,
};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn, Instrument};

use crate::stage::{exception_context, ComparisonStage};

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Final state of one comparison run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub execution_id: String,
    pub status: ExecutionStatus,
    /// Ref id and status of every stage, in order.
    pub stages: Vec<(String, ExecutionStatus)>,
    pub duration_ms: u64,
}

impl PipelineOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == ExecutionStatus::Succeeded
    }
}

/// Runs the three comparison stages against shared judges and storage.
#[derive(Clone)]
pub struct JudgeComparisonPipeline {
    executions: Arc<dyn ExecutionRepository>,
    storage: Arc<StorageServiceRepository>,
    judges: Arc<JudgeRegistry>,
}

impl JudgeComparisonPipeline {
    pub fn new(
        executions: Arc<dyn ExecutionRepository>,
        storage: Arc<StorageServiceRepository>,
        judges: Arc<JudgeRegistry>,
    ) -> Self {
        Self {
            executions,
            storage,
            judges,
        }
    }

    /// A not-started execution for `plan`.
    pub fn build(plan: &JudgeComparisonPlan) -> PipelineExecution {
        let stages = ComparisonStage::ALL
            .iter()
            .map(|stage| stage.build(plan))
            .collect();
        PipelineExecution::new_pipeline(&plan.pipeline_name, &plan.application, stages)
    }

    /// Run a stored execution to completion.
    ///
    /// Stage failures end the execution `TERMINAL`; only repository errors
    /// are returned. On a repository error the execution is still moved to
    /// `TERMINAL` when the repository allows it.
    pub async fn run(
        &self,
        execution: PipelineExecution,
        plan: &JudgeComparisonPlan,
    ) -> StorageResult<PipelineOutcome> {
        let span = obs::execution_span(&execution.id);
        let execution_id = execution.id.clone();
        let outcome = self
            .run_stages(execution, plan)
            .instrument(span.clone())
            .await;
        if let Err(err) = &outcome {
            self.abandon(&execution_id, err).instrument(span).await;
        }
        outcome
    }

    async fn abandon(&self, execution_id: &str, err: &StorageError) {
        obs::emit_request_failed("pipeline.run", err);
        match self
            .executions
            .update_status(ExecutionType::Pipeline, execution_id, ExecutionStatus::Terminal)
            .await
        {
            Ok(()) => obs::emit_execution_finished(
                execution_id,
                ExecutionStatus::Terminal.as_str(),
                0,
            ),
            Err(update_err) => warn!(
                execution_id = %execution_id,
                error = %update_err,
                "Could not mark abandoned execution terminal"
            ),
        }
    }

    async fn run_stages(
        &self,
        execution: PipelineExecution,
        plan: &JudgeComparisonPlan,
    ) -> StorageResult<PipelineOutcome> {
        let start = Instant::now();
        let execution_id = execution.id.clone();

        self.executions
            .update_status(ExecutionType::Pipeline, &execution_id, ExecutionStatus::Running)
            .await?;
        info!(execution_id = %execution_id, "Starting judge comparison");

        let mut judge_results: BTreeMap<&'static str, Value> = BTreeMap::new();
        let mut failed = false;
        let mut stages = Vec::with_capacity(execution.stages.len());

        for mut stage in execution.stages {
            if failed {
                stage.status = ExecutionStatus::Skipped;
                self.store_stage(&execution_id, &stage).await?;
                stages.push((stage.ref_id, stage.status));
                continue;
            }

            let stage_start = Instant::now();
            stage.status = ExecutionStatus::Running;
            stage.start_time = Some(Utc::now());
            self.store_stage(&execution_id, &stage).await?;

            match self.execute_stage(&stage, plan, &judge_results).await {
                Ok(outputs) => {
                    if let Some(key) =
                        ComparisonStage::from_ref_id(&stage.ref_id).and_then(|s| s.result_key())
                    {
                        if let Some(result) = outputs.get("result") {
                            judge_results.insert(key, result.clone());
                        }
                    }
                    stage.outputs.extend(outputs);
                    stage.status = ExecutionStatus::Succeeded;
                }
                Err(err) => {
                    obs::emit_request_failed(&stage.ref_id, &err);
                    stage
                        .context
                        .insert("exception".to_string(), exception_context(&err.to_string()));
                    stage.status = ExecutionStatus::Terminal;
                    failed = true;
                }
            }

            stage.end_time = Some(Utc::now());
            self.store_stage(&execution_id, &stage).await?;
            obs::emit_stage_finished(
                &execution_id,
                &stage.ref_id,
                stage.status.as_str(),
                elapsed_ms(stage_start),
            );
            stages.push((stage.ref_id, stage.status));
        }

        let status = if failed {
            ExecutionStatus::Terminal
        } else {
            ExecutionStatus::Succeeded
        };
        self.executions
            .update_status(ExecutionType::Pipeline, &execution_id, status)
            .await?;

        let duration_ms = elapsed_ms(start);
        obs::emit_execution_finished(&execution_id, status.as_str(), duration_ms);

        Ok(PipelineOutcome {
            execution_id,
            status,
            stages,
            duration_ms,
        })
    }

    async fn store_stage(&self, execution_id: &str, stage: &StageExecution) -> StorageResult<()> {
        self.executions
            .store_stage(ExecutionType::Pipeline, execution_id, stage)
            .await
    }

    async fn execute_stage(
        &self,
        stage: &StageExecution,
        plan: &JudgeComparisonPlan,
        judge_results: &BTreeMap<&'static str, Value>,
    ) -> canary_core::Result<Map<String, Value>> {
        let kind = ComparisonStage::from_ref_id(&stage.ref_id).ok_or_else(|| {
            JudgeError::InvalidArgument(format!("unknown stage ref id '{}'", stage.ref_id))
        })?;

        let mut outputs = Map::new();
        match kind {
            ComparisonStage::Judge1 | ComparisonStage::Judge2 => {
                let override_name = stage
                    .context
                    .get(crate::stage::OVERRIDE_JUDGE_KEY)
                    .and_then(Value::as_str);
                let judge = self
                    .judges
                    .resolve_with_override(override_name, &plan.canary_config)?;
                let pairs = load_metric_set_pairs(
                    &self.storage,
                    &plan.storage_account_name,
                    &plan.metric_set_pair_list_id,
                )
                .await?;
                let _span = obs::JudgeSpan::enter(judge.name());
                let result = judge.judge(&plan.canary_config, &plan.thresholds, &pairs)?;
                obs::emit_judge_invoked(
                    judge.name(),
                    pairs.len(),
                    &format!("{:?}", result.score.classification),
                    result.score.score,
                );
                let value = serde_json::to_value(&result)
                    .map_err(|e| JudgeError::Judgement(e.to_string()))?;
                outputs.insert("result".to_string(), value);
            }
            ComparisonStage::CompareJudgeResults => {
                let comparison: Map<String, Value> = judge_results
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect();
                outputs.insert(COMPARISON_RESULT_KEY.to_string(), Value::Object(comparison));
            }
        }
        Ok(outputs)
    }
}

impl std::fmt::Debug for JudgeComparisonPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeComparisonPipeline")
            .field("judges", &self.judges)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_core::{CanaryConfig, ClassifierThresholds};

    #[test]
    fn build_lays_out_three_pending_stages() {
        let plan = JudgeComparisonPlan {
            application: "judge-comparison".to_string(),
            pipeline_name: "judge-comparison".to_string(),
            canary_config_id: "cfg".to_string(),
            canary_config: CanaryConfig::default(),
            override_canary_judge1: None,
            override_canary_judge2: None,
            metric_set_pair_list_id: "pairs".to_string(),
            thresholds: ClassifierThresholds::new(95.0, 75.0).unwrap(),
            configuration_account_name: "configs".to_string(),
            storage_account_name: "metrics".to_string(),
        };
        let execution = JudgeComparisonPipeline::build(&plan);
        assert_eq!(execution.name, "judge-comparison");
        assert_eq!(execution.status, ExecutionStatus::NotStarted);
        let refs: Vec<&str> = execution.stages.iter().map(|s| s.ref_id.as_str()).collect();
        assert_eq!(refs, vec!["judge1", "judge2", "compareJudgeResults"]);
        assert!(execution
            .stages
            .iter()
            .all(|s| s.status == ExecutionStatus::NotStarted));
    }

    #[test]
    fn elapsed_ms_counts_from_start() {
        let start = Instant::now();
        assert!(elapsed_ms(start) < 60_000);
    }

    #[test]
    fn outcome_reports_success() {
        let outcome = PipelineOutcome {
            execution_id: "e".to_string(),
            status: ExecutionStatus::Terminal,
            stages: vec![("judge1".to_string(), ExecutionStatus::Terminal)],
            duration_ms: 1,
        };
        assert!(!outcome.succeeded());
    }
}
