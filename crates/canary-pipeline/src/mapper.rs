//! Execution mapper backed by the in-process comparison pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use canary_core::obs;
use canary_core::{
    CanaryExecutionResponse, ExecutionMapper, JudgeComparisonPlan, JudgeError, JudgeRegistry,
};
use canary_state::{ExecutionRepository, StorageServiceRepository};
use tokio::runtime::Handle;

use crate::pipeline::JudgeComparisonPipeline;

/// Stores each comparison execution and runs it on the current tokio runtime.
#[derive(Clone)]
pub struct PipelineExecutionMapper {
    executions: Arc<dyn ExecutionRepository>,
    pipeline: JudgeComparisonPipeline,
}

impl PipelineExecutionMapper {
    pub fn new(
        executions: Arc<dyn ExecutionRepository>,
        storage: Arc<StorageServiceRepository>,
        judges: Arc<JudgeRegistry>,
    ) -> Self {
        let pipeline = JudgeComparisonPipeline::new(executions.clone(), storage, judges);
        Self {
            executions,
            pipeline,
        }
    }
}

#[async_trait]
impl ExecutionMapper for PipelineExecutionMapper {
    async fn build_judge_comparison_execution(
        &self,
        plan: JudgeComparisonPlan,
    ) -> canary_core::Result<CanaryExecutionResponse> {
        let runtime = Handle::try_current()
            .map_err(|e| JudgeError::ExecutionLaunch(e.to_string()))?;

        let execution = JudgeComparisonPipeline::build(&plan);
        self.executions.store(&execution).await?;
        let canary_execution_id = execution.id.clone();

        let pipeline = self.pipeline.clone();
        runtime.spawn(async move {
            let execution_id = execution.id.clone();
            if let Err(err) = pipeline.run(execution, &plan).await {
                obs::emit_request_failed("comparison.run", &err);
                tracing::error!(execution_id = %execution_id, error = %err, "Judge comparison aborted");
            }
        });

        Ok(CanaryExecutionResponse {
            canary_execution_id,
        })
    }
}
