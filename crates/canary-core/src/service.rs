//! The judge service: synchronous judging, comparison kickoff and result reads.
//!
//! Every operation resolves its accounts and loads its objects before any
//! judge runs, so a failure in an earlier step never reaches a judge.

use std::sync::Arc;

use async_trait::async_trait;
use canary_state::{
    load_object, AccountRepository, AccountType, ExecutionRepository, ExecutionType, ObjectType,
    StorageServiceRepository,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::comparison::{summarize_comparison, ComparisonSummary};
use crate::domain::{
    CanaryConfig, CanaryJudgeResult, ClassifierThresholds, JudgeError, MetricSetPair, Result,
};
use crate::judge::JudgeDescriptor;
use crate::obs::{self, JudgeSpan};
use crate::registry::JudgeRegistry;

/// Name given to every judge comparison execution.
pub const JUDGE_COMPARISON_PIPELINE: &str = "judge-comparison";

/// Parameters of a synchronous judge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeRequest {
    #[serde(default)]
    pub configuration_account_name: Option<String>,
    #[serde(default)]
    pub storage_account_name: Option<String>,
    pub canary_config_id: String,
    pub metric_set_pair_list_id: String,
    pub pass_threshold: f64,
    pub marginal_threshold: f64,
}

/// Parameters of a two-judge comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRequest {
    #[serde(default)]
    pub configuration_account_name: Option<String>,
    #[serde(default)]
    pub storage_account_name: Option<String>,
    pub canary_config_id: String,
    #[serde(default)]
    pub override_canary_judge1: Option<String>,
    #[serde(default)]
    pub override_canary_judge2: Option<String>,
    pub metric_set_pair_list_id: String,
    pub pass_threshold: f64,
    pub marginal_threshold: f64,
}

/// Handle to a started comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanaryExecutionResponse {
    pub canary_execution_id: String,
}

/// Everything the execution engine needs to run a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeComparisonPlan {
    pub application: String,
    pub pipeline_name: String,
    pub canary_config_id: String,
    pub canary_config: CanaryConfig,
    pub override_canary_judge1: Option<String>,
    pub override_canary_judge2: Option<String>,
    pub metric_set_pair_list_id: String,
    pub thresholds: ClassifierThresholds,
    pub configuration_account_name: String,
    pub storage_account_name: String,
}

/// Builds and launches comparison executions.
///
/// Implementations must return as soon as the execution is stored; the
/// judges run later.
#[async_trait]
pub trait ExecutionMapper: Send + Sync {
    async fn build_judge_comparison_execution(
        &self,
        plan: JudgeComparisonPlan,
    ) -> Result<CanaryExecutionResponse>;
}

/// Load a canary configuration from its account.
pub async fn load_canary_config(
    storage: &StorageServiceRepository,
    account_name: &str,
    canary_config_id: &str,
) -> Result<CanaryConfig> {
    let service = storage.get_required_one(account_name)?;
    let config = load_object(
        service.as_ref(),
        account_name,
        ObjectType::CanaryConfig,
        canary_config_id,
    )
    .await?;
    Ok(config)
}

/// Load a metric set pair list from its account.
pub async fn load_metric_set_pairs(
    storage: &StorageServiceRepository,
    account_name: &str,
    metric_set_pair_list_id: &str,
) -> Result<Vec<MetricSetPair>> {
    let service = storage.get_required_one(account_name)?;
    let pairs = load_object(
        service.as_ref(),
        account_name,
        ObjectType::MetricSetPairList,
        metric_set_pair_list_id,
    )
    .await?;
    Ok(pairs)
}

fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(JudgeError::InvalidArgument(format!("{name} is required")));
    }
    Ok(())
}

#[derive(Clone)]
pub struct JudgeService {
    accounts: Arc<AccountRepository>,
    storage: Arc<StorageServiceRepository>,
    executions: Arc<dyn ExecutionRepository>,
    mapper: Arc<dyn ExecutionMapper>,
    judges: Arc<JudgeRegistry>,
}

impl JudgeService {
    pub fn new(
        accounts: Arc<AccountRepository>,
        storage: Arc<StorageServiceRepository>,
        executions: Arc<dyn ExecutionRepository>,
        mapper: Arc<dyn ExecutionMapper>,
        judges: Arc<JudgeRegistry>,
    ) -> Self {
        Self {
            accounts,
            storage,
            executions,
            mapper,
            judges,
        }
    }

    pub fn judges(&self) -> &JudgeRegistry {
        &self.judges
    }

    pub fn list_judges(&self) -> Vec<JudgeDescriptor> {
        self.judges.list()
    }

    /// Run the judge chosen by the configuration and return its result.
    pub async fn judge(&self, request: JudgeRequest) -> Result<CanaryJudgeResult> {
        let span = obs::judge_span("judge", &request.canary_config_id);
        self.run_judge(request).instrument(span).await
    }

    async fn run_judge(&self, request: JudgeRequest) -> Result<CanaryJudgeResult> {
        require(&request.canary_config_id, "canaryConfigId")?;
        require(&request.metric_set_pair_list_id, "metricSetPairListId")?;

        let config_account = self.accounts.resolve(
            request.configuration_account_name.as_deref(),
            AccountType::ConfigurationStore,
        )?;
        let storage_account = self.accounts.resolve(
            request.storage_account_name.as_deref(),
            AccountType::ObjectStore,
        )?;

        let config =
            load_canary_config(&self.storage, &config_account.name, &request.canary_config_id)
                .await?;
        let judge = self.judges.resolve(&config)?;
        let pairs = load_metric_set_pairs(
            &self.storage,
            &storage_account.name,
            &request.metric_set_pair_list_id,
        )
        .await?;
        let thresholds =
            ClassifierThresholds::new(request.pass_threshold, request.marginal_threshold)?;

        let _span = JudgeSpan::enter(judge.name());
        let result = judge.judge(&config, &thresholds, &pairs)?;
        obs::emit_judge_invoked(
            judge.name(),
            pairs.len(),
            &format!("{:?}", result.score.classification),
            result.score.score,
        );
        Ok(result)
    }

    /// Start a two-judge comparison and return its execution handle.
    pub async fn initiate_comparison(
        &self,
        request: ComparisonRequest,
    ) -> Result<CanaryExecutionResponse> {
        let span = obs::judge_span("comparison", &request.canary_config_id);
        self.start_comparison(request).instrument(span).await
    }

    async fn start_comparison(&self, request: ComparisonRequest) -> Result<CanaryExecutionResponse> {
        require(&request.canary_config_id, "canaryConfigId")?;
        require(&request.metric_set_pair_list_id, "metricSetPairListId")?;

        let storage_account = self.accounts.resolve(
            request.storage_account_name.as_deref(),
            AccountType::ObjectStore,
        )?;
        let config_account = self.accounts.resolve(
            request.configuration_account_name.as_deref(),
            AccountType::ConfigurationStore,
        )?;
        let config =
            load_canary_config(&self.storage, &config_account.name, &request.canary_config_id)
                .await?;
        let thresholds =
            ClassifierThresholds::new(request.pass_threshold, request.marginal_threshold)?;

        let plan = JudgeComparisonPlan {
            application: JUDGE_COMPARISON_PIPELINE.to_string(),
            pipeline_name: JUDGE_COMPARISON_PIPELINE.to_string(),
            canary_config_id: request.canary_config_id.clone(),
            canary_config: config,
            override_canary_judge1: request.override_canary_judge1,
            override_canary_judge2: request.override_canary_judge2,
            metric_set_pair_list_id: request.metric_set_pair_list_id,
            thresholds,
            configuration_account_name: config_account.name,
            storage_account_name: storage_account.name,
        };

        let response = self.mapper.build_judge_comparison_execution(plan).await?;
        obs::emit_comparison_started(&response.canary_execution_id, &request.canary_config_id);
        Ok(response)
    }

    /// Point-in-time summary of a comparison execution.
    pub async fn comparison_results(&self, execution_id: &str) -> Result<ComparisonSummary> {
        require(execution_id, "executionId")?;

        let execution = self
            .executions
            .retrieve(ExecutionType::Pipeline, execution_id)
            .instrument(obs::execution_span(execution_id))
            .await?;
        let summary = summarize_comparison(&execution)?;
        obs::emit_comparison_read(
            execution_id,
            summary.comparison_result.is_some(),
            summary.exceptions.as_ref().map_or(0, |e| e.len()),
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for JudgeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeService")
            .field("judges", &self.judges)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
