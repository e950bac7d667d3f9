//! Storage trait definitions for the canary judge service
//!
//! These traits define the storage abstractions:
//! - `StorageService`: object storage addressed by `(account, object type, id)`
//! - `ExecutionRepository`: persistence of pipeline executions and their stages
//!
//! Both traits are async and backend-agnostic. Objects travel as raw bytes;
//! [`load_object`] and [`store_object`] add the JSON encoding on top.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::schema::{ExecutionStatus, ExecutionType, PipelineExecution, StageExecution};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// StorageService — typed object storage
// ---------------------------------------------------------------------------

/// Kind of object held in a store. Each kind lives in its own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    /// A canary configuration document.
    CanaryConfig,
    /// A list of control/experiment metric series pairs.
    MetricSetPairList,
}

impl ObjectType {
    /// Namespace (directory or key prefix) used by backends.
    pub fn group(&self) -> &'static str {
        match self {
            ObjectType::CanaryConfig => "canary_config",
            ObjectType::MetricSetPairList => "metric_pairs",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group())
    }
}

/// Object store serving one or more accounts.
///
/// Guarantees:
/// - `load_bytes` returns exactly what the last `store_bytes` for the same
///   `(account, object type, id)` wrote.
/// - A missing object yields `StorageError::ObjectNotFound`.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Whether this service holds the objects of `account_name`.
    fn services_account(&self, account_name: &str) -> bool;

    /// Load the raw bytes of an object.
    async fn load_bytes(
        &self,
        account_name: &str,
        object_type: ObjectType,
        id: &str,
    ) -> StorageResult<Vec<u8>>;

    /// Store raw bytes, replacing any previous object with the same id.
    async fn store_bytes(
        &self,
        account_name: &str,
        object_type: ObjectType,
        id: &str,
        data: &[u8],
    ) -> StorageResult<()>;

    /// List object ids of one type, sorted.
    async fn list_ids(&self, account_name: &str, object_type: ObjectType)
        -> StorageResult<Vec<String>>;
}

/// Load and decode a JSON object.
pub async fn load_object<T: DeserializeOwned>(
    service: &dyn StorageService,
    account_name: &str,
    object_type: ObjectType,
    id: &str,
) -> StorageResult<T> {
    let bytes = service.load_bytes(account_name, object_type, id).await?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Deserialization {
        object_type,
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Encode and store a JSON object.
pub async fn store_object<T: Serialize + Sync>(
    service: &dyn StorageService,
    account_name: &str,
    object_type: ObjectType,
    id: &str,
    value: &T,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    service
        .store_bytes(account_name, object_type, id, &bytes)
        .await
}

/// Routes an account name to the storage service that serves it.
#[derive(Clone, Default)]
pub struct StorageServiceRepository {
    services: Vec<Arc<dyn StorageService>>,
}

impl StorageServiceRepository {
    pub fn new(services: Vec<Arc<dyn StorageService>>) -> Self {
        Self { services }
    }

    pub fn register(&mut self, service: Arc<dyn StorageService>) {
        self.services.push(service);
    }

    /// The first registered service that serves `account_name`.
    pub fn get_required_one(&self, account_name: &str) -> StorageResult<Arc<dyn StorageService>> {
        self.services
            .iter()
            .find(|s| s.services_account(account_name))
            .cloned()
            .ok_or_else(|| StorageError::StorageServiceNotFound {
                account: account_name.to_string(),
            })
    }
}

impl fmt::Debug for StorageServiceRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageServiceRepository")
            .field("services", &self.services.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ExecutionRepository — pipeline execution persistence
// ---------------------------------------------------------------------------

/// Store of pipeline executions.
///
/// Guarantees:
/// - `retrieve` returns the latest stored state; it never blocks on a
///   running execution.
/// - `store_stage` replaces the stage with the same `id` and leaves the
///   stage order untouched.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Insert or replace a whole execution.
    async fn store(&self, execution: &PipelineExecution) -> StorageResult<()>;

    /// Retrieve an execution by type and id.
    async fn retrieve(
        &self,
        execution_type: ExecutionType,
        execution_id: &str,
    ) -> StorageResult<PipelineExecution>;

    /// Replace one stage of a stored execution.
    async fn store_stage(
        &self,
        execution_type: ExecutionType,
        execution_id: &str,
        stage: &StageExecution,
    ) -> StorageResult<()>;

    /// Update the status of a stored execution.
    async fn update_status(
        &self,
        execution_type: ExecutionType,
        execution_id: &str,
        status: ExecutionStatus,
    ) -> StorageResult<()>;
}
