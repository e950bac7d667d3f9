//! In-memory backends for the storage traits
//!
//! `MemoryStorageService` and `MemoryExecutionRepository` hold everything in
//! process. The daemon uses the execution repository as its execution store;
//! tests use both. Finished executions are evicted according to an
//! [`ExecutionRetention`] so the store stays bounded.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageError;
use crate::schema::{ExecutionStatus, ExecutionType, PipelineExecution, StageExecution};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryStorageService
// ---------------------------------------------------------------------------

type ObjectKey = (String, ObjectType, String);

/// In-memory object store. Serves every account unless restricted.
#[derive(Debug, Default)]
pub struct MemoryStorageService {
    accounts: Option<Vec<String>>,
    objects: RwLock<HashMap<ObjectKey, Vec<u8>>>,
}

impl MemoryStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only serve the given accounts.
    pub fn for_accounts(accounts: Vec<String>) -> Self {
        Self {
            accounts: Some(accounts),
            objects: RwLock::default(),
        }
    }
}

#[async_trait]
impl StorageService for MemoryStorageService {
    fn services_account(&self, account_name: &str) -> bool {
        match &self.accounts {
            Some(accounts) => accounts.iter().any(|a| a == account_name),
            None => true,
        }
    }

    async fn load_bytes(
        &self,
        account_name: &str,
        object_type: ObjectType,
        id: &str,
    ) -> StorageResult<Vec<u8>> {
        let objects = self.objects.read().await;
        objects
            .get(&(account_name.to_string(), object_type, id.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound {
                account: account_name.to_string(),
                object_type,
                id: id.to_string(),
            })
    }

    async fn store_bytes(
        &self,
        account_name: &str,
        object_type: ObjectType,
        id: &str,
        data: &[u8],
    ) -> StorageResult<()> {
        let mut objects = self.objects.write().await;
        objects.insert(
            (account_name.to_string(), object_type, id.to_string()),
            data.to_vec(),
        );
        Ok(())
    }

    async fn list_ids(
        &self,
        account_name: &str,
        object_type: ObjectType,
    ) -> StorageResult<Vec<String>> {
        let objects = self.objects.read().await;
        let mut ids: Vec<String> = objects
            .keys()
            .filter(|(account, ty, _)| account == account_name && *ty == object_type)
            .map(|(_, _, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// MemoryExecutionRepository
// ---------------------------------------------------------------------------

/// Finished executions kept by default.
pub const DEFAULT_MAX_COMPLETED: usize = 1000;

/// Age after which a finished execution is evicted by default.
pub const DEFAULT_COMPLETED_TTL_SECS: i64 = 24 * 60 * 60;

/// Bounds on the finished executions a [`MemoryExecutionRepository`] keeps.
///
/// Executions that have not finished are never evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionRetention {
    /// Oldest finished executions are evicted beyond this count.
    pub max_completed: usize,
    /// Finished executions whose end time is older than this are evicted.
    pub ttl: Option<Duration>,
}

impl ExecutionRetention {
    pub fn new(max_completed: usize, ttl: Option<Duration>) -> Self {
        Self { max_completed, ttl }
    }
}

impl Default for ExecutionRetention {
    fn default() -> Self {
        Self {
            max_completed: DEFAULT_MAX_COMPLETED,
            ttl: Some(Duration::seconds(DEFAULT_COMPLETED_TTL_SECS)),
        }
    }
}

type ExecutionKey = (ExecutionType, String);

/// In-memory execution store keyed by `(type, id)`.
#[derive(Debug, Default)]
pub struct MemoryExecutionRepository {
    retention: ExecutionRetention,
    executions: RwLock<BTreeMap<ExecutionKey, PipelineExecution>>,
}

impl MemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: ExecutionRetention) -> Self {
        Self {
            retention,
            executions: RwLock::default(),
        }
    }

    pub fn retention(&self) -> ExecutionRetention {
        self.retention
    }

    pub async fn len(&self) -> usize {
        self.executions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.executions.read().await.is_empty()
    }
}

/// When a finished execution stopped; falls back to its build time.
fn finished_at(execution: &PipelineExecution) -> Option<DateTime<Utc>> {
    execution
        .status
        .is_complete()
        .then(|| execution.end_time.unwrap_or(execution.build_time))
}

/// Drop finished executions outside `retention`. Returns how many went.
fn evict_finished(
    executions: &mut BTreeMap<ExecutionKey, PipelineExecution>,
    retention: ExecutionRetention,
    now: DateTime<Utc>,
) -> usize {
    let before = executions.len();

    if let Some(cutoff) = retention.ttl.and_then(|ttl| now.checked_sub_signed(ttl)) {
        executions.retain(|_, e| finished_at(e).map_or(true, |at| at >= cutoff));
    }

    let mut finished: Vec<(DateTime<Utc>, ExecutionKey)> = executions
        .iter()
        .filter_map(|(key, e)| finished_at(e).map(|at| (at, key.clone())))
        .collect();
    if finished.len() > retention.max_completed {
        finished.sort();
        let excess = finished.len() - retention.max_completed;
        for (_, key) in finished.into_iter().take(excess) {
            executions.remove(&key);
        }
    }

    before - executions.len()
}

fn not_found(execution_id: &str) -> StorageError {
    StorageError::ExecutionNotFound {
        execution_id: execution_id.to_string(),
    }
}

#[async_trait]
impl ExecutionRepository for MemoryExecutionRepository {
    async fn store(&self, execution: &PipelineExecution) -> StorageResult<()> {
        let mut executions = self.executions.write().await;
        executions.insert(
            (execution.execution_type, execution.id.clone()),
            execution.clone(),
        );
        let evicted = evict_finished(&mut executions, self.retention, Utc::now());
        if evicted > 0 {
            debug!(evicted, retained = executions.len(), "Evicted finished executions");
        }
        Ok(())
    }

    async fn retrieve(
        &self,
        execution_type: ExecutionType,
        execution_id: &str,
    ) -> StorageResult<PipelineExecution> {
        let executions = self.executions.read().await;
        executions
            .get(&(execution_type, execution_id.to_string()))
            .cloned()
            .ok_or_else(|| not_found(execution_id))
    }

    async fn store_stage(
        &self,
        execution_type: ExecutionType,
        execution_id: &str,
        stage: &StageExecution,
    ) -> StorageResult<()> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(&(execution_type, execution_id.to_string()))
            .ok_or_else(|| not_found(execution_id))?;
        let slot = execution
            .stages
            .iter_mut()
            .find(|s| s.id == stage.id)
            .ok_or_else(|| StorageError::StageNotFound {
                execution_id: execution_id.to_string(),
                stage_id: stage.id.clone(),
            })?;
        *slot = stage.clone();
        Ok(())
    }

    async fn update_status(
        &self,
        execution_type: ExecutionType,
        execution_id: &str,
        status: ExecutionStatus,
    ) -> StorageResult<()> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(&(execution_type, execution_id.to_string()))
            .ok_or_else(|| not_found(execution_id))?;
        if execution.start_time.is_none() && status != ExecutionStatus::NotStarted {
            execution.start_time = Some(Utc::now());
        }
        if status.is_complete() {
            execution.end_time = Some(Utc::now());
        }
        execution.status = status;
        Ok(())
    }
}
