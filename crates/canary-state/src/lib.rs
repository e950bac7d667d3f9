//! Canary-State: persistence layer for the canary judge service
//!
//! This crate owns everything the judge service reads from or writes to a
//! backing store. It knows nothing about judges; it only resolves accounts,
//! loads typed objects and records executions.
//!
//! ## Key Components
//!
//! - `AccountRepository`: resolves `(optional name, account type)` to exactly one account
//! - `StorageService`: byte-level object store addressed by `(account, object type, id)`
//! - `StorageServiceRepository`: maps an account name to the service that serves it
//! - `ExecutionRepository`: stores and retrieves pipeline executions and their stages
//!
//! Filesystem and in-memory backends are provided in `fs_storage` and `memory`.

mod account;
mod error;
pub mod fs_storage;
pub mod memory;
mod schema;
pub mod storage_traits;

pub use account::{AccountCredentials, AccountRepository, AccountType};
pub use error::StorageError;
pub use fs_storage::FsStorageService;
pub use memory::{ExecutionRetention, MemoryExecutionRepository, MemoryStorageService};
pub use schema::{ExecutionStatus, ExecutionType, PipelineExecution, StageExecution};
pub use storage_traits::{
    load_object, store_object, ExecutionRepository, ObjectType, StorageResult, StorageService,
    StorageServiceRepository,
};
