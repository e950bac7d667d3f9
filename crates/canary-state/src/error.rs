//! Error types for canary-state

use thiserror::Error;

use crate::account::AccountType;
use crate::storage_traits::ObjectType;

/// Errors raised by account resolution, object storage and execution storage.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No account is registered under the requested name
    #[error("Unable to resolve account {name}.")]
    AccountNotFound { name: String },

    /// The named account exists but does not support the requested type
    #[error("Account {name} does not support type {account_type}.")]
    AccountTypeMismatch {
        name: String,
        account_type: AccountType,
    },

    /// No name given and no account supports the requested type
    #[error("Unable to resolve account of type {account_type}.")]
    NoAccountOfType { account_type: AccountType },

    /// No name given and several accounts support the requested type
    #[error("Ambiguous account of type {account_type}: candidates are {}.", candidates.join(", "))]
    AmbiguousAccount {
        account_type: AccountType,
        candidates: Vec<String>,
    },

    /// Two accounts were registered with the same name
    #[error("Duplicate account name: {name}")]
    DuplicateAccount { name: String },

    /// No storage service serves the account
    #[error("No storage service was configured for account {account}.")]
    StorageServiceNotFound { account: String },

    /// Object missing from the store
    #[error("No such object of type {object_type} with id {id} in account {account}.")]
    ObjectNotFound {
        account: String,
        object_type: ObjectType,
        id: String,
    },

    /// Object ids must not escape the storage layout
    #[error("Invalid object id: {id}")]
    InvalidObjectId { id: String },

    /// Execution missing from the execution store
    #[error("Unable to locate execution {execution_id}.")]
    ExecutionNotFound { execution_id: String },

    /// Stage missing from a stored execution
    #[error("Unable to locate stage {stage_id} in execution {execution_id}.")]
    StageNotFound {
        execution_id: String,
        stage_id: String,
    },

    /// Stored bytes could not be decoded into the requested type
    #[error("Failed to decode {object_type} {id}: {reason}")]
    Deserialization {
        object_type: ObjectType,
        id: String,
        reason: String,
    },

    /// Value could not be encoded for storage
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether a referenced identifier does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::AccountNotFound { .. }
                | StorageError::NoAccountOfType { .. }
                | StorageError::StorageServiceNotFound { .. }
                | StorageError::ObjectNotFound { .. }
                | StorageError::ExecutionNotFound { .. }
                | StorageError::StageNotFound { .. }
        )
    }

    /// Whether the caller supplied an argument that can never succeed as given.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            StorageError::AccountTypeMismatch { .. }
                | StorageError::AmbiguousAccount { .. }
                | StorageError::InvalidObjectId { .. }
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
