//! Domain-level error taxonomy for the judge service.

use canary_state::StorageError;

/// Broad category of a [`JudgeError`], used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced identifier does not exist.
    NotFound,
    /// The caller supplied an argument that can never succeed as given.
    InvalidArgument,
    /// The service is not able to serve the request in its current setup.
    Unavailable,
    /// A collaborator (storage, execution engine) failed.
    Upstream,
}

/// Judge service errors.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("Unable to resolve canary judge '{name}'.")]
    JudgeNotFound { name: String },

    #[error("no canary judges are registered")]
    NoJudgesRegistered,

    #[error("duplicate canary judge name: {name}")]
    DuplicateJudge { name: String },

    #[error("Unable to find StageExecution '{ref_id}' in pipeline ID '{execution_id}'")]
    StageNotFound {
        execution_id: String,
        ref_id: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("judgement failed: {0}")]
    Judgement(String),

    #[error("execution launch failed: {0}")]
    ExecutionLaunch(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl JudgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JudgeError::JudgeNotFound { .. } | JudgeError::StageNotFound { .. } => {
                ErrorKind::NotFound
            }
            JudgeError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            JudgeError::NoJudgesRegistered => ErrorKind::Unavailable,
            JudgeError::DuplicateJudge { .. }
            | JudgeError::Judgement(_)
            | JudgeError::ExecutionLaunch(_) => ErrorKind::Upstream,
            JudgeError::Storage(err) if err.is_not_found() => ErrorKind::NotFound,
            JudgeError::Storage(err) if err.is_invalid_argument() => ErrorKind::InvalidArgument,
            JudgeError::Storage(_) => ErrorKind::Upstream,
        }
    }
}

/// Result type for judge service operations.
pub type Result<T> = std::result::Result<T, JudgeError>;
