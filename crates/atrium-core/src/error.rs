//! Error taxonomy for workflow and directory operations.

use atrium_storage::StoreError;
use thiserror::Error;

/// Errors returned by membership workflow and directory operations.
///
/// Validation errors (`BadRequest`, `Forbidden`, `AlreadyMember`,
/// `AlreadyRequested`) are decided before any mutation is attempted, so a
/// failed call never leaves a partially applied transition behind.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("already a member of this collaboration")]
    AlreadyMember,
    #[error("a conflicting membership request is already pending")]
    AlreadyRequested,
    #[error("collaboration not found")]
    NotFound,
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => WorkflowError::NotFound,
            other => WorkflowError::Store(other),
        }
    }
}
