//! Error types for the admission engine.
//!

use thiserror::Error;

use crate::commissioner::CommissionerError;
use crate::config::ConfigurationError;
use crate::sync::LockError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskerError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Capacity error: {0}")]
    CapacityError(String),
    #[error("Subsystem error: {0}")]
    SubsystemError(String),
    #[error("Timeout error: {0}")]
    TimeoutError(String),
    #[error("Concurrent access error: {0}")]
    ConcurrentAccessError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl TaskerError {
    /// Transient errors are retried on a later driver pass instead of failing a task
    pub fn is_transient(&self) -> bool {
        matches!(self, TaskerError::ConcurrentAccessError(_))
    }
}

impl From<serde_json::Error> for TaskerError {
    fn from(error: serde_json::Error) -> Self {
        TaskerError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<LockError> for TaskerError {
    fn from(error: LockError) -> Self {
        match error {
            LockError::WouldBlock { .. } => TaskerError::ConcurrentAccessError(error.to_string()),
            LockError::TimedOut { .. } => TaskerError::TimeoutError(error.to_string()),
        }
    }
}

impl From<CommissionerError> for TaskerError {
    fn from(error: CommissionerError) -> Self {
        TaskerError::SubsystemError(error.to_string())
    }
}

impl From<ConfigurationError> for TaskerError {
    fn from(error: ConfigurationError) -> Self {
        TaskerError::ConfigurationError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TaskerError>;
