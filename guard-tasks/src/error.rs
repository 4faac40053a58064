//! Error types for background tasks

use std::time::Duration;
use thiserror::Error;

use crate::profile::ProfileError;

/// Task error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The task was cancelled before it finished
    #[error("Task was cancelled")]
    Cancelled,

    /// The task ran out of time
    #[error("Task timed out after {0:?}")]
    TimedOut(Duration),

    /// The task failed
    #[error("Task failed: {0}")]
    Failed(String),

    /// Some player names could not be turned into unique ids
    #[error("Unable to resolve the names: {}", .0.join(", "))]
    UnresolvedNames(Vec<String>),

    /// The profile service failed
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Result type for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    /// Check if this error was caused by user input.
    pub fn is_user_error(&self) -> bool {
        match self {
            TaskError::UnresolvedNames(_) => true,
            TaskError::Profile(e) => matches!(e, ProfileError::InvalidName(_)),
            _ => false,
        }
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            TaskError::Cancelled => "TASK_CANCELLED",
            TaskError::TimedOut(_) => "TASK_TIMED_OUT",
            TaskError::Failed(_) => "TASK_FAILED",
            TaskError::UnresolvedNames(_) => "UNRESOLVED_NAMES",
            TaskError::Profile(_) => "PROFILE_LOOKUP_FAILED",
        }
    }
}
