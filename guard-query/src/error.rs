//! Error types for flag queries

use thiserror::Error;

/// Query error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A flag was queried by a name the registry does not know.
    ///
    /// This is a programming error in the caller, not bad user input.
    #[error("Flag '{0}' is not registered")]
    UnregisteredFlag(String),
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Check if this error was caused by user input.
    pub fn is_user_error(&self) -> bool {
        false
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::UnregisteredFlag(_) => "UNREGISTERED_FLAG",
        }
    }
}
