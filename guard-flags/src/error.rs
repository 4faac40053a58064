//! Error types for flag operations
//!
//! This module defines the errors raised while parsing flag input,
//! registering flags, and looking flags up by name.

use thiserror::Error;

/// User input could not be parsed into a flag's value type.
///
/// The message is meant to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvalidFlagFormat {
    /// User-facing explanation of what was wrong with the input.
    pub message: String,
}

impl InvalidFlagFormat {
    /// Create a new format error with a user-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Flag error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// Input could not be parsed into the flag's value type
    #[error("Invalid flag format: {0}")]
    InvalidFormat(#[from] InvalidFlagFormat),

    /// A flag with the same (case-insensitive) name is already registered
    #[error("A flag named '{0}' is already registered")]
    Conflict(String),

    /// The registry no longer accepts registrations
    #[error("The flag registry is locked; '{0}' cannot be registered")]
    Locked(String),

    /// More than one flag matches the given name
    #[error("Flag name '{name}' is ambiguous: {}", candidates.join(", "))]
    Ambiguous {
        /// The name that was looked up.
        name: String,
        /// Every flag name that matched.
        candidates: Vec<String>,
    },

    /// No flag matches the given name
    #[error("Unknown flag '{name}'")]
    Unknown {
        /// The name that was looked up.
        name: String,
        /// Close matches offered to the user.
        suggestions: Vec<String>,
    },

    /// A value of the wrong kind was supplied for a flag
    #[error("Flag '{flag}' expects a {expected} value")]
    TypeMismatch {
        /// Flag name.
        flag: String,
        /// Human readable name of the expected kind.
        expected: &'static str,
    },

    /// The flag cannot be scoped to a region group
    #[error("Flag '{0}' does not have a region group")]
    NoRegionGroup(String),
}

/// Result type for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

impl FlagError {
    /// Check if this error was caused by user input rather than a programming mistake.
    ///
    /// User errors are reported back to whoever typed the command;
    /// the rest indicate a misbehaving plugin or host.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            FlagError::InvalidFormat(_)
                | FlagError::Ambiguous { .. }
                | FlagError::Unknown { .. }
                | FlagError::NoRegionGroup(_)
        )
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            FlagError::InvalidFormat(_) => "INVALID_FLAG_FORMAT",
            FlagError::Conflict(_) => "FLAG_CONFLICT",
            FlagError::Locked(_) => "REGISTRY_LOCKED",
            FlagError::Ambiguous { .. } => "AMBIGUOUS_FLAG_NAME",
            FlagError::Unknown { .. } => "UNKNOWN_FLAG_NAME",
            FlagError::TypeMismatch { .. } => "FLAG_TYPE_MISMATCH",
            FlagError::NoRegionGroup(_) => "FLAG_HAS_NO_GROUP",
        }
    }
}
