//! Error types for region operations
//!
//! Region errors are raised before any mutation happens, so a failed
//! operation leaves the region graph unchanged.

use guard_flags::FlagError;
use thiserror::Error;

/// Region error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    /// The parent assignment would create a cycle
    #[error("Setting '{parent}' as the parent of '{child}' would create circular inheritance")]
    CircularInheritance {
        /// The region whose parent was being set.
        child: String,
        /// The rejected parent.
        parent: String,
    },

    /// No region with this id exists
    #[error("Region not found: {0}")]
    NotFound(String),

    /// A region with this id already exists
    #[error("A region named '{0}' already exists")]
    AlreadyExists(String),

    /// The id contains characters that are not allowed
    #[error("Invalid region id: '{0}'")]
    InvalidId(String),

    /// The region has children and the removal strategy keeps them
    #[error("Region '{id}' still has children: {}", children.join(", "))]
    HasChildren {
        /// The region that was being removed.
        id: String,
        /// Its direct children.
        children: Vec<String>,
    },

    /// The global region cannot be used this way
    #[error("The global region cannot be {0}")]
    GlobalRegion(&'static str),

    /// Flag error
    #[error(transparent)]
    Flag(#[from] FlagError),
}

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

impl RegionError {
    /// Check if this error was caused by user input.
    pub fn is_user_error(&self) -> bool {
        match self {
            RegionError::Flag(e) => e.is_user_error(),
            _ => true,
        }
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            RegionError::CircularInheritance { .. } => "CIRCULAR_INHERITANCE",
            RegionError::NotFound(_) => "REGION_NOT_FOUND",
            RegionError::AlreadyExists(_) => "REGION_EXISTS",
            RegionError::InvalidId(_) => "INVALID_REGION_ID",
            RegionError::HasChildren { .. } => "REGION_HAS_CHILDREN",
            RegionError::GlobalRegion(_) => "GLOBAL_REGION",
            RegionError::Flag(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_message() {
        let err = RegionError::CircularInheritance {
            child: "spawn".to_string(),
            parent: "town".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Setting 'town' as the parent of 'spawn' would create circular inheritance"
        );
        assert_eq!(err.error_code(), "CIRCULAR_INHERITANCE");
    }

    #[test]
    fn test_flag_errors_pass_through() {
        let err = RegionError::from(FlagError::Conflict("build".to_string()));
        assert_eq!(err.error_code(), "FLAG_CONFLICT");
        assert!(!err.is_user_error());
    }
}
