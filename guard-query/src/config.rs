//! Resolver configuration.
//!
//! Controls the membership and inheritance rules applied while resolving
//! flags. Configuration is loaded from environment variables with defaults
//! matching the usual protection behaviour.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Rules for resolving effective flag values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Whether owners of a region also count as its members.
    pub owners_are_members: bool,

    /// Whether a child region hides its ancestors when both apply at a point.
    pub child_overrides_parent: bool,

    /// Maximum number of parents followed from any region.
    pub max_parent_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            owners_are_members: true,
            child_overrides_parent: false,
            max_parent_depth: 64,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GUARD_OWNERS_ARE_MEMBERS`: Owners count as members (default: true)
    /// - `GUARD_CHILD_OVERRIDES_PARENT`: Children hide applicable ancestors (default: false)
    /// - `GUARD_MAX_PARENT_DEPTH`: Parent walk limit (default: 64)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            owners_are_members: std::env::var("GUARD_OWNERS_ARE_MEMBERS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.owners_are_members),
            child_overrides_parent: std::env::var("GUARD_CHILD_OVERRIDES_PARENT")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(default.child_overrides_parent),
            max_parent_depth: std::env::var("GUARD_MAX_PARENT_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_parent_depth),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parent_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_parent_depth".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert!(config.owners_are_members);
        assert!(!config.child_overrides_parent);
        assert_eq!(config.max_parent_depth, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_depth_is_invalid() {
        let config = ResolverConfig {
            max_parent_depth: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_parent_depth"));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"owners_are_members": false}"#).unwrap();
        assert!(!config.owners_are_members);
        assert_eq!(config.max_parent_depth, 64);
    }
}
