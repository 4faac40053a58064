//! Player profile lookups.
//!
//! Region commands accept player names, but domains are best stored by unique
//! id. A [`ProfileService`] maps one to the other.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use uuid::Uuid;

/// Longest name a player account can have.
pub const MAX_NAME_LENGTH: usize = 16;

/// A player account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
}

impl Profile {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Profile lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Profile service unavailable: {0}")]
    Unavailable(String),

    #[error("Profile service rate limit reached")]
    RateLimited,

    #[error("Invalid player name: {0}")]
    InvalidName(String),
}

impl ProfileError {
    /// Check if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProfileError::Unavailable(_) | ProfileError::RateLimited)
    }
}

/// Check that a name could belong to a player account.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Looks up player profiles.
#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Find the profiles for a batch of names.
    ///
    /// Names without an account are left out of the result.
    async fn find_all_by_name(&self, names: &[String]) -> Result<Vec<Profile>, ProfileError>;

    /// Find a profile by unique id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileError>;
}

/// Profile service backed by a map, for servers without an account backend.
#[derive(Debug, Default)]
pub struct MemoryProfileService {
    by_name: RwLock<HashMap<String, Profile>>,
}

impl MemoryProfileService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a profile.
    pub fn insert(&self, profile: Profile) {
        self.by_name
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.name.to_lowercase(), profile);
    }

    pub fn len(&self) -> usize {
        self.by_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Profile> for MemoryProfileService {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let service = Self::new();
        for profile in iter {
            service.insert(profile);
        }
        service
    }
}

#[async_trait]
impl ProfileService for MemoryProfileService {
    async fn find_all_by_name(&self, names: &[String]) -> Result<Vec<Profile>, ProfileError> {
        if let Some(bad) = names.iter().find(|n| !is_valid_name(n)) {
            return Err(ProfileError::InvalidName(bad.clone()));
        }
        let map = self.by_name.read().unwrap_or_else(PoisonError::into_inner);
        Ok(names
            .iter()
            .filter_map(|n| map.get(&n.to_lowercase()).cloned())
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, ProfileError> {
        let map = self.by_name.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.values().find(|p| p.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("Notch"));
        assert!(is_valid_name("jeb_"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("a_name_that_is_too_long"));
    }

    #[test]
    fn test_transient_errors() {
        assert!(ProfileError::RateLimited.is_transient());
        assert!(ProfileError::Unavailable("503".to_string()).is_transient());
        assert!(!ProfileError::InvalidName("?".to_string()).is_transient());
    }

    #[tokio::test]
    async fn test_memory_service_lookup() {
        let alice = Profile::new(Uuid::new_v4(), "Alice");
        let service = MemoryProfileService::from_iter([alice.clone()]);

        let found = service
            .find_all_by_name(&["alice".to_string(), "bob".to_string()])
            .await
            .unwrap();
        assert_eq!(found, vec![alice.clone()]);

        assert_eq!(service.find_by_id(alice.id).await.unwrap(), Some(alice));
        assert_eq!(service.find_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_service_rejects_bad_names() {
        let service = MemoryProfileService::new();
        let err = service
            .find_all_by_name(&["not valid".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ProfileError::InvalidName("not valid".to_string()));
    }
}
