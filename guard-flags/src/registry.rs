//! # Flag Registry
//!
//! Maps flag names to flag definitions. A registry is built once at startup,
//! before region data loads, then locked and shared as `Arc<FlagRegistry>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{FlagError, FlagResult};
use crate::flag::Flag;
use crate::value::FlagValue;

/// Maximum edit distance for "did you mean" suggestions.
const SUGGESTION_DISTANCE: usize = 2;

/// Registry of every flag known to a running server.
///
/// Names are unique case-insensitively.
///
/// # Example
///
/// ```
/// use guard_flags::{Flag, FlagRegistry, State};
///
/// let mut registry = FlagRegistry::new();
/// registry.register(Flag::state("build", None)).unwrap();
/// registry.register(Flag::state("block-break", None)).unwrap();
///
/// assert!(registry.get("BUILD").is_some());
/// assert!(registry.register(Flag::state("Build", Some(State::Allow))).is_err());
/// assert_eq!(registry.fuzzy_match("bui").unwrap().name(), "build");
/// ```
#[derive(Debug, Default)]
pub struct FlagRegistry {
    /// Flags keyed by lowercase name.
    flags: BTreeMap<String, Arc<Flag>>,
    /// Whether registration is closed.
    locked: bool,
}

impl FlagRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in flags.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for flag in crate::builtin::Flags::all() {
            // Built-in names are distinct, so this cannot conflict on an empty registry.
            if let Err(e) = registry.register(flag) {
                warn!(error = %e, "Skipping built-in flag");
            }
        }
        registry
    }

    /// Register a flag.
    ///
    /// # Errors
    ///
    /// - `FlagError::Conflict` if a flag with the same name (ignoring case) exists
    /// - `FlagError::Locked` if the registry has been locked
    pub fn register(&mut self, flag: Flag) -> FlagResult<Arc<Flag>> {
        let key = flag.key();
        if self.locked {
            return Err(FlagError::Locked(flag.name().to_string()));
        }
        if self.flags.contains_key(&key) {
            return Err(FlagError::Conflict(flag.name().to_string()));
        }

        debug!(flag = %flag.name(), kind = flag.kind().as_str(), "Registered flag");
        let flag = Arc::new(flag);
        self.flags.insert(key, flag.clone());
        Ok(flag)
    }

    /// Register several flags, stopping at the first failure.
    pub fn register_all<I>(&mut self, flags: I) -> FlagResult<Vec<Arc<Flag>>>
    where
        I: IntoIterator<Item = Flag>,
    {
        flags.into_iter().map(|flag| self.register(flag)).collect()
    }

    /// Close registration. Region data may be loaded after this point.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Check if registration is closed.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Look up a flag by exact name, ignoring case.
    pub fn get(&self, name: &str) -> Option<Arc<Flag>> {
        self.flags.get(&name.trim().to_lowercase()).cloned()
    }

    /// Look up a flag by the name a user typed.
    ///
    /// Tries, in order: an exact match ignoring case, a match ignoring dashes
    /// and underscores, a unique prefix, and a unique substring.
    ///
    /// # Errors
    ///
    /// - `FlagError::Ambiguous` with every candidate when several flags tie
    /// - `FlagError::Unknown` with close suggestions when nothing matches
    pub fn fuzzy_match(&self, name: &str) -> FlagResult<Arc<Flag>> {
        let wanted = name.trim().to_lowercase();
        if let Some(flag) = self.flags.get(&wanted) {
            return Ok(flag.clone());
        }

        let squashed = squash(&wanted);
        let stages: [&dyn Fn(&str) -> bool; 3] = [
            &|key: &str| squash(key) == squashed,
            &|key: &str| key.starts_with(&wanted),
            &|key: &str| key.contains(&wanted),
        ];

        for stage in stages {
            let candidates: Vec<&Arc<Flag>> = self
                .flags
                .iter()
                .filter(|(key, _)| stage(key.as_str()))
                .map(|(_, flag)| flag)
                .collect();

            match candidates.as_slice() {
                [] => continue,
                [only] => return Ok((*only).clone()),
                many => {
                    return Err(FlagError::Ambiguous {
                        name: name.to_string(),
                        candidates: many.iter().map(|f| f.name().to_string()).collect(),
                    })
                }
            }
        }

        let suggestions = self
            .flags
            .iter()
            .filter(|(key, _)| strsim::levenshtein(key, &wanted) <= SUGGESTION_DISTANCE)
            .map(|(_, flag)| flag.name().to_string())
            .collect();

        Err(FlagError::Unknown {
            name: name.to_string(),
            suggestions,
        })
    }

    /// Iterate over all flags, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Flag>> {
        self.flags.values()
    }

    /// Get all flags, sorted by name.
    pub fn all(&self) -> Vec<Arc<Flag>> {
        self.flags.values().cloned().collect()
    }

    /// Get the count of registered flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Turn a stored `name -> raw value` map back into typed values.
    ///
    /// Unknown flags and values that do not fit their flag are dropped with a warning.
    pub fn unmarshal_all(&self, raw: &BTreeMap<String, Value>) -> Vec<(Arc<Flag>, FlagValue)> {
        let mut values = Vec::with_capacity(raw.len());
        for (name, stored) in raw {
            let Some(flag) = self.get(name) else {
                warn!(flag = %name, "Dropping value for unregistered flag");
                continue;
            };
            match flag.unmarshal(stored) {
                Some(value) => values.push((flag, value)),
                None => warn!(flag = %name, value = %stored, "Dropping unreadable flag value"),
            }
        }
        values
    }
}

fn squash(name: &str) -> String {
    name.chars().filter(|c| *c != '-' && *c != '_').collect()
}
