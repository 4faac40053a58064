//! Turns user input into a [`Domain`].
//!
//! Commands such as `addmember town Alice g:builders 069a79f4-...` hand their
//! tokens to a [`DomainResolver`]. Groups carry a `g:` prefix, unique ids are
//! taken as they are, and everything else is a player name that may need a
//! profile lookup, depending on the [`LocatorPolicy`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use guard_regions::Domain;

use crate::error::{TaskError, TaskResult};
use crate::profile::{ProfileError, ProfileService};
use crate::retry::{retry_if, RetryConfig};

/// Prefix that marks a token as a group.
pub const GROUP_PREFIX: &str = "g:";

/// How player names are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorPolicy {
    /// Every name must resolve to a unique id.
    #[default]
    UuidOnly,
    /// Names are stored as typed, with no lookup.
    NameOnly,
    /// Names resolve to unique ids where possible and stay names otherwise.
    UuidAndName,
}

impl LocatorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorPolicy::UuidOnly => "uuid_only",
            LocatorPolicy::NameOnly => "name_only",
            LocatorPolicy::UuidAndName => "uuid_and_name",
        }
    }

    /// Whether names go to the profile service.
    pub fn needs_lookup(&self) -> bool {
        !matches!(self, LocatorPolicy::NameOnly)
    }
}

impl fmt::Display for LocatorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified input token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainToken {
    Group(String),
    Player(Uuid),
    Name(String),
}

impl DomainToken {
    /// Classify a token. Blank input and a bare `g:` yield `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if let Some(group) = strip_prefix_ignore_case(input, GROUP_PREFIX) {
            let group = group.trim();
            return (!group.is_empty()).then(|| DomainToken::Group(group.to_string()));
        }
        match Uuid::parse_str(input) {
            Ok(id) => Some(DomainToken::Player(id)),
            Err(_) => Some(DomainToken::Name(input.to_string())),
        }
    }
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &input[prefix.len()..])
}

/// Resolves domain input through a profile service.
#[derive(Clone)]
pub struct DomainResolver {
    service: Arc<dyn ProfileService>,
    policy: LocatorPolicy,
    retry: RetryConfig,
}

impl fmt::Debug for DomainResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainResolver")
            .field("policy", &self.policy)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl DomainResolver {
    pub fn new(service: Arc<dyn ProfileService>) -> Self {
        Self {
            service,
            policy: LocatorPolicy::default(),
            retry: RetryConfig::slow(),
        }
    }

    pub fn with_policy(mut self, policy: LocatorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn policy(&self) -> LocatorPolicy {
        self.policy
    }

    /// Build a domain from input tokens.
    ///
    /// Under [`LocatorPolicy::UuidOnly`] any name without an account fails the
    /// whole call with [`TaskError::UnresolvedNames`].
    #[instrument(skip(self, tokens), fields(policy = %self.policy, count = tokens.len()))]
    pub async fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> TaskResult<Domain> {
        let mut domain = Domain::new();
        let mut names = Vec::new();

        for token in tokens.iter().filter_map(|t| DomainToken::parse(t.as_ref())) {
            match token {
                DomainToken::Group(group) => domain.add_group(group),
                DomainToken::Player(id) => domain.add_player(id),
                DomainToken::Name(name) => names.push(name),
            }
        }

        if names.is_empty() {
            return Ok(domain);
        }
        if !self.policy.needs_lookup() {
            for name in &names {
                domain.add_name(name);
            }
            return Ok(domain);
        }

        let found = self.lookup(&names).await?;
        let mut unresolved = Vec::new();
        for name in names {
            match found.get(&name.to_lowercase()) {
                Some(id) => domain.add_player(*id),
                None if self.policy == LocatorPolicy::UuidAndName => domain.add_name(&name),
                None => unresolved.push(name),
            }
        }

        if !unresolved.is_empty() {
            warn!(names = ?unresolved, "Names did not resolve to profiles");
            return Err(TaskError::UnresolvedNames(unresolved));
        }
        Ok(domain)
    }

    /// Replace the names in a domain with unique ids where profiles exist.
    ///
    /// Returns how many names were upgraded. Names without a profile stay.
    #[instrument(skip(self, domain), fields(pending = domain.names().len()))]
    pub async fn resolve_pending(&self, domain: &mut Domain) -> TaskResult<usize> {
        let names: Vec<String> = domain.names().iter().cloned().collect();
        if names.is_empty() {
            return Ok(0);
        }

        let found = self.lookup(&names).await?;
        let upgraded = names
            .iter()
            .filter(|name| {
                found
                    .get(name.as_str())
                    .is_some_and(|id| domain.resolve_name(name, *id))
            })
            .count();

        debug!(upgraded, "Upgraded names to unique ids");
        Ok(upgraded)
    }

    /// Look names up, keyed by lowercase name.
    async fn lookup(&self, names: &[String]) -> Result<HashMap<String, Uuid>, ProfileError> {
        let profiles = retry_if(
            &self.retry,
            || self.service.find_all_by_name(names),
            ProfileError::is_transient,
        )
        .await?;

        debug!(requested = names.len(), found = profiles.len(), "Profile lookup finished");
        Ok(profiles
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p.id))
            .collect())
    }
}
