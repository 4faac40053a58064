//! Owner and member domains
//!
//! A domain is the set of subjects that own, or are members of, a region.
//! Players are stored by unique id where known and by name otherwise;
//! groups are stored by name and resolved through the subject itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Something that can be checked against a domain: usually a player.
///
/// Group membership is answered by the host's permission or group provider,
/// so it lives on the subject rather than in the domain.
pub trait Subject {
    /// Stable unique id, if the subject has one.
    fn unique_id(&self) -> Option<Uuid>;

    /// Display name, if the subject has one.
    fn name(&self) -> Option<&str>;

    /// Check if the subject is in the named group.
    fn in_group(&self, _group: &str) -> bool {
        false
    }
}

/// A player known to the host.
///
/// # Examples
///
/// ```
/// use guard_regions::{Domain, LocalPlayer};
/// use uuid::Uuid;
///
/// let alice = LocalPlayer::new(Uuid::new_v4(), "Alice").with_group("builders");
///
/// let mut domain = Domain::new();
/// domain.add_group("Builders");
/// assert!(domain.contains(&alice));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalPlayer {
    /// Unique id.
    pub id: Uuid,

    /// Current name.
    pub name: String,

    /// Groups the player belongs to, lowercase.
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl LocalPlayer {
    /// Create a player with no groups.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            groups: BTreeSet::new(),
        }
    }

    /// Add a group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into().to_lowercase());
        self
    }
}

impl Subject for LocalPlayer {
    fn unique_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn in_group(&self, group: &str) -> bool {
        self.groups.contains(&group.to_lowercase())
    }
}

/// A subject with no identity, such as a dispenser or the environment.
///
/// It is contained in no domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anonymous;

impl Subject for Anonymous {
    fn unique_id(&self) -> Option<Uuid> {
        None
    }

    fn name(&self) -> Option<&str> {
        None
    }
}

/// A set of players and groups.
///
/// Adding is idempotent and every bulk operation is order-independent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    /// Players by unique id.
    #[serde(default)]
    players: BTreeSet<Uuid>,

    /// Players known only by name (lowercase), pending a profile lookup.
    #[serde(default)]
    names: BTreeSet<String>,

    /// Group names (lowercase).
    #[serde(default)]
    groups: BTreeSet<String>,
}

impl Domain {
    /// Create an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player by unique id.
    pub fn add_player(&mut self, id: Uuid) {
        self.players.insert(id);
    }

    /// Add a player by name.
    pub fn add_name(&mut self, name: impl AsRef<str>) {
        self.names.insert(name.as_ref().trim().to_lowercase());
    }

    /// Add a group.
    pub fn add_group(&mut self, group: impl AsRef<str>) {
        self.groups.insert(group.as_ref().trim().to_lowercase());
    }

    /// Remove a player by unique id.
    pub fn remove_player(&mut self, id: &Uuid) -> bool {
        self.players.remove(id)
    }

    /// Remove a player by name.
    pub fn remove_name(&mut self, name: &str) -> bool {
        self.names.remove(&name.trim().to_lowercase())
    }

    /// Remove a group.
    pub fn remove_group(&mut self, group: &str) -> bool {
        self.groups.remove(&group.trim().to_lowercase())
    }

    /// Add every entry of another domain.
    pub fn add_all(&mut self, other: &Domain) {
        self.players.extend(other.players.iter().copied());
        self.names.extend(other.names.iter().cloned());
        self.groups.extend(other.groups.iter().cloned());
    }

    /// Remove every entry of another domain.
    pub fn remove_all(&mut self, other: &Domain) {
        self.players.retain(|p| !other.players.contains(p));
        self.names.retain(|n| !other.names.contains(n));
        self.groups.retain(|g| !other.groups.contains(g));
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.players.clear();
        self.names.clear();
        self.groups.clear();
    }

    /// Check if a subject is in this domain, directly or through a group.
    ///
    /// Unique ids are checked first, then names (ignoring case), then groups.
    pub fn contains<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        if let Some(id) = subject.unique_id() {
            if self.players.contains(&id) {
                return true;
            }
        }
        if let Some(name) = subject.name() {
            if self.names.contains(&name.to_lowercase()) {
                return true;
            }
        }
        self.groups.iter().any(|g| subject.in_group(g))
    }

    /// Check for a player by unique id.
    pub fn contains_player(&self, id: &Uuid) -> bool {
        self.players.contains(id)
    }

    /// Check for a player by name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }

    /// Check for a group.
    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.contains(&group.trim().to_lowercase())
    }

    /// Players by unique id.
    pub fn players(&self) -> &BTreeSet<Uuid> {
        &self.players
    }

    /// Players known only by name.
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Group names.
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Total number of entries.
    pub fn size(&self) -> usize {
        self.players.len() + self.names.len() + self.groups.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Replace a name entry with the unique id it resolved to.
    ///
    /// Returns `true` if the name was present.
    pub fn resolve_name(&mut self, name: &str, id: Uuid) -> bool {
        let removed = self.remove_name(name);
        if removed {
            self.players.insert(id);
        }
        removed
    }

    /// Render the domain the way users type it: names, ids, then `g:group`.
    pub fn to_user_string(&self) -> String {
        self.names
            .iter()
            .cloned()
            .chain(self.players.iter().map(Uuid::to_string))
            .chain(self.groups.iter().map(|g| format!("g:{}", g)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
