//! Region domain model
//!
//! This module provides the protected region entity: an identified area with a
//! priority, an optional parent, owner and member domains, and flag values.
//! Regions do not resolve inheritance themselves; that happens at query time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use guard_flags::{Flag, FlagError, FlagRegistry, FlagValue, RegionGroup};

use crate::domain::{Domain, Subject};
use crate::error::{RegionError, RegionResult};
use crate::shape::{BlockVector, Shape};

/// Id of the implicit region covering a whole world.
pub const GLOBAL_REGION: &str = "__global__";

/// Suffix under which a flag's companion group is stored.
const GROUP_SUFFIX: &str = "-group";

/// A protected region.
///
/// # Architecture
///
/// ```text
/// Region
///   ├─ Shape (global, cuboid, polygon)
///   ├─ Priority
///   ├─ Parent (by id)
///   ├─ Owners / Members (Domain)
///   └─ Flags (value + optional region group, by flag name)
/// ```
///
/// # Examples
///
/// ```
/// use guard_flags::{Flag, FlagValue, State};
/// use guard_regions::{BlockVector, Region, Shape};
///
/// let build = Flag::state("build", None);
/// let mut region = Region::new(
///     "Spawn",
///     Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(31, 255, 31)),
/// )
/// .unwrap();
///
/// region.set_flag(&build, Some(FlagValue::State(State::Deny))).unwrap();
/// assert_eq!(region.key(), "spawn");
/// assert_eq!(region.get_flag(&build), Some(&FlagValue::State(State::Deny)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    /// Id as the user typed it; compared case-insensitively
    id: String,

    /// Covered area
    shape: Shape,

    /// Higher priorities win
    #[serde(default)]
    priority: i32,

    /// Lowercase id of the parent region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,

    /// Owners
    #[serde(default)]
    owners: Domain,

    /// Members
    #[serde(default)]
    members: Domain,

    /// Flag values by lowercase flag name
    #[serde(default)]
    flags: BTreeMap<String, FlagValue>,

    /// Explicit region groups by lowercase flag name
    #[serde(default)]
    groups: BTreeMap<String, RegionGroup>,

    /// Changed since the last save
    #[serde(skip)]
    dirty: bool,
}

impl Region {
    /// Create a region with no owners, members, flags or parent.
    ///
    /// # Errors
    ///
    /// `RegionError::InvalidId` if the id is not valid, or is the reserved
    /// global id on a non-global shape.
    pub fn new(id: impl Into<String>, shape: Shape) -> RegionResult<Self> {
        let id = id.into();
        if !Self::is_valid_id(&id) {
            return Err(RegionError::InvalidId(id));
        }
        if id.eq_ignore_ascii_case(GLOBAL_REGION) != shape.is_global() {
            return Err(RegionError::InvalidId(id));
        }

        Ok(Self {
            id,
            shape,
            priority: 0,
            parent: None,
            owners: Domain::new(),
            members: Domain::new(),
            flags: BTreeMap::new(),
            groups: BTreeMap::new(),
            dirty: true,
        })
    }

    /// Create the global region of a world.
    pub fn global() -> Self {
        Self {
            id: GLOBAL_REGION.to_string(),
            shape: Shape::Global,
            priority: 0,
            parent: None,
            owners: Domain::new(),
            members: Domain::new(),
            flags: BTreeMap::new(),
            groups: BTreeMap::new(),
            dirty: true,
        }
    }

    /// Check if an id may be used for a region.
    ///
    /// Ids are one or more of `A-Z a-z 0-9 _ , ' - + /`.
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '\'' | '-' | '+' | '/'))
    }

    /// The id as originally given.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The id folded for case-insensitive lookup.
    pub fn key(&self) -> String {
        self.id.to_lowercase()
    }

    /// Check if this is the global region.
    pub fn is_global(&self) -> bool {
        self.shape.is_global()
    }

    /// The covered area.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Check if a block is inside the region.
    pub fn contains(&self, point: BlockVector) -> bool {
        self.shape.contains(point)
    }

    /// Check if this region overlaps another shape.
    pub fn intersects(&self, shape: &Shape) -> bool {
        self.shape.intersects(shape)
    }

    /// Number of covered blocks.
    pub fn volume(&self) -> u64 {
        self.shape.volume()
    }

    /// The priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Set the priority.
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
        self.dirty = true;
    }

    /// The lowercase id of the parent, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Set the parent without a cycle check.
    ///
    /// Only the region index calls this, after walking the candidate's ancestors.
    pub(crate) fn set_parent_unchecked(&mut self, parent: Option<String>) {
        self.parent = parent.map(|p| p.to_lowercase());
        self.dirty = true;
    }

    /// The owners.
    pub fn owners(&self) -> &Domain {
        &self.owners
    }

    /// The owners, for editing.
    pub fn owners_mut(&mut self) -> &mut Domain {
        self.dirty = true;
        &mut self.owners
    }

    /// The members.
    pub fn members(&self) -> &Domain {
        &self.members
    }

    /// The members, for editing.
    pub fn members_mut(&mut self) -> &mut Domain {
        self.dirty = true;
        &mut self.members
    }

    /// Check if the subject is an owner of this region. Parents are not consulted.
    pub fn is_owner<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        self.owners.contains(subject)
    }

    /// Check if the subject is an owner or member of this region. Parents are not consulted.
    pub fn is_member<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        self.owners.contains(subject) || self.members.contains(subject)
    }

    /// Check if the subject is in the member domain only.
    pub fn is_member_only<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        self.members.contains(subject)
    }

    /// Check if the region has no owners and no members.
    pub fn has_no_members(&self) -> bool {
        self.owners.is_empty() && self.members.is_empty()
    }

    /// Set or clear a flag value.
    ///
    /// # Errors
    ///
    /// `FlagError::TypeMismatch` if the value is not of the flag's kind.
    /// The region is left unchanged in that case.
    pub fn set_flag(&mut self, flag: &Flag, value: Option<FlagValue>) -> RegionResult<()> {
        match value {
            Some(value) => {
                flag.check_value(&value)?;
                self.flags.insert(flag.key(), value);
            }
            None => {
                self.flags.remove(&flag.key());
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Get the locally stored value of a flag. Parents are not consulted.
    pub fn get_flag(&self, flag: &Flag) -> Option<&FlagValue> {
        self.flags.get(&flag.key())
    }

    /// Get the locally stored value of a flag by name.
    pub fn get_flag_by_name(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(&name.to_lowercase())
    }

    /// Set or clear the region group of a flag.
    ///
    /// Setting the flag's default group clears the explicit entry.
    ///
    /// # Errors
    ///
    /// `FlagError::NoRegionGroup` if the flag cannot be scoped to a group.
    pub fn set_group(&mut self, flag: &Flag, group: Option<RegionGroup>) -> RegionResult<()> {
        let Some(default_group) = flag.default_group() else {
            return Err(FlagError::NoRegionGroup(flag.name().to_string()).into());
        };

        match group {
            Some(group) if group != default_group => {
                self.groups.insert(flag.key(), group);
            }
            _ => {
                self.groups.remove(&flag.key());
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Get the explicitly set region group of a flag.
    pub fn get_group(&self, flag: &Flag) -> Option<RegionGroup> {
        self.groups.get(&flag.key()).copied()
    }

    /// The group a flag value on this region applies to: the explicit group,
    /// else the flag's default group, else everyone.
    pub fn effective_group(&self, flag: &Flag) -> RegionGroup {
        self.get_group(flag)
            .or_else(|| flag.default_group())
            .unwrap_or(RegionGroup::All)
    }

    /// All locally stored flag values by lowercase flag name.
    pub fn flags(&self) -> &BTreeMap<String, FlagValue> {
        &self.flags
    }

    /// All explicit region groups by lowercase flag name.
    pub fn groups(&self) -> &BTreeMap<String, RegionGroup> {
        &self.groups
    }

    /// Remove every flag value and group.
    pub fn clear_flags(&mut self) {
        self.flags.clear();
        self.groups.clear();
        self.dirty = true;
    }

    /// Copy priority, owners, members, flags and groups from another region.
    ///
    /// Used when a region is redefined with a new shape or renamed.
    /// The id, shape and parent are left alone.
    pub fn copy_from(&mut self, other: &Region) {
        self.priority = other.priority;
        self.owners = other.owners.clone();
        self.members = other.members.clone();
        self.flags = other.flags.clone();
        self.groups = other.groups.clone();
        self.dirty = true;
    }

    /// Create a copy of this region under a new id and shape.
    pub(crate) fn with_identity(&self, id: String, shape: Shape) -> RegionResult<Self> {
        let mut copy = Region::new(id, shape)?;
        copy.copy_from(self);
        copy.parent = self.parent.clone();
        Ok(copy)
    }

    /// Marshal flag values for storage.
    ///
    /// Groups are stored next to their flag under `<flag>-group`.
    /// Values of flags the registry does not know are skipped.
    pub fn marshal_flags(&self, registry: &FlagRegistry) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        for (name, value) in &self.flags {
            match registry.get(name) {
                Some(flag) => {
                    out.insert(name.clone(), flag.marshal(value));
                }
                None => warn!(region = %self.id, flag = %name, "Not saving unregistered flag"),
            }
        }
        for (name, group) in &self.groups {
            out.insert(
                format!("{}{}", name, GROUP_SUFFIX),
                Value::String(group.as_str().to_string()),
            );
        }
        out
    }

    /// Load flag values previously produced by [`Region::marshal_flags`].
    ///
    /// Replaces every current value. Returns how many values and groups were loaded.
    pub fn load_flags(&mut self, registry: &FlagRegistry, raw: &BTreeMap<String, Value>) -> usize {
        let mut values = BTreeMap::new();
        let mut groups = BTreeMap::new();

        for (name, stored) in raw {
            if registry.get(name).is_none() {
                if let Some(base) = name.strip_suffix(GROUP_SUFFIX) {
                    let scoped = registry.get(base).filter(|f| f.has_region_group());
                    let group = stored.as_str().and_then(RegionGroup::parse);
                    if let (Some(flag), Some(group)) = (scoped, group) {
                        groups.insert(flag.key(), group);
                        continue;
                    }
                }
            }
            values.insert(name.clone(), stored.clone());
        }

        self.flags = registry
            .unmarshal_all(&values)
            .into_iter()
            .map(|(flag, value)| (flag.key(), value))
            .collect();
        self.groups = groups;
        self.dirty = true;
        self.flags.len() + self.groups.len()
    }

    /// Check if the region changed since it was last marked clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the region as saved.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LocalPlayer;
    use guard_flags::{Flags, State};
    use uuid::Uuid;

    fn cuboid(id: &str) -> Region {
        Region::new(
            id,
            Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(9, 9, 9)),
        )
        .unwrap()
    }

    #[test]
    fn test_id_validation() {
        assert!(Region::is_valid_id("spawn_2"));
        assert!(Region::is_valid_id("a+b/c,d'e-f"));
        assert!(!Region::is_valid_id("has space"));
        assert!(!Region::is_valid_id(""));
        assert!(matches!(
            Region::new("bad id", Shape::Global),
            Err(RegionError::InvalidId(_))
        ));
    }

    #[test]
    fn test_global_id_is_reserved() {
        let shape = Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(1, 1, 1));
        assert!(Region::new("__GLOBAL__", shape).is_err());
        assert!(Region::new("__global__", Shape::Global).is_ok());
        assert!(Region::global().is_global());
    }

    #[test]
    fn test_set_flag_type_checked() {
        let build = Flag::state(Flags::BUILD, None);
        let mut region = cuboid("a");
        region.mark_clean();

        let err = region
            .set_flag(&build, Some(FlagValue::Boolean(false)))
            .unwrap_err();
        assert_eq!(err.error_code(), "FLAG_TYPE_MISMATCH");
        assert!(region.get_flag(&build).is_none());

        region
            .set_flag(&build, Some(FlagValue::State(State::Allow)))
            .unwrap();
        assert!(region.is_dirty());
        region.set_flag(&build, None).unwrap();
        assert!(region.get_flag(&build).is_none());
    }

    #[test]
    fn test_set_group_default_clears() {
        let entry = Flag::state(Flags::ENTRY, None).with_region_group(RegionGroup::NonMembers);
        let mut region = cuboid("a");

        region.set_group(&entry, Some(RegionGroup::All)).unwrap();
        assert_eq!(region.get_group(&entry), Some(RegionGroup::All));

        region.set_group(&entry, Some(RegionGroup::NonMembers)).unwrap();
        assert_eq!(region.get_group(&entry), None);
        assert_eq!(region.effective_group(&entry), RegionGroup::NonMembers);
    }

    #[test]
    fn test_set_group_requires_group_flag() {
        let pvp = Flag::state(Flags::PVP, None);
        let mut region = cuboid("a");
        assert!(region.set_group(&pvp, Some(RegionGroup::Members)).is_err());
        assert_eq!(region.effective_group(&pvp), RegionGroup::All);
    }

    #[test]
    fn test_copy_from_deep_copies_metadata() {
        let greeting = Flag::string(Flags::GREETING);
        let owner = Uuid::new_v4();

        let mut source = cuboid("source");
        source.set_priority(7);
        source.owners_mut().add_player(owner);
        source
            .set_flag(&greeting, Some(FlagValue::String("hi".to_string())))
            .unwrap();
        source.set_parent_unchecked(Some("town".to_string()));

        let mut target = Region::new(
            "target",
            Shape::cuboid(BlockVector::new(50, 0, 50), BlockVector::new(60, 9, 60)),
        )
        .unwrap();
        target.copy_from(&source);

        // Changing the source afterwards does not leak into the copy
        source.owners_mut().clear();
        source.set_flag(&greeting, None).unwrap();

        assert_eq!(target.priority(), 7);
        assert!(target.owners().contains_player(&owner));
        assert_eq!(
            target.get_flag(&greeting),
            Some(&FlagValue::String("hi".to_string()))
        );
        assert_eq!(target.id(), "target");
        assert_eq!(target.parent(), None);
        assert!(!target.contains(BlockVector::new(0, 0, 0)));
    }

    #[test]
    fn test_membership_is_local() {
        let alice = LocalPlayer::new(Uuid::new_v4(), "alice");
        let mut region = cuboid("a");
        region.owners_mut().add_player(alice.id);

        assert!(region.is_owner(&alice));
        assert!(region.is_member(&alice));
        assert!(!region.is_member_only(&alice));
    }

    #[test]
    fn test_marshal_and_load_flags() {
        let registry = FlagRegistry::with_defaults();
        let entry = registry.get(Flags::ENTRY).unwrap();
        let heal = registry.get(Flags::HEAL_AMOUNT).unwrap();

        let mut region = cuboid("a");
        region
            .set_flag(&entry, Some(FlagValue::State(State::Deny)))
            .unwrap();
        region.set_group(&entry, Some(RegionGroup::All)).unwrap();
        region.set_flag(&heal, Some(FlagValue::Integer(2))).unwrap();

        let stored = region.marshal_flags(&registry);
        assert_eq!(stored.get("entry"), Some(&serde_json::json!("deny")));
        assert_eq!(stored.get("entry-group"), Some(&serde_json::json!("all")));
        assert_eq!(stored.get("heal-amount"), Some(&serde_json::json!(2)));

        let mut loaded = cuboid("b");
        assert_eq!(loaded.load_flags(&registry, &stored), 3);
        assert_eq!(loaded.flags(), region.flags());
        assert_eq!(loaded.groups(), region.groups());
    }
}
