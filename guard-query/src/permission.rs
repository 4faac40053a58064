//! # Region Permissions
//!
//! Decides whether an actor may run a region command. Decisions combine the
//! actor's permission nodes with the actor's relation to the region, and for
//! building, with the flag results of an [`ApplicableRegionSet`].
//!
//! Nodes follow the pattern `worldguard.region.<action>[.own|.member].<region id>`:
//! owners are checked against `.own.`, members against `.member.`, everyone
//! else against the bare node.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use guard_flags::{Flag, FlagValue};
use guard_regions::{Region, Subject};

use crate::set::ApplicableRegionSet;

/// Root of every region permission node.
pub const REGION_NODE_ROOT: &str = "worldguard.region";

/// Region commands that need a permission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RegionAction {
    /// Create a region.
    Define,
    /// Change a region's shape.
    Redefine,
    /// Delete a region.
    Remove,
    /// Show a region's details.
    Info,
    /// Set a flag.
    Flag,
    /// Change priority.
    SetPriority,
    /// Change parent.
    SetParent,
    /// Add members.
    AddMember,
    /// Remove members.
    RemoveMember,
    /// Add owners.
    AddOwner,
    /// Remove owners.
    RemoveOwner,
    /// Teleport to a region.
    Teleport,
    /// Load a region into the actor's selection.
    Select,
}

impl RegionAction {
    /// Get the node segment of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionAction::Define => "define",
            RegionAction::Redefine => "redefine",
            RegionAction::Remove => "remove",
            RegionAction::Info => "info",
            RegionAction::Flag => "flag",
            RegionAction::SetPriority => "setpriority",
            RegionAction::SetParent => "setparent",
            RegionAction::AddMember => "addmember",
            RegionAction::RemoveMember => "removemember",
            RegionAction::AddOwner => "addowner",
            RegionAction::RemoveOwner => "removeowner",
            RegionAction::Teleport => "teleport",
            RegionAction::Select => "select",
        }
    }

    /// Parse an action (case-insensitive, supports command aliases).
    ///
    /// # Example
    ///
    /// ```
    /// use guard_query::RegionAction;
    ///
    /// assert_eq!(RegionAction::parse("delete"), Some(RegionAction::Remove));
    /// assert_eq!(RegionAction::parse("tp"), Some(RegionAction::Teleport));
    /// assert_eq!(RegionAction::parse("claim"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "define" | "def" | "d" | "create" => Some(RegionAction::Define),
            "redefine" | "update" | "move" => Some(RegionAction::Redefine),
            "remove" | "delete" | "del" | "rem" => Some(RegionAction::Remove),
            "info" | "i" => Some(RegionAction::Info),
            "flag" | "f" => Some(RegionAction::Flag),
            "setpriority" | "priority" | "pri" => Some(RegionAction::SetPriority),
            "setparent" | "parent" | "par" => Some(RegionAction::SetParent),
            "addmember" | "addmem" | "am" => Some(RegionAction::AddMember),
            "removemember" | "remmember" | "removemem" | "remmem" | "rm" => {
                Some(RegionAction::RemoveMember)
            }
            "addowner" | "ao" => Some(RegionAction::AddOwner),
            "removeowner" | "remowner" | "ro" => Some(RegionAction::RemoveOwner),
            "teleport" | "tp" => Some(RegionAction::Teleport),
            "select" | "sel" | "s" => Some(RegionAction::Select),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            RegionAction::Define,
            RegionAction::Redefine,
            RegionAction::Remove,
            RegionAction::Info,
            RegionAction::Flag,
            RegionAction::SetPriority,
            RegionAction::SetParent,
            RegionAction::AddMember,
            RegionAction::RemoveMember,
            RegionAction::AddOwner,
            RegionAction::RemoveOwner,
            RegionAction::Teleport,
            RegionAction::Select,
        ]
    }

    /// Check if this action changes the region.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            RegionAction::Info | RegionAction::Teleport | RegionAction::Select
        )
    }
}

impl fmt::Display for RegionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted permission node.
///
/// # Example
///
/// ```
/// use guard_query::PermissionNode;
///
/// let node = PermissionNode::region().push("flag").push("flags").push("PvP");
/// assert_eq!(node.to_string(), "worldguard.region.flag.flags.pvp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionNode {
    segments: Vec<String>,
}

impl PermissionNode {
    /// Start a node from a root such as `worldguard.region`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![root.into()],
        }
    }

    /// Start a node under `worldguard.region`.
    pub fn region() -> Self {
        Self::new(REGION_NODE_ROOT)
    }

    /// Append a segment; segments are lowercased.
    pub fn push(mut self, segment: impl AsRef<str>) -> Self {
        self.segments.push(segment.as_ref().to_lowercase());
        self
    }

    /// The bypass node for a world.
    pub fn bypass(world: &str) -> Self {
        Self::region().push("bypass").push(world)
    }
}

impl fmt::Display for PermissionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Something that runs region commands.
pub trait Actor: Subject {
    /// Check a permission node.
    fn has_permission(&self, node: &str) -> bool;

    /// The server console passes every region permission check.
    fn is_console(&self) -> bool {
        false
    }
}

/// Permission checks for region commands.
///
/// # Example
///
/// ```
/// use guard_query::{Actor, RegionAction, RegionPermissionModel};
/// use guard_regions::{BlockVector, Region, Shape, Subject};
/// use uuid::Uuid;
///
/// struct Builder(Uuid);
///
/// impl Subject for Builder {
///     fn unique_id(&self) -> Option<Uuid> { Some(self.0) }
///     fn name(&self) -> Option<&str> { Some("builder") }
/// }
///
/// impl Actor for Builder {
///     fn has_permission(&self, node: &str) -> bool {
///         node.starts_with("worldguard.region.info.own.")
///     }
/// }
///
/// let me = Builder(Uuid::new_v4());
/// let mut home = Region::new(
///     "home",
///     Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(9, 9, 9)),
/// ).unwrap();
/// home.owners_mut().add_player(me.0);
///
/// let model = RegionPermissionModel::new(&me);
/// assert!(model.may(RegionAction::Info, &home));
/// assert!(!model.may(RegionAction::Remove, &home));
/// ```
pub struct RegionPermissionModel<'a, A: Actor + ?Sized> {
    actor: &'a A,
}

impl<'a, A: Actor + ?Sized> RegionPermissionModel<'a, A> {
    /// Create a model for one actor.
    pub fn new(actor: &'a A) -> Self {
        Self { actor }
    }

    fn has(&self, node: &PermissionNode) -> bool {
        self.actor.is_console() || self.actor.has_permission(&node.to_string())
    }

    /// Check a node pattern against the actor's relation to a region.
    ///
    /// Owners may use `.own.` or `.member.` nodes; members only `.member.`;
    /// others only the bare node.
    fn has_pattern(&self, base: PermissionNode, region: &Region) -> bool {
        if self.actor.is_console() {
            return true;
        }

        let id = region.key();
        let allowed = if region.is_owner(self.actor) {
            self.has(&base.clone().push("own").push(&id))
                || self.has(&base.push("member").push(&id))
        } else if region.is_member(self.actor) {
            self.has(&base.push("member").push(&id))
        } else {
            self.has(&base.push(&id))
        };

        debug!(region = %id, allowed, "Checked region permission");
        allowed
    }

    /// Check if the actor may run an action on a region.
    pub fn may(&self, action: RegionAction, region: &Region) -> bool {
        self.has_pattern(PermissionNode::region().push(action.as_str()), region)
    }

    /// Check if the actor may create regions.
    pub fn may_define(&self) -> bool {
        self.has(&PermissionNode::region().push(RegionAction::Define.as_str()))
    }

    /// Check if the actor may list regions, optionally only those of one owner.
    ///
    /// Listing your own regions needs `worldguard.region.list.own`; anything
    /// else needs `worldguard.region.list`.
    pub fn may_list(&self, owned_by: Option<&str>) -> bool {
        let own = match (owned_by, self.actor.name()) {
            (Some(owner), Some(name)) => owner.eq_ignore_ascii_case(name),
            _ => false,
        };
        let list = PermissionNode::region().push("list");
        (own && self.has(&list.clone().push("own"))) || self.has(&list)
    }

    /// Check if the actor may set a particular flag on a region.
    pub fn may_set_flag(&self, region: &Region, flag: &Flag) -> bool {
        self.may(RegionAction::Flag, region)
            && self.has_pattern(
                PermissionNode::region()
                    .push("flag")
                    .push("flags")
                    .push(flag.name()),
                region,
            )
    }

    /// Check if the actor may set a flag to a particular value.
    ///
    /// The value is checked as `...flag.flags.<flag>.<value>`, where the value
    /// is rendered in input syntax.
    pub fn may_set_flag_value(&self, region: &Region, flag: &Flag, value: &FlagValue) -> bool {
        self.may_set_flag(region, flag)
            && self.has_pattern(
                PermissionNode::region()
                    .push("flag")
                    .push("flags")
                    .push(flag.name())
                    .push(value.to_string()),
                region,
            )
    }

    /// Check if the actor may change a region's parent.
    ///
    /// Both the child and the new parent are checked.
    pub fn may_set_parent(&self, child: &Region, parent: Option<&Region>) -> bool {
        self.may(RegionAction::SetParent, child)
            && parent.map_or(true, |p| self.may(RegionAction::SetParent, p))
    }

    /// Check if the actor may bypass protection in a world.
    pub fn may_bypass(&self, world: &str) -> bool {
        self.has(&PermissionNode::bypass(world))
    }

    /// Check if the actor may build at a place, given the regions there.
    pub fn may_build(&self, set: &ApplicableRegionSet<'_>, world: &str) -> bool {
        self.may_bypass(world) || set.test_build(self.actor, &[])
    }
}
