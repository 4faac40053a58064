//! # Region Groups
//!
//! A region group scopes a flag value to a subset of subjects, based on the
//! subject's association with the region that carries the value.

use serde::{Deserialize, Serialize};

/// How a subject relates to one particular region.
///
/// Associations go from strongest to weakest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Association {
    /// Listed in the region's owner domain.
    Owner,
    /// Listed in the region's member domain.
    Member,
    /// Neither owner nor member.
    NonMember,
}

/// Which subjects a flag value applies to.
///
/// - **All**: everyone
/// - **Members**: owners and members
/// - **Owners**: owners only
/// - **NonMembers**: everyone who is neither owner nor member
/// - **NonOwners**: everyone who is not an owner
/// - **None**: nobody
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RegionGroup {
    /// Applies to every subject.
    All,

    /// Applies to owners and members.
    Members,

    /// Applies to owners only.
    Owners,

    /// Applies to subjects that are neither owner nor member.
    NonMembers,

    /// Applies to subjects that are not owners.
    NonOwners,

    /// Applies to no subject.
    None,
}

impl RegionGroup {
    /// Get the string representation of the group.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionGroup::All => "all",
            RegionGroup::Members => "members",
            RegionGroup::Owners => "owners",
            RegionGroup::NonMembers => "nonmembers",
            RegionGroup::NonOwners => "nonowners",
            RegionGroup::None => "none",
        }
    }

    /// Parse a group from user input.
    ///
    /// Case-insensitive; singular forms and a few spellings are accepted.
    ///
    /// # Example
    ///
    /// ```
    /// use guard_flags::RegionGroup;
    ///
    /// assert_eq!(RegionGroup::parse("owner"), Some(RegionGroup::Owners));
    /// assert_eq!(RegionGroup::parse("non_members"), Some(RegionGroup::NonMembers));
    /// assert_eq!(RegionGroup::parse("everyone"), Some(RegionGroup::All));
    /// assert_eq!(RegionGroup::parse("admins"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "everyone" | "everybody" => Some(RegionGroup::All),
            "member" | "members" => Some(RegionGroup::Members),
            "owner" | "owners" => Some(RegionGroup::Owners),
            "nonmember" | "nonmembers" | "non_member" | "non_members" | "non-member"
            | "non-members" => Some(RegionGroup::NonMembers),
            "nonowner" | "nonowners" | "non_owner" | "non_owners" | "non-owner"
            | "non-owners" => Some(RegionGroup::NonOwners),
            "none" | "nobody" | "deny" => Some(RegionGroup::None),
            _ => None,
        }
    }

    /// Get all groups.
    pub fn all() -> Vec<Self> {
        vec![
            RegionGroup::All,
            RegionGroup::Members,
            RegionGroup::Owners,
            RegionGroup::NonMembers,
            RegionGroup::NonOwners,
            RegionGroup::None,
        ]
    }

    /// Check whether a subject with the given association belongs to this group.
    ///
    /// An owner association also counts as membership.
    ///
    /// # Example
    ///
    /// ```
    /// use guard_flags::{Association, RegionGroup};
    ///
    /// assert!(RegionGroup::Owners.contains(Association::Owner));
    /// assert!(!RegionGroup::Owners.contains(Association::Member));
    /// assert!(RegionGroup::NonOwners.contains(Association::Member));
    /// ```
    pub fn contains(&self, association: Association) -> bool {
        self.matches(
            association == Association::Owner,
            association != Association::NonMember,
        )
    }

    /// Check group membership from the two raw domain facts.
    ///
    /// Unlike [`RegionGroup::contains`], ownership and membership are taken
    /// independently, so an owner missing from the member domain is a non-member.
    pub fn matches(&self, is_owner: bool, is_member: bool) -> bool {
        match self {
            RegionGroup::All => true,
            RegionGroup::None => false,
            RegionGroup::Owners => is_owner,
            RegionGroup::Members => is_member,
            RegionGroup::NonMembers => !is_member,
            RegionGroup::NonOwners => !is_owner,
        }
    }
}

impl std::fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
