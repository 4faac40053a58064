//! Flag value calculator
//!
//! Computes the effective value of a flag for a subject, first along one
//! region's parent chain and then across every region of an applicable set.
//!
//! # Resolution
//!
//! ```text
//! for each region in the set (priority desc, id asc; global last in its tier)
//!     walk region → parent → grandparent ...
//!         first level with a value whose region group contains the subject wins
//!
//! group resolved values into priority tiers, highest first
//!     first tier with any value decides:
//!         state flags: Deny if any Deny, else Allow
//!         other flags: value of the region with the smallest id
//! no tier decides → flag default
//! ```
//!
//! Everything here is pure computation over resident data.

use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use guard_flags::{Association, Flag, FlagRegistry, FlagValue, Flags, State};
use guard_regions::{Region, RegionLookup, Subject};

use crate::config::ResolverConfig;
use crate::error::{QueryError, QueryResult};
use crate::set::ApplicableRegionSet;

/// Outcome of the membership check used when no build flag decides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    /// No region (other than passthrough regions) applies.
    NoRegions,

    /// The subject is a member of every region in the deciding tier.
    Success,

    /// The subject is not a member of at least one region in the deciding tier.
    Fail,
}

impl Membership {
    /// Check if the subject may act on membership alone.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Membership::Fail)
    }
}

/// Resolves effective flag values.
#[derive(Clone, Copy)]
pub struct FlagValueCalculator<'a> {
    config: &'a ResolverConfig,
    lookup: &'a dyn RegionLookup,
}

impl<'a> FlagValueCalculator<'a> {
    /// Create a calculator that follows parents through `lookup`.
    pub fn new(config: &'a ResolverConfig, lookup: &'a dyn RegionLookup) -> Self {
        Self { config, lookup }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ResolverConfig {
        self.config
    }

    /// How a subject relates to one region. Parents are not consulted.
    pub fn association<S: Subject + ?Sized>(&self, region: &Region, subject: &S) -> Association {
        if region.owners().contains(subject) {
            Association::Owner
        } else if region.members().contains(subject) {
            Association::Member
        } else {
            Association::NonMember
        }
    }

    /// Check if a subject counts as a member of one region. Parents are not consulted.
    pub fn is_member_of<S: Subject + ?Sized>(&self, region: &Region, subject: &S) -> bool {
        region.members().contains(subject)
            || (self.config.owners_are_members && region.owners().contains(subject))
    }

    /// Check if a value stored on `region` for `flag` applies to `subject`.
    fn applies_to<S: Subject + ?Sized>(&self, region: &Region, flag: &Flag, subject: &S) -> bool {
        let group = region.effective_group(flag);
        let is_owner = region.owners().contains(subject);
        let is_member = self.is_member_of(region, subject);
        group.matches(is_owner, is_member)
    }

    /// A region followed by its parents, nearest first.
    ///
    /// Bounded by `max_parent_depth`, and stops at a missing parent or a
    /// region already visited.
    pub fn chain<'r>(&'r self, region: &'r Region) -> Vec<&'r Region> {
        let mut chain: Vec<&'r Region> = vec![region];
        let mut current = region;

        while chain.len() <= self.config.max_parent_depth {
            let Some(parent) = self.lookup.parent_of(current) else {
                break;
            };
            if chain.iter().any(|seen| seen.key() == parent.key()) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The value of a flag for a subject at one region, following parents.
    ///
    /// At each level the stored value counts only if the subject's
    /// association with that level's region is in the level's group. Returns
    /// `None` when no level applies; the flag default is not used here.
    pub fn effective_value<S: Subject + ?Sized>(
        &self,
        region: &Region,
        flag: &Flag,
        subject: &S,
    ) -> Option<FlagValue> {
        for level in self.chain(region) {
            let Some(value) = level.get_flag(flag) else {
                continue;
            };
            if self.applies_to(level, flag, subject) {
                trace!(
                    flag = %flag.name(),
                    region = %region.id(),
                    level = %level.id(),
                    "Resolved flag along parent chain"
                );
                return Some(value.clone());
            }
        }
        None
    }

    /// The regions of a set that take part in resolution, in tier order.
    ///
    /// With `child_overrides_parent`, a region that is an ancestor of another
    /// region in the set is left out; its values are reached through the child.
    fn participants<'s>(&self, set: &'s ApplicableRegionSet<'_>) -> Vec<&'s Region> {
        let ordered = set.ordered();
        if !self.config.child_overrides_parent {
            return ordered;
        }

        let hidden: Vec<String> = ordered
            .iter()
            .flat_map(|r| self.chain(r).into_iter().skip(1).map(Region::key))
            .collect();
        ordered
            .into_iter()
            .filter(|r| !hidden.contains(&r.key()))
            .collect()
    }

    /// Values from the highest priority tier that resolves the flag at all.
    fn winning_tier<S: Subject + ?Sized>(
        &self,
        set: &ApplicableRegionSet<'_>,
        flag: &Flag,
        subject: &S,
    ) -> Vec<FlagValue> {
        let participants = self.participants(set);
        let mut i = 0;

        while i < participants.len() {
            let priority = participants[i].priority();
            let mut values = Vec::new();

            while i < participants.len() && participants[i].priority() == priority {
                if let Some(value) = self.effective_value(participants[i], flag, subject) {
                    values.push(value);
                }
                i += 1;
            }

            if !values.is_empty() {
                trace!(flag = %flag.name(), priority, values = values.len(), "Tier decided flag");
                return values;
            }
        }
        Vec::new()
    }

    /// The effective value of a flag across a whole set.
    ///
    /// Falls back to the flag default when no tier resolves a value.
    pub fn resolve<S: Subject + ?Sized>(
        &self,
        set: &ApplicableRegionSet<'_>,
        flag: &Flag,
        subject: &S,
    ) -> Option<FlagValue> {
        let values = self.winning_tier(set, flag, subject);
        if values.is_empty() {
            return flag.default_value().cloned();
        }

        if flag.is_permission_like() {
            State::combine_all(values.iter().filter_map(FlagValue::as_state)).map(FlagValue::State)
        } else {
            values.into_iter().next()
        }
    }

    /// Every value of the deciding tier, in set order.
    ///
    /// Falls back to the flag default when no tier resolves a value, or an
    /// empty list when there is no default either.
    pub fn resolve_all<S: Subject + ?Sized>(
        &self,
        set: &ApplicableRegionSet<'_>,
        flag: &Flag,
        subject: &S,
    ) -> Vec<FlagValue> {
        let values = self.winning_tier(set, flag, subject);
        if values.is_empty() {
            return flag.default_value().cloned().into_iter().collect();
        }
        values
    }

    /// Combine several state flags: `Deny` if any resolves to deny,
    /// `Allow` if any resolves to allow, else `None`.
    pub fn query_state<S: Subject + ?Sized>(
        &self,
        set: &ApplicableRegionSet<'_>,
        subject: &S,
        flags: &[&Flag],
    ) -> Option<State> {
        State::combine_all(
            flags
                .iter()
                .filter_map(|flag| self.resolve(set, flag, subject))
                .filter_map(|value| value.as_state()),
        )
    }

    /// Check membership in the highest priority tier of non-passthrough regions.
    ///
    /// Membership counts through parents. Regions that are ancestors of a
    /// region already checked are skipped.
    pub fn membership<S: Subject + ?Sized>(
        &self,
        set: &ApplicableRegionSet<'_>,
        subject: &S,
    ) -> Membership {
        let mut deciding_priority = None;
        let mut checked_ancestors: Vec<String> = Vec::new();
        let mut found = false;

        for region in set.iter() {
            if matches!(deciding_priority, Some(p) if region.priority() < p) {
                break;
            }
            if self.is_passthrough(region) || checked_ancestors.contains(&region.key()) {
                continue;
            }

            deciding_priority = Some(region.priority());
            let chain = self.chain(region);
            checked_ancestors.extend(chain.iter().skip(1).map(|r| r.key()));

            if !chain.iter().any(|level| self.is_member_of(level, subject)) {
                trace!(region = %region.id(), "Subject is not a member");
                return Membership::Fail;
            }
            found = true;
        }

        if found {
            Membership::Success
        } else {
            Membership::NoRegions
        }
    }

    /// Resolve a flag by name.
    ///
    /// # Errors
    ///
    /// `QueryError::UnregisteredFlag` if the registry does not know the name.
    /// Callers should treat this as a bug, not as bad input.
    pub fn resolve_named<S: Subject + ?Sized>(
        &self,
        registry: &FlagRegistry,
        set: &ApplicableRegionSet<'_>,
        name: &str,
        subject: &S,
    ) -> QueryResult<Option<FlagValue>> {
        match registry.get(name) {
            Some(flag) => Ok(self.resolve(set, &flag, subject)),
            None => {
                error!(flag = %name, "Queried a flag that was never registered");
                Err(QueryError::UnregisteredFlag(name.to_string()))
            }
        }
    }

    /// Check if a region, or the nearest ancestor that sets it, allows passthrough.
    fn is_passthrough(&self, region: &Region) -> bool {
        self.chain(region)
            .into_iter()
            .find_map(|level| level.get_flag_by_name(Flags::PASSTHROUGH))
            .and_then(FlagValue::as_state)
            == Some(State::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_flags::RegionGroup;
    use guard_regions::{BlockVector, LocalPlayer, RegionIndex, Shape};
    use uuid::Uuid;

    fn region(id: &str, priority: i32) -> Region {
        let mut region = Region::new(
            id,
            Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(9, 9, 9)),
        )
        .unwrap();
        region.set_priority(priority);
        region
    }

    fn build() -> Flag {
        Flag::state(Flags::BUILD, None)
    }

    fn deny() -> Option<FlagValue> {
        Some(FlagValue::State(State::Deny))
    }

    fn allow() -> Option<FlagValue> {
        Some(FlagValue::State(State::Allow))
    }

    #[test]
    fn test_unset_without_parent_is_none() {
        let index = RegionIndex::from_iter([region("a", 0)]);
        let config = ResolverConfig::default();
        let calc = FlagValueCalculator::new(&config, &index);
        let anyone = LocalPlayer::new(Uuid::new_v4(), "anyone");

        assert_eq!(calc.effective_value(index.get("a").unwrap(), &build(), &anyone), None);
    }

    #[test]
    fn test_group_scoped_value_falls_through_to_parent() {
        let entry = Flag::state(Flags::ENTRY, None).with_region_group(RegionGroup::All);
        let owner = LocalPlayer::new(Uuid::new_v4(), "owner");
        let guest = LocalPlayer::new(Uuid::new_v4(), "guest");

        let mut parent = region("parent", 0);
        parent.set_flag(&entry, allow()).unwrap();
        let mut child = region("child", 0);
        child.owners_mut().add_player(owner.id);
        child.set_flag(&entry, deny()).unwrap();
        child.set_group(&entry, Some(RegionGroup::Owners)).unwrap();

        let mut index = RegionIndex::from_iter([parent, child]);
        index.set_parent("child", Some("parent")).unwrap();

        let config = ResolverConfig::default();
        let calc = FlagValueCalculator::new(&config, &index);
        let child = index.get("child").unwrap();

        assert_eq!(calc.effective_value(child, &entry, &owner), deny());
        assert_eq!(calc.effective_value(child, &entry, &guest), allow());
    }

    #[test]
    fn test_parent_group_checked_against_parent() {
        let entry = Flag::state(Flags::ENTRY, None).with_region_group(RegionGroup::NonMembers);
        let resident = LocalPlayer::new(Uuid::new_v4(), "resident");

        // Member of the child only; the parent's non-member deny still reaches them.
        let mut parent = region("parent", 0);
        parent.set_flag(&entry, deny()).unwrap();
        let mut child = region("child", 0);
        child.members_mut().add_player(resident.id);

        let mut index = RegionIndex::from_iter([parent, child]);
        index.set_parent("child", Some("parent")).unwrap();

        let config = ResolverConfig::default();
        let calc = FlagValueCalculator::new(&config, &index);
        assert_eq!(
            calc.effective_value(index.get("child").unwrap(), &entry, &resident),
            deny()
        );
    }

    #[test]
    fn test_owners_are_members_setting() {
        let teleport = Flag::location("teleport").with_region_group(RegionGroup::Members);
        let owner = LocalPlayer::new(Uuid::new_v4(), "owner");

        let mut home = region("home", 0);
        home.owners_mut().add_player(owner.id);
        home.set_flag(
            &teleport,
            Some(FlagValue::Location(guard_flags::Location::new(1.0, 2.0, 3.0))),
        )
        .unwrap();
        let index = RegionIndex::from_iter([home]);
        let home = index.get("home").unwrap();

        let config = ResolverConfig::default();
        assert!(FlagValueCalculator::new(&config, &index)
            .effective_value(home, &teleport, &owner)
            .is_some());

        let strict = ResolverConfig {
            owners_are_members: false,
            ..Default::default()
        };
        assert!(FlagValueCalculator::new(&strict, &index)
            .effective_value(home, &teleport, &owner)
            .is_none());
    }

    #[test]
    fn test_chain_respects_depth_limit() {
        let mut index = RegionIndex::from_iter((0..5).map(|n| region(&format!("r{}", n), 0)));
        for n in 0..4 {
            index
                .set_parent(&format!("r{}", n), Some(&format!("r{}", n + 1)))
                .unwrap();
        }

        let config = ResolverConfig {
            max_parent_depth: 2,
            ..Default::default()
        };
        let calc = FlagValueCalculator::new(&config, &index);
        let chain: Vec<String> = calc.chain(index.get("r0").unwrap()).iter().map(|r| r.key()).collect();
        assert_eq!(chain, vec!["r0", "r1", "r2"]);
    }

    #[test]
    fn test_association() {
        let owner = LocalPlayer::new(Uuid::new_v4(), "owner");
        let member = LocalPlayer::new(Uuid::new_v4(), "member");
        let mut plot = region("plot", 0);
        plot.owners_mut().add_player(owner.id);
        plot.members_mut().add_player(member.id);

        let index = RegionIndex::new();
        let config = ResolverConfig::default();
        let calc = FlagValueCalculator::new(&config, &index);

        assert_eq!(calc.association(&plot, &owner), Association::Owner);
        assert_eq!(calc.association(&plot, &member), Association::Member);
        assert_eq!(
            calc.association(&plot, &guard_regions::Anonymous),
            Association::NonMember
        );
    }
}
