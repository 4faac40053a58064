//! Applicable region sets
//!
//! The regions that apply at one query point, sorted for resolution. A set
//! borrows from one index snapshot and is built per query.

use std::cmp::Reverse;

use guard_flags::{Flag, FlagValue, Flags, State};
use guard_regions::{QueryView, Region, RegionLookup, Subject};

use crate::calculator::{FlagValueCalculator, Membership};
use crate::config::ResolverConfig;

/// Lookup with no regions, for sets that have no snapshot behind them.
struct EmptyLookup;

impl RegionLookup for EmptyLookup {
    fn get(&self, _id: &str) -> Option<&Region> {
        None
    }
}

static EMPTY_LOOKUP: EmptyLookup = EmptyLookup;

/// The regions that apply at a point.
///
/// Regions are ordered by priority, highest first, then by lowercase id. The
/// global region is kept apart: it is not counted by [`size`](Self::size) or
/// returned by [`iter`](Self::iter), but it takes part in flag resolution at
/// its own priority, after the other regions of that priority.
///
/// # Examples
///
/// ```
/// use guard_flags::{Flag, FlagValue, State};
/// use guard_query::ApplicableRegionSet;
/// use guard_regions::{Anonymous, BlockVector, Region, RegionIndex, Shape};
///
/// let pvp = Flag::state("pvp", None);
/// let mut arena = Region::new(
///     "arena",
///     Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(9, 9, 9)),
/// ).unwrap();
/// arena.set_flag(&pvp, Some(FlagValue::State(State::Deny))).unwrap();
///
/// let index = RegionIndex::from_iter([arena]);
/// let set = ApplicableRegionSet::new(
///     index.regions_applicable_to(BlockVector::new(1, 1, 1)),
///     index.global(),
///     &index,
/// );
///
/// assert_eq!(set.size(), 1);
/// assert!(!set.test_state(&Anonymous, &pvp));
/// ```
#[derive(Clone)]
pub struct ApplicableRegionSet<'a> {
    regions: Vec<&'a Region>,
    global: Option<&'a Region>,
    lookup: &'a dyn RegionLookup,
    config: ResolverConfig,
}

impl<'a> ApplicableRegionSet<'a> {
    /// Create a set with the default resolver configuration.
    ///
    /// A global region passed in `regions` is moved to `global`, and
    /// duplicates of the same id are dropped.
    pub fn new<I>(regions: I, global: Option<&'a Region>, lookup: &'a dyn RegionLookup) -> Self
    where
        I: IntoIterator<Item = &'a Region>,
    {
        let mut global = global;
        let mut sorted: Vec<&'a Region> = Vec::new();
        for region in regions {
            if region.is_global() {
                global = global.or(Some(region));
            } else if !sorted.iter().any(|r| r.key() == region.key()) {
                sorted.push(region);
            }
        }
        sorted.sort_by_cached_key(|r| (Reverse(r.priority()), r.key()));

        Self {
            regions: sorted,
            global,
            lookup,
            config: ResolverConfig::default(),
        }
    }

    /// Create a set from a manager query.
    pub fn from_view(view: &'a QueryView) -> Self {
        Self::new(view.regions(), view.global(), view)
    }

    /// Create a set with no regions.
    pub fn empty() -> Self {
        Self {
            regions: Vec::new(),
            global: None,
            lookup: &EMPTY_LOOKUP,
            config: ResolverConfig::default(),
        }
    }

    /// Use a different resolver configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// The calculator used by this set.
    pub fn calculator(&self) -> FlagValueCalculator<'_> {
        FlagValueCalculator::new(&self.config, self.lookup)
    }

    /// Number of regions, not counting the global region.
    pub fn size(&self) -> usize {
        self.regions.len()
    }

    /// Check if no region other than the global region applies.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions in resolution order, without the global region.
    pub fn iter(&self) -> impl Iterator<Item = &'a Region> + '_ {
        self.regions.iter().copied()
    }

    /// Regions in resolution order, without the global region.
    pub fn regions(&self) -> &[&'a Region] {
        &self.regions
    }

    /// The global region, if the world has one.
    pub fn global(&self) -> Option<&'a Region> {
        self.global
    }

    /// Check if a region with this id is in the set.
    pub fn contains_id(&self, id: &str) -> bool {
        let key = id.to_lowercase();
        self.regions.iter().any(|r| r.key() == key)
            || self.global.is_some_and(|g| g.key() == key)
    }

    /// All regions including the global region, in resolution order.
    pub(crate) fn ordered(&self) -> Vec<&'a Region> {
        let mut ordered = self.regions.clone();
        if let Some(global) = self.global {
            let at = ordered
                .iter()
                .position(|r| r.priority() < global.priority())
                .unwrap_or(ordered.len());
            ordered.insert(at, global);
        }
        ordered
    }

    /// Check if the subject owns every region of the set.
    ///
    /// Only each region's own owners are checked. An empty set is owned by everyone.
    pub fn is_owner_of_all<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        self.regions.iter().all(|r| r.is_owner(subject))
    }

    /// Check if the subject is a member of every region of the set.
    ///
    /// Only each region's own domains are checked.
    pub fn is_member_of_all<S: Subject + ?Sized>(&self, subject: &S) -> bool {
        let calculator = self.calculator();
        self.regions
            .iter()
            .all(|r| calculator.is_member_of(r, subject))
    }

    /// Test a state flag: `false` only when it resolves to `Deny`.
    pub fn test_state<S: Subject + ?Sized>(&self, subject: &S, flag: &Flag) -> bool {
        let resolved = self.query_value(subject, flag);
        resolved.and_then(|v| v.as_state()) != Some(State::Deny)
    }

    /// The effective value of a flag, or its default.
    pub fn query_value<S: Subject + ?Sized>(&self, subject: &S, flag: &Flag) -> Option<FlagValue> {
        self.calculator().resolve(self, flag, subject)
    }

    /// Every value from the deciding tier.
    pub fn query_all_values<S: Subject + ?Sized>(&self, subject: &S, flag: &Flag) -> Vec<FlagValue> {
        self.calculator().resolve_all(self, flag, subject)
    }

    /// Combine several state flags with deny winning.
    pub fn query_state<S: Subject + ?Sized>(&self, subject: &S, flags: &[&Flag]) -> Option<State> {
        self.calculator().query_state(self, subject, flags)
    }

    /// Membership in the deciding tier of non-passthrough regions.
    pub fn membership<S: Subject + ?Sized>(&self, subject: &S) -> Membership {
        self.calculator().membership(self, subject)
    }

    /// Test whether the subject may build here.
    ///
    /// `build` and any extra state flags are combined first. When none of
    /// them is set anywhere, membership decides.
    pub fn test_build<S: Subject + ?Sized>(&self, subject: &S, extra_flags: &[&Flag]) -> bool {
        let build = Flag::state(Flags::BUILD, None);
        let mut flags = Vec::with_capacity(extra_flags.len() + 1);
        flags.push(&build);
        flags.extend_from_slice(extra_flags);

        match self.query_state(subject, &flags) {
            Some(state) => state == State::Allow,
            None => self.membership(subject).is_allowed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_regions::{Anonymous, BlockVector, LocalPlayer, RegionIndex, Shape};
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

    #[test]
    fn test_ordering() {
        let index = RegionIndex::from_iter([
            region("b", 1),
            region("a", 1),
            region("low", -5),
            region("high", 10),
        ]);
        let set = ApplicableRegionSet::new(index.iter(), None, &index);
        let ids: Vec<&str> = set.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["high", "a", "b", "low"]);
    }

    #[test]
    fn test_global_kept_apart() {
        let mut index = RegionIndex::from_iter([region("a", 1), region("b", -1)]);
        index.global_mut().set_priority(0);

        let set = ApplicableRegionSet::new(index.iter(), None, &index);
        assert_eq!(set.size(), 2);
        assert!(set.global().is_some());
        assert!(set.contains_id("__GLOBAL__"));

        let ordered: Vec<String> = set.ordered().iter().map(|r| r.key()).collect();
        assert_eq!(ordered, vec!["a", "__global__", "b"]);
    }

    #[test]
    fn test_empty_set_is_open() {
        let set = ApplicableRegionSet::empty();
        let build = Flag::state(Flags::BUILD, None);
        assert!(set.test_state(&Anonymous, &build));
        assert!(set.test_build(&Anonymous, &[]));
        assert!(set.is_owner_of_all(&Anonymous));
        assert_eq!(set.membership(&Anonymous), Membership::NoRegions);
    }

    #[test]
    fn test_owner_and_member_of_all() {
        let alice = LocalPlayer::new(Uuid::new_v4(), "alice");
        let mut a = region("a", 0);
        a.owners_mut().add_player(alice.id);
        let mut b = region("b", 0);
        b.members_mut().add_player(alice.id);

        let index = RegionIndex::from_iter([a, b]);
        let set = ApplicableRegionSet::new(index.iter(), None, &index);

        assert!(!set.is_owner_of_all(&alice));
        assert!(set.is_member_of_all(&alice));
    }

    #[test]
    fn test_build_falls_back_to_membership() {
        let alice = LocalPlayer::new(Uuid::new_v4(), "alice");
        let mut plot = region("plot", 0);
        plot.members_mut().add_player(alice.id);

        let index = RegionIndex::from_iter([plot]);
        let set = ApplicableRegionSet::new(index.iter(), None, &index);

        assert!(set.test_build(&alice, &[]));
        assert!(!set.test_build(&Anonymous, &[]));
    }

    #[test]
    fn test_build_flag_overrides_membership() {
        let build = Flag::state(Flags::BUILD, None);
        let mut plot = region("plot", 0);
        plot.set_flag(&build, Some(FlagValue::State(State::Allow)))
            .unwrap();

        let index = RegionIndex::from_iter([plot]);
        let set = ApplicableRegionSet::new(index.iter(), None, &index);
        assert!(set.test_build(&Anonymous, &[]));

        let block_break = Flag::state(Flags::BLOCK_BREAK, None);
        let mut locked = region("plot", 0);
        locked
            .set_flag(&build, Some(FlagValue::State(State::Allow)))
            .unwrap();
        locked
            .set_flag(&block_break, Some(FlagValue::State(State::Deny)))
            .unwrap();
        let index = RegionIndex::from_iter([locked]);
        let set = ApplicableRegionSet::new(index.iter(), None, &index);
        assert!(!set.test_build(&Anonymous, &[&block_break]));
    }

    #[test]
    fn test_passthrough_regions_skip_membership() {
        let passthrough = Flag::state(Flags::PASSTHROUGH, None);
        let mut zone = region("zone", 5);
        zone.members_mut().add_name("someone");
        zone.set_flag(&passthrough, Some(FlagValue::State(State::Allow)))
            .unwrap();

        let index = RegionIndex::from_iter([zone]);
        let set = ApplicableRegionSet::new(index.iter(), None, &index);
        assert_eq!(set.membership(&Anonymous), Membership::NoRegions);
        assert!(set.test_build(&Anonymous, &[]));
    }
}
