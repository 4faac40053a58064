//! End-to-end tests for flag resolution.
//!
//! These tests build small worlds in a region manager, query a point and check
//! the effective flag values seen by different subjects.
//!
//! Scenarios:
//! 1. Defaults when nothing is set
//! 2. Region-group scoping and parent fall-through
//! 3. Priority tiers and deny-overrides-allow
//! 4. Parent chains and cycle rejection
//! 5. Build checks and membership
//! 6. Value round trips through input syntax and storage

use guard_flags::{Flag, FlagRegistry, FlagValue, Flags, Location, RegionGroup, State};
use guard_query::{ApplicableRegionSet, Membership, QueryError, ResolverConfig};
use guard_regions::{
    Anonymous, BlockVector, Domain, LocalPlayer, Region, RegionError, RegionManager, Shape,
};
use std::sync::Arc;
use uuid::Uuid;

/// Test fixture providing a registry, a manager and a few players.
struct TestFixture {
    /// Flag registry with the built-in flags.
    registry: FlagRegistry,
    /// Region manager for one world.
    manager: RegionManager,
    /// A player who owns things.
    owner: LocalPlayer,
    /// A player who is a member of things.
    member: LocalPlayer,
    /// A player with no relation to anything.
    stranger: LocalPlayer,
}

impl TestFixture {
    fn new() -> Self {
        let mut registry = FlagRegistry::with_defaults();
        registry.lock();

        Self {
            registry,
            manager: RegionManager::new(),
            owner: LocalPlayer::new(Uuid::new_v4(), "owner"),
            member: LocalPlayer::new(Uuid::new_v4(), "member"),
            stranger: LocalPlayer::new(Uuid::new_v4(), "stranger"),
        }
    }

    fn flag(&self, name: &str) -> Arc<Flag> {
        self.registry.get(name).unwrap()
    }

    /// Add a cube of side `size` at (`at`, 0, `at`).
    fn add(&self, id: &str, at: i32, size: i32, priority: i32) {
        self.manager
            .update(|index| {
                let mut region = Region::new(
                    id,
                    Shape::cuboid(
                        BlockVector::new(at, 0, at),
                        BlockVector::new(at + size - 1, 255, at + size - 1),
                    ),
                )?;
                region.set_priority(priority);
                index.add(region);
                Ok(())
            })
            .unwrap();
    }

    fn set_flag(&self, id: &str, flag: &str, value: FlagValue) {
        let flag = self.flag(flag);
        self.manager
            .update(|index| {
                let region = index
                    .get_mut(id)
                    .ok_or_else(|| RegionError::NotFound(id.to_string()))?;
                region.set_flag(&flag, Some(value))
            })
            .unwrap();
    }

    fn set_group(&self, id: &str, flag: &str, group: RegionGroup) {
        let flag = self.flag(flag);
        self.manager
            .update(|index| {
                let region = index
                    .get_mut(id)
                    .ok_or_else(|| RegionError::NotFound(id.to_string()))?;
                region.set_group(&flag, Some(group))
            })
            .unwrap();
    }

    fn set_parent(&self, id: &str, parent: &str) -> Result<(), RegionError> {
        self.manager.update(|index| index.set_parent(id, Some(parent)))
    }

    fn add_owner(&self, id: &str) {
        let owner = self.owner.id;
        self.manager
            .update(|index| {
                if let Some(region) = index.get_mut(id) {
                    region.owners_mut().add_player(owner);
                }
                Ok(())
            })
            .unwrap();
    }

    fn add_member(&self, id: &str) {
        let member = self.member.id;
        self.manager
            .update(|index| {
                if let Some(region) = index.get_mut(id) {
                    region.members_mut().add_player(member);
                }
                Ok(())
            })
            .unwrap();
    }

    fn query<S>(&self, x: i32, flag: &str, subject: &S) -> Option<FlagValue>
    where
        S: guard_regions::Subject,
    {
        let view = self.manager.query(BlockVector::new(x, 64, x));
        let set = ApplicableRegionSet::from_view(&view);
        set.query_value(subject, &self.flag(flag))
    }
}

fn state(state: State) -> FlagValue {
    FlagValue::State(state)
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_unset_flag_without_parent_is_default() {
    let fx = TestFixture::new();
    fx.add("plain", 0, 10, 0);

    assert_eq!(fx.query(5, Flags::ENTRY, &fx.stranger), Some(state(State::Allow)));
    assert_eq!(fx.query(5, Flags::PVP, &fx.stranger), None);
    assert_eq!(fx.query(5, Flags::GREETING, &fx.owner), None);
}

#[test]
fn test_empty_set_allows() {
    let fx = TestFixture::new();
    let view = fx.manager.query(BlockVector::new(500, 64, 500));
    let set = ApplicableRegionSet::from_view(&view);

    assert!(set.is_empty());
    assert!(set.test_state(&fx.stranger, &fx.flag(Flags::PVP)));
    assert!(set.test_build(&fx.stranger, &[]));
}

// ============================================================================
// Region groups
// ============================================================================

#[test]
fn test_all_group_applies_to_everyone() {
    let fx = TestFixture::new();
    fx.add("spawn", 0, 10, 0);
    fx.add_owner("spawn");
    fx.set_flag("spawn", Flags::GREETING, FlagValue::String("Welcome".into()));

    let welcome = Some(FlagValue::String("Welcome".into()));
    assert_eq!(fx.query(5, Flags::GREETING, &fx.owner), welcome);
    assert_eq!(fx.query(5, Flags::GREETING, &fx.stranger), welcome);
    assert_eq!(fx.query(5, Flags::GREETING, &Anonymous), welcome);
}

#[test]
fn test_owner_scoped_value_falls_through_to_parent() {
    let fx = TestFixture::new();
    fx.add("parent", 0, 10, 0);
    fx.add("child", 100, 10, 0);
    fx.add_owner("child");
    fx.set_parent("child", "parent").unwrap();

    fx.set_flag("parent", Flags::GREETING, FlagValue::String("from parent".into()));
    fx.set_flag("child", Flags::GREETING, FlagValue::String("owners only".into()));
    fx.set_group("child", Flags::GREETING, RegionGroup::Owners);

    assert_eq!(
        fx.query(105, Flags::GREETING, &fx.owner),
        Some(FlagValue::String("owners only".into()))
    );
    assert_eq!(
        fx.query(105, Flags::GREETING, &fx.stranger),
        Some(FlagValue::String("from parent".into()))
    );
}

#[test]
fn test_entry_default_group_spares_members() {
    let fx = TestFixture::new();
    fx.add("vault", 0, 10, 0);
    fx.add_member("vault");
    fx.add_owner("vault");
    fx.set_flag("vault", Flags::ENTRY, state(State::Deny));

    assert_eq!(fx.query(5, Flags::ENTRY, &fx.stranger), Some(state(State::Deny)));
    // Members fall through to the flag default
    assert_eq!(fx.query(5, Flags::ENTRY, &fx.member), Some(state(State::Allow)));
    assert_eq!(fx.query(5, Flags::ENTRY, &fx.owner), Some(state(State::Allow)));
}

// ============================================================================
// Priority tiers
// ============================================================================

#[test]
fn test_deny_overrides_allow_within_tier() {
    let fx = TestFixture::new();
    fx.add("east", 0, 10, 3);
    fx.add("west", 5, 10, 3);
    fx.set_flag("east", Flags::PVP, state(State::Allow));
    fx.set_flag("west", Flags::PVP, state(State::Deny));

    assert_eq!(fx.query(7, Flags::PVP, &fx.stranger), Some(state(State::Deny)));
    assert_eq!(fx.query(2, Flags::PVP, &fx.stranger), Some(state(State::Allow)));
}

#[test]
fn test_higher_priority_overrides_lower() {
    let fx = TestFixture::new();
    fx.add("arena", 0, 10, 10);
    fx.add("city", 0, 50, 5);
    fx.set_flag("arena", Flags::PVP, state(State::Allow));
    fx.set_flag("city", Flags::PVP, state(State::Deny));

    assert_eq!(fx.query(5, Flags::PVP, &fx.stranger), Some(state(State::Allow)));
    assert_eq!(fx.query(30, Flags::PVP, &fx.stranger), Some(state(State::Deny)));
}

#[test]
fn test_lower_tier_used_when_higher_tier_unset() {
    let fx = TestFixture::new();
    fx.add("shop", 0, 10, 10);
    fx.add("market", 0, 50, 1);
    fx.set_flag("market", Flags::HEAL_AMOUNT, FlagValue::Integer(4));

    assert_eq!(fx.query(5, Flags::HEAL_AMOUNT, &fx.stranger), Some(FlagValue::Integer(4)));
}

#[test]
fn test_non_state_tie_picks_smallest_id() {
    let fx = TestFixture::new();
    fx.add("beta", 0, 10, 0);
    fx.add("Alpha", 0, 10, 0);
    fx.set_flag("beta", Flags::FAREWELL, FlagValue::String("from beta".into()));
    fx.set_flag("alpha", Flags::FAREWELL, FlagValue::String("from alpha".into()));

    assert_eq!(
        fx.query(5, Flags::FAREWELL, &fx.stranger),
        Some(FlagValue::String("from alpha".into()))
    );

    let view = fx.manager.query(BlockVector::new(5, 64, 5));
    let set = ApplicableRegionSet::from_view(&view);
    assert_eq!(set.query_all_values(&fx.stranger, &fx.flag(Flags::FAREWELL)).len(), 2);
}

#[test]
fn test_global_region_at_its_priority() {
    let fx = TestFixture::new();
    fx.add("yard", 0, 10, -1);
    fx.set_flag("yard", Flags::TNT, state(State::Allow));
    let tnt = fx.flag(Flags::TNT);
    fx.manager
        .update(|index| index.global_mut().set_flag(&tnt, Some(state(State::Deny))))
        .unwrap();

    // Global sits at priority 0, above the yard
    assert_eq!(fx.query(5, Flags::TNT, &fx.stranger), Some(state(State::Deny)));
    // Outside every region only the global region applies
    assert_eq!(fx.query(500, Flags::TNT, &fx.stranger), Some(state(State::Deny)));

    fx.manager
        .update(|index| {
            index.global_mut().set_priority(-5);
            Ok(())
        })
        .unwrap();
    assert_eq!(fx.query(5, Flags::TNT, &fx.stranger), Some(state(State::Allow)));

    let view = fx.manager.query(BlockVector::new(5, 64, 5));
    assert_eq!(ApplicableRegionSet::from_view(&view).size(), 1);
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_child_inherits_deny_from_containing_parent() {
    let fx = TestFixture::new();
    fx.add("a", 0, 100, 0);
    fx.add("b", 40, 10, 0);
    fx.set_flag("a", Flags::BUILD, state(State::Deny));
    fx.set_parent("b", "a").unwrap();

    let view = fx.manager.query(BlockVector::new(45, 64, 45));
    let set = ApplicableRegionSet::from_view(&view);
    let build = fx.flag(Flags::BUILD);
    let b = view.index().get("b").unwrap();

    assert_eq!(
        set.calculator().effective_value(b, &build, &fx.stranger),
        Some(state(State::Deny))
    );
    assert_eq!(set.query_value(&fx.stranger, &build), Some(state(State::Deny)));
}

#[test]
fn test_higher_tier_allow_hides_lower_deny() {
    let fx = TestFixture::new();
    fx.add("a", 0, 20, 10);
    fx.add("c", 10, 20, 5);
    fx.set_flag("a", Flags::BUILD, state(State::Allow));
    fx.set_flag("c", Flags::BUILD, state(State::Deny));

    let view = fx.manager.query(BlockVector::new(15, 64, 15));
    let set = ApplicableRegionSet::from_view(&view);

    assert_eq!(set.size(), 2);
    assert_eq!(set.query_value(&fx.stranger, &fx.flag(Flags::BUILD)), Some(state(State::Allow)));
    assert!(set.test_build(&fx.stranger, &[]));
}

// ============================================================================
// Parents
// ============================================================================

#[test]
fn test_set_parent_rejects_cycles() {
    let fx = TestFixture::new();
    fx.add("a", 0, 10, 0);
    fx.add("b", 0, 10, 0);
    fx.add("c", 0, 10, 0);

    assert!(matches!(
        fx.set_parent("a", "A"),
        Err(RegionError::CircularInheritance { .. })
    ));

    fx.set_parent("b", "a").unwrap();
    fx.set_parent("c", "b").unwrap();
    assert!(matches!(
        fx.set_parent("a", "c"),
        Err(RegionError::CircularInheritance { .. })
    ));

    // The graph is unchanged after the failures
    let snapshot = fx.manager.snapshot();
    assert_eq!(snapshot.get("a").unwrap().parent(), None);
    assert_eq!(snapshot.get("c").unwrap().parent(), Some("b"));
}

#[test]
fn test_child_overrides_parent_setting() {
    let fx = TestFixture::new();
    fx.add("town", 0, 100, 0);
    fx.add("plot", 10, 10, 0);
    fx.set_parent("plot", "town").unwrap();
    fx.set_flag("town", Flags::PVP, state(State::Deny));
    fx.set_flag("plot", Flags::PVP, state(State::Allow));

    let view = fx.manager.query(BlockVector::new(15, 64, 15));
    let pvp = fx.flag(Flags::PVP);

    let set = ApplicableRegionSet::from_view(&view);
    assert_eq!(set.query_value(&fx.stranger, &pvp), Some(state(State::Deny)));

    let set = ApplicableRegionSet::from_view(&view).with_config(ResolverConfig {
        child_overrides_parent: true,
        ..Default::default()
    });
    assert_eq!(set.query_value(&fx.stranger, &pvp), Some(state(State::Allow)));
}

// ============================================================================
// Membership and build
// ============================================================================

#[test]
fn test_membership_through_parent() {
    let fx = TestFixture::new();
    fx.add("estate", 0, 100, 0);
    fx.add("garden", 10, 10, 0);
    fx.add_member("estate");
    fx.set_parent("garden", "estate").unwrap();

    let view = fx.manager.query(BlockVector::new(15, 64, 15));
    let set = ApplicableRegionSet::from_view(&view);

    assert_eq!(set.membership(&fx.member), Membership::Success);
    assert_eq!(set.membership(&fx.stranger), Membership::Fail);
    assert!(set.test_build(&fx.member, &[]));
    assert!(!set.test_build(&fx.stranger, &[]));
}

#[test]
fn test_owner_and_member_of_all_are_direct() {
    let fx = TestFixture::new();
    fx.add("estate", 0, 100, 0);
    fx.add("garden", 10, 10, 0);
    fx.add_owner("estate");
    fx.set_parent("garden", "estate").unwrap();

    let view = fx.manager.query(BlockVector::new(15, 64, 15));
    let set = ApplicableRegionSet::from_view(&view);
    assert!(!set.is_owner_of_all(&fx.owner));
    assert!(!set.is_member_of_all(&fx.owner));

    let view = fx.manager.query(BlockVector::new(50, 64, 50));
    let set = ApplicableRegionSet::from_view(&view);
    assert!(set.is_owner_of_all(&fx.owner));
    assert!(set.is_member_of_all(&fx.owner));
}

#[test]
fn test_query_state_combines_flags() {
    let fx = TestFixture::new();
    fx.add("mine", 0, 10, 0);
    fx.set_flag("mine", Flags::BUILD, state(State::Allow));
    fx.set_flag("mine", Flags::BLOCK_BREAK, state(State::Deny));

    let view = fx.manager.query(BlockVector::new(5, 64, 5));
    let set = ApplicableRegionSet::from_view(&view);
    let build = fx.flag(Flags::BUILD);
    let block_break = fx.flag(Flags::BLOCK_BREAK);
    let use_flag = fx.flag(Flags::USE);

    assert_eq!(set.query_state(&fx.stranger, &[&build]), Some(State::Allow));
    assert_eq!(set.query_state(&fx.stranger, &[&build, &block_break]), Some(State::Deny));
    assert_eq!(set.query_state(&fx.stranger, &[&use_flag]), None);
}

#[test]
fn test_resolve_named_unregistered() {
    let fx = TestFixture::new();
    let set = ApplicableRegionSet::empty();
    let calculator = set.calculator();

    let err = calculator
        .resolve_named(&fx.registry, &set, "no-such-flag", &fx.stranger)
        .unwrap_err();
    assert_eq!(err, QueryError::UnregisteredFlag("no-such-flag".to_string()));
    assert_eq!(err.error_code(), "UNREGISTERED_FLAG");

    assert_eq!(
        calculator
            .resolve_named(&fx.registry, &set, Flags::ENTRY, &fx.stranger)
            .unwrap(),
        Some(state(State::Allow))
    );
}

// ============================================================================
// Domains and values
// ============================================================================

#[test]
fn test_domain_add_all_is_idempotent() {
    let mut team = Domain::new();
    team.add_player(Uuid::new_v4());
    team.add_name("Steve");
    team.add_group("builders");

    let mut domain = Domain::new();
    domain.add_all(&team);
    let size = domain.size();
    for _ in 0..3 {
        domain.add_all(&team);
    }
    assert_eq!(domain.size(), size);
}

#[test]
fn test_value_round_trips() {
    let fx = TestFixture::new();
    let samples = [
        (Flags::PVP, "DENY"),
        (Flags::NOTIFY_ENTER, "yes"),
        (Flags::GREETING, "Hello there"),
        (Flags::HEAL_AMOUNT, "-3"),
        (Flags::MIN_HEAL, "2.5"),
        (Flags::GAME_MODE, "Creative"),
        (Flags::TELEPORT, "1, 64.5, -3"),
        (Flags::DENY_SPAWN, "zombie, creeper, zombie"),
        (Flags::GREETING_TITLE, "plain title"),
    ];

    for (name, raw) in samples {
        let flag = fx.flag(name);
        let parsed = flag.parse_input(raw).unwrap();

        let reparsed = flag.parse_input(&parsed.to_string()).unwrap();
        assert_eq!(reparsed, parsed, "input round trip for {}", name);

        let stored = flag.marshal(&parsed);
        assert_eq!(flag.unmarshal(&stored), Some(parsed), "storage round trip for {}", name);
    }
}

#[test]
fn test_location_value_resolves() {
    let fx = TestFixture::new();
    fx.add("home", 0, 10, 0);
    fx.add_member("home");
    fx.set_flag(
        "home",
        Flags::TELEPORT,
        FlagValue::Location(Location::new(1.0, 65.0, 1.0)),
    );

    assert!(fx.query(5, Flags::TELEPORT, &fx.member).is_some());
    assert_eq!(fx.query(5, Flags::TELEPORT, &fx.stranger), None);
}
