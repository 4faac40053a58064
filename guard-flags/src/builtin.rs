//! # Built-in Flags
//!
//! The flags every server starts with. Hosts may register more on top.
//!
//! Names are exposed as constants so callers can look flags up without
//! repeating string literals:
//!
//! ```
//! use guard_flags::{Flags, FlagRegistry};
//!
//! let registry = FlagRegistry::with_defaults();
//! let build = registry.get(Flags::BUILD).unwrap();
//! assert!(build.is_permission_like());
//! ```

use crate::flag::Flag;
use crate::group::RegionGroup;
use crate::kind::FlagKind;
use crate::value::State;

/// Catalogue of built-in flag names and definitions.
pub struct Flags;

impl Flags {
    // Protection
    pub const BUILD: &'static str = "build";
    pub const INTERACT: &'static str = "interact";
    pub const BLOCK_BREAK: &'static str = "block-break";
    pub const BLOCK_PLACE: &'static str = "block-place";
    pub const USE: &'static str = "use";
    pub const DAMAGE_ANIMALS: &'static str = "damage-animals";
    pub const CHEST_ACCESS: &'static str = "chest-access";
    pub const PASSTHROUGH: &'static str = "passthrough";

    // World behaviour
    pub const PVP: &'static str = "pvp";
    pub const TNT: &'static str = "tnt";
    pub const CREEPER_EXPLOSION: &'static str = "creeper-explosion";
    pub const FIRE_SPREAD: &'static str = "fire-spread";
    pub const LAVA_FLOW: &'static str = "lava-flow";
    pub const WATER_FLOW: &'static str = "water-flow";
    pub const MOB_SPAWNING: &'static str = "mob-spawning";

    // Movement
    pub const ENTRY: &'static str = "entry";
    pub const EXIT: &'static str = "exit";
    pub const TELEPORT: &'static str = "teleport";
    pub const SPAWN: &'static str = "spawn";

    // Messages
    pub const GREETING: &'static str = "greeting";
    pub const FAREWELL: &'static str = "farewell";
    pub const GREETING_TITLE: &'static str = "greeting-title";
    pub const DENY_MESSAGE: &'static str = "deny-message";
    pub const NOTIFY_ENTER: &'static str = "notify-enter";

    // Player state
    pub const HEAL_AMOUNT: &'static str = "heal-amount";
    pub const HEAL_DELAY: &'static str = "heal-delay";
    pub const MIN_HEAL: &'static str = "heal-min-health";
    pub const MAX_HEAL: &'static str = "heal-max-health";
    pub const GAME_MODE: &'static str = "game-mode";
    pub const WEATHER_LOCK: &'static str = "weather-lock";

    // Lists
    pub const DENY_SPAWN: &'static str = "deny-spawn";
    pub const BLOCKED_CMDS: &'static str = "blocked-cmds";

    /// Build every built-in flag definition.
    pub fn all() -> Vec<Flag> {
        vec![
            // No state default for build: membership decides when nothing is set.
            Flag::state(Self::BUILD, None),
            Flag::state(Self::INTERACT, None),
            Flag::state(Self::BLOCK_BREAK, None),
            Flag::state(Self::BLOCK_PLACE, None),
            Flag::state(Self::USE, None),
            Flag::state(Self::DAMAGE_ANIMALS, None),
            Flag::state(Self::CHEST_ACCESS, None),
            Flag::state(Self::PASSTHROUGH, None),
            Flag::state(Self::PVP, None),
            Flag::state(Self::TNT, None),
            Flag::state(Self::CREEPER_EXPLOSION, None),
            Flag::state(Self::FIRE_SPREAD, None),
            Flag::state(Self::LAVA_FLOW, None),
            Flag::state(Self::WATER_FLOW, None),
            Flag::state(Self::MOB_SPAWNING, None),
            Flag::state(Self::ENTRY, Some(State::Allow)).with_region_group(RegionGroup::NonMembers),
            Flag::state(Self::EXIT, Some(State::Allow)).with_region_group(RegionGroup::NonMembers),
            Flag::location(Self::TELEPORT).with_region_group(RegionGroup::Members),
            Flag::location(Self::SPAWN).with_region_group(RegionGroup::Members),
            Flag::string(Self::GREETING).with_region_group(RegionGroup::All),
            Flag::string(Self::FAREWELL).with_region_group(RegionGroup::All),
            Flag::component(Self::GREETING_TITLE).with_region_group(RegionGroup::All),
            Flag::string(Self::DENY_MESSAGE),
            Flag::boolean(Self::NOTIFY_ENTER, None),
            Flag::integer(Self::HEAL_AMOUNT),
            Flag::integer(Self::HEAL_DELAY),
            Flag::double(Self::MIN_HEAL),
            Flag::double(Self::MAX_HEAL),
            Flag::enumeration(Self::GAME_MODE, ["survival", "creative", "adventure", "spectator"])
                .with_region_group(RegionGroup::All),
            Flag::enumeration(Self::WEATHER_LOCK, ["clear", "rain", "thunder"]),
            Flag::set(Self::DENY_SPAWN, FlagKind::String),
            Flag::set(Self::BLOCKED_CMDS, FlagKind::String).with_region_group(RegionGroup::All),
        ]
    }
}
