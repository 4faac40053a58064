//! # Guard Regions
//!
//! This crate provides protected regions and the structures that hold them.
//!
//! ## Overview
//!
//! The guard-regions crate handles:
//! - **Regions**: Id, priority, parent, owners, members and flag values
//! - **Shapes**: Global, cuboid and polygon areas
//! - **Domains**: Owner and member sets of players, names and groups
//! - **Index**: All regions of a world, with parent checks and removal strategies
//! - **Manager**: Copy-on-write snapshots for concurrent readers
//!
//! ## Architecture
//!
//! ```text
//! RegionManager ── snapshot() ──→ Arc<RegionIndex>
//!                                   └─ BTreeMap<id, Arc<Region>>
//!                                         └─ parent: Option<id>
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use guard_flags::{Flags, FlagRegistry, FlagValue, State};
//! use guard_regions::{BlockVector, Region, RegionManager, Shape};
//!
//! let registry = FlagRegistry::with_defaults();
//! let pvp = registry.get(Flags::PVP).unwrap();
//!
//! let manager = RegionManager::new();
//! manager.update(|index| {
//!     let mut arena = Region::new(
//!         "arena",
//!         Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(40, 80, 40)),
//!     )?;
//!     arena.set_flag(&pvp, Some(FlagValue::State(State::Allow)))?;
//!     index.add(arena);
//!     Ok(())
//! }).unwrap();
//!
//! let view = manager.query(BlockVector::new(20, 64, 20));
//! assert_eq!(view.regions()[0].get_flag(&pvp), Some(&FlagValue::State(State::Allow)));
//! ```

pub mod domain;
pub mod error;
pub mod index;
pub mod manager;
pub mod region;
pub mod shape;

// Re-export main types for convenience
pub use domain::{Anonymous, Domain, LocalPlayer, Subject};
pub use error::{RegionError, RegionResult};
pub use index::{RegionFilter, RegionIndex, RegionLookup, RemovalStrategy};
pub use manager::{QueryView, RegionManager};
pub use region::{Region, GLOBAL_REGION};
pub use shape::{BlockVector, BlockVector2, Shape};
