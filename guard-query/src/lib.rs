//! # Guard Query
//!
//! This crate answers "what is flag F for subject S here?".
//!
//! ## Overview
//!
//! The guard-query crate handles:
//! - **Calculator**: Parent-chain walks with region-group scoping, then
//!   priority tiers with deny-overrides-allow for state flags
//! - **Applicable Region Sets**: The sorted regions at one point, with
//!   ownership, membership and build tests
//! - **Permissions**: Permission nodes for region commands
//! - **Configuration**: Membership and inheritance rules
//!
//! ## Architecture
//!
//! ```text
//! RegionIndex / QueryView ──→ ApplicableRegionSet ──→ FlagValueCalculator
//!                                     │                    │
//!                                     └── test_build ──────┴── RegionPermissionModel
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use guard_flags::{Flags, FlagRegistry, FlagValue, State};
//! use guard_query::ApplicableRegionSet;
//! use guard_regions::{Anonymous, BlockVector, Region, RegionIndex, Shape};
//!
//! let registry = FlagRegistry::with_defaults();
//! let build = registry.get(Flags::BUILD).unwrap();
//!
//! let mut town = Region::new(
//!     "town",
//!     Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(99, 255, 99)),
//! ).unwrap();
//! town.set_flag(&build, Some(FlagValue::State(State::Deny))).unwrap();
//!
//! let index = RegionIndex::from_iter([town]);
//! let here = index.regions_applicable_to(BlockVector::new(5, 64, 5));
//! let set = ApplicableRegionSet::new(here, index.global(), &index);
//!
//! assert_eq!(set.query_value(&Anonymous, &build), Some(FlagValue::State(State::Deny)));
//! assert!(!set.test_build(&Anonymous, &[]));
//! ```

pub mod calculator;
pub mod config;
pub mod error;
pub mod permission;
pub mod set;

// Re-export main types for convenience
pub use calculator::{FlagValueCalculator, Membership};
pub use config::{ConfigError, ResolverConfig};
pub use error::{QueryError, QueryResult};
pub use permission::{Actor, PermissionNode, RegionAction, RegionPermissionModel, REGION_NODE_ROOT};
pub use set::ApplicableRegionSet;
