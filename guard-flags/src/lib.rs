//! # Guard Flags
//!
//! This crate provides the flag type system for region protection.
//!
//! ## Overview
//!
//! The guard-flags crate handles:
//! - **Flags**: Named, typed settings such as `build`, `pvp` or `greeting`
//! - **Kinds**: The value type of a flag (state, boolean, string, number, enum,
//!   region group, location, rich text, set)
//! - **Values**: Typed values with parse, marshal and unmarshal support
//! - **Region Groups**: Scoping a flag value to owners, members, non-members...
//! - **Registry**: Name lookup with fuzzy matching for user input
//!
//! ## Architecture
//!
//! ```text
//! FlagRegistry ─→ Arc<Flag> { name, kind, default, default group }
//!                               │
//!   user input ── parse_input ──┤── FlagValue ── marshal ──→ serde_json::Value
//!                               └── FlagValue ←─ unmarshal ─ serde_json::Value
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use guard_flags::{Flag, FlagRegistry, FlagValue, RegionGroup, State};
//!
//! let mut registry = FlagRegistry::with_defaults();
//! registry.register(Flag::state("vehicle-place", None)).unwrap();
//! registry.lock();
//!
//! let flag = registry.fuzzy_match("vehicle").unwrap();
//! let value = flag.parse_input("deny").unwrap();
//! assert_eq!(value, FlagValue::State(State::Deny));
//!
//! // Stored form for a persistence layer
//! assert_eq!(flag.marshal(&value), serde_json::json!("deny"));
//! ```
//!
//! ## State Flags
//!
//! State flags (allow/deny) are permission-like: when values from several
//! regions of the same priority meet, `Deny` wins.

pub mod builtin;
pub mod error;
pub mod flag;
pub mod group;
pub mod kind;
pub mod registry;
pub mod value;

// Re-export main types for convenience
pub use builtin::Flags;
pub use error::{FlagError, FlagResult, InvalidFlagFormat};
pub use flag::Flag;
pub use group::{Association, RegionGroup};
pub use kind::FlagKind;
pub use registry::FlagRegistry;
pub use value::{FlagValue, Location, State};
