//! # Flag Values
//!
//! Typed values stored on regions. A value is produced by parsing user input
//! with a flag's [`FlagKind`](crate::FlagKind) and is rendered back to the same
//! input syntax by its `Display` implementation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::group::RegionGroup;

/// Outcome of a permission-like (state) flag.
///
/// When several state values meet, `Deny` wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// The action is allowed.
    Allow,
    /// The action is denied.
    Deny,
}

impl State {
    /// Get the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Allow => "allow",
            State::Deny => "deny",
        }
    }

    /// Parse a state from user input.
    ///
    /// # Example
    ///
    /// ```
    /// use guard_flags::State;
    ///
    /// assert_eq!(State::parse("allow"), Some(State::Allow));
    /// assert_eq!(State::parse("DENY"), Some(State::Deny));
    /// assert_eq!(State::parse("maybe"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Some(State::Allow),
            "deny" => Some(State::Deny),
            _ => None,
        }
    }

    /// Combine two states where deny overrides allow.
    pub fn combine(self, other: State) -> State {
        if self == State::Deny || other == State::Deny {
            State::Deny
        } else {
            State::Allow
        }
    }

    /// Combine any number of states, `None` if there are none.
    ///
    /// # Example
    ///
    /// ```
    /// use guard_flags::State;
    ///
    /// assert_eq!(State::combine_all([State::Allow, State::Deny]), Some(State::Deny));
    /// assert_eq!(State::combine_all([State::Allow]), Some(State::Allow));
    /// assert_eq!(State::combine_all(Vec::<State>::new()), None);
    /// ```
    pub fn combine_all<I>(states: I) -> Option<State>
    where
        I: IntoIterator<Item = State>,
    {
        states.into_iter().reduce(State::combine)
    }

    /// Convert a boolean test into a state.
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            State::Allow
        } else {
            State::Deny
        }
    }
}

/// A point with a facing direction, used by teleport-like flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
    /// Horizontal rotation in degrees.
    #[serde(default)]
    pub yaw: f32,
    /// Vertical rotation in degrees.
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    /// Create a location facing the default direction.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Set the facing direction.
    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }
}

/// A typed flag value.
///
/// The variant always corresponds to the [`FlagKind`](crate::FlagKind) of the
/// flag it is stored under; regions reject mismatched values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FlagValue {
    /// Allow or deny.
    State(State),
    /// True or false.
    Boolean(bool),
    /// Free text.
    String(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Double(f64),
    /// One variant out of a fixed list, stored in its canonical spelling.
    Enum(String),
    /// A region group.
    Group(RegionGroup),
    /// A location with facing.
    Location(Location),
    /// Rich text as a JSON text component.
    Component(serde_json::Value),
    /// An ordered list without duplicates.
    Set(Vec<FlagValue>),
}

impl FlagValue {
    /// Get the state, if this is a state value.
    pub fn as_state(&self) -> Option<State> {
        match self {
            FlagValue::State(state) => Some(*state),
            _ => None,
        }
    }

    /// Get the boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the text of a string or enum value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) | FlagValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FlagValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get a number from an integer or double value.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            FlagValue::Double(d) => Some(*d),
            FlagValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the region group, if this is a group value.
    pub fn as_group(&self) -> Option<RegionGroup> {
        match self {
            FlagValue::Group(g) => Some(*g),
            _ => None,
        }
    }

    /// Get the location, if this is a location value.
    pub fn as_location(&self) -> Option<&Location> {
        match self {
            FlagValue::Location(l) => Some(l),
            _ => None,
        }
    }

    /// Get the elements, if this is a set value.
    pub fn as_set(&self) -> Option<&[FlagValue]> {
        match self {
            FlagValue::Set(items) => Some(items),
            _ => None,
        }
    }
}

impl From<State> for FlagValue {
    fn from(state: State) -> Self {
        FlagValue::State(state)
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        FlagValue::Boolean(b)
    }
}

impl From<i64> for FlagValue {
    fn from(i: i64) -> Self {
        FlagValue::Integer(i)
    }
}

impl From<f64> for FlagValue {
    fn from(d: f64) -> Self {
        FlagValue::Double(d)
    }
}

impl From<RegionGroup> for FlagValue {
    fn from(group: RegionGroup) -> Self {
        FlagValue::Group(group)
    }
}

impl From<Location> for FlagValue {
    fn from(location: Location) -> Self {
        FlagValue::Location(location)
    }
}

impl fmt::Display for FlagValue {
    /// Renders the value in the syntax accepted by `FlagKind::parse_input`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::State(state) => f.write_str(state.as_str()),
            FlagValue::Boolean(b) => write!(f, "{}", b),
            FlagValue::String(s) | FlagValue::Enum(s) => f.write_str(s),
            FlagValue::Integer(i) => write!(f, "{}", i),
            FlagValue::Double(d) => write!(f, "{}", d),
            FlagValue::Group(g) => f.write_str(g.as_str()),
            FlagValue::Location(l) => {
                write!(f, "{},{},{},{},{}", l.x, l.y, l.z, l.yaw, l.pitch)
            }
            FlagValue::Component(json) => write!(f, "{}", json),
            FlagValue::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}
