//! # Flag Kinds
//!
//! The value type of a flag. Each kind knows how to parse user input,
//! how to marshal a value into a type-erased JSON value for storage,
//! and how to read it back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InvalidFlagFormat;
use crate::group::RegionGroup;
use crate::value::{FlagValue, Location, State};

/// Value type of a flag.
///
/// - **State**: allow/deny, combined with deny-overrides-allow
/// - **Boolean**: true/false
/// - **String**: free text
/// - **Integer** / **Double**: numbers
/// - **Enum**: one of a fixed list of variants
/// - **RegionGroup**: a region group
/// - **Location**: `x,y,z[,yaw,pitch]`
/// - **Component**: JSON text component, or plain text
/// - **Set**: comma separated list of an inner kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum FlagKind {
    /// Allow or deny; permission-like.
    State,
    /// True or false.
    Boolean,
    /// Free text.
    String,
    /// Signed whole number.
    Integer,
    /// Floating point number.
    Double,
    /// One of the listed variants (matched case-insensitively).
    Enum(Vec<String>),
    /// A region group.
    RegionGroup,
    /// A location with optional facing.
    Location,
    /// Rich text.
    Component,
    /// A list of values of the inner kind.
    Set(Box<FlagKind>),
}

impl FlagKind {
    /// Human readable name of the kind, used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::State => "state",
            FlagKind::Boolean => "boolean",
            FlagKind::String => "string",
            FlagKind::Integer => "integer",
            FlagKind::Double => "double",
            FlagKind::Enum(_) => "enum",
            FlagKind::RegionGroup => "region group",
            FlagKind::Location => "location",
            FlagKind::Component => "component",
            FlagKind::Set(_) => "set",
        }
    }

    /// Check if values of this kind combine with deny-overrides-allow.
    pub fn is_permission_like(&self) -> bool {
        matches!(self, FlagKind::State)
    }

    /// Parse user input into a value of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFlagFormat`] with a user-facing message when the
    /// input does not describe a value of this kind.
    ///
    /// # Example
    ///
    /// ```
    /// use guard_flags::{FlagKind, FlagValue, State};
    ///
    /// assert_eq!(FlagKind::State.parse_input("deny").unwrap(), FlagValue::State(State::Deny));
    /// assert_eq!(FlagKind::Integer.parse_input(" 42 ").unwrap(), FlagValue::Integer(42));
    /// assert!(FlagKind::Integer.parse_input("forty-two").is_err());
    /// ```
    pub fn parse_input(&self, raw: &str) -> Result<FlagValue, InvalidFlagFormat> {
        match self {
            FlagKind::State => State::parse(raw).map(FlagValue::State).ok_or_else(|| {
                InvalidFlagFormat::new(format!(
                    "Expected 'allow' or 'deny', got '{}'",
                    raw.trim()
                ))
            }),
            FlagKind::Boolean => parse_bool(raw).map(FlagValue::Boolean).ok_or_else(|| {
                InvalidFlagFormat::new(format!(
                    "Expected 'true' or 'false', got '{}'",
                    raw.trim()
                ))
            }),
            FlagKind::String => Ok(FlagValue::String(raw.to_string())),
            FlagKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FlagValue::Integer)
                .map_err(|_| InvalidFlagFormat::new(format!("Not a whole number: {}", raw.trim()))),
            FlagKind::Double => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite())
                .map(FlagValue::Double)
                .ok_or_else(|| InvalidFlagFormat::new(format!("Not a number: {}", raw.trim()))),
            FlagKind::Enum(variants) => {
                let wanted = raw.trim();
                variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(wanted))
                    .map(|v| FlagValue::Enum(v.clone()))
                    .ok_or_else(|| {
                        InvalidFlagFormat::new(format!(
                            "Unknown value '{}'; expected one of: {}",
                            wanted,
                            variants.join(", ")
                        ))
                    })
            }
            FlagKind::RegionGroup => RegionGroup::parse(raw).map(FlagValue::Group).ok_or_else(|| {
                InvalidFlagFormat::new(format!("Unknown region group: {}", raw.trim()))
            }),
            FlagKind::Location => parse_location(raw).map(FlagValue::Location),
            FlagKind::Component => Ok(FlagValue::Component(parse_component(raw))),
            FlagKind::Set(inner) => {
                let mut items: Vec<FlagValue> = Vec::new();
                for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let item = inner.parse_input(part)?;
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                Ok(FlagValue::Set(items))
            }
        }
    }

    /// Check whether a value belongs to this kind.
    pub fn accepts(&self, value: &FlagValue) -> bool {
        match (self, value) {
            (FlagKind::State, FlagValue::State(_))
            | (FlagKind::Boolean, FlagValue::Boolean(_))
            | (FlagKind::String, FlagValue::String(_))
            | (FlagKind::Integer, FlagValue::Integer(_))
            | (FlagKind::Double, FlagValue::Double(_))
            | (FlagKind::RegionGroup, FlagValue::Group(_))
            | (FlagKind::Location, FlagValue::Location(_))
            | (FlagKind::Component, FlagValue::Component(_)) => true,
            (FlagKind::Enum(variants), FlagValue::Enum(v)) => variants.contains(v),
            (FlagKind::Set(inner), FlagValue::Set(items)) => items.iter().all(|i| inner.accepts(i)),
            _ => false,
        }
    }

    /// Marshal a value into a type-erased JSON value for a persistence layer.
    ///
    /// States, enums and groups become strings, numbers stay numbers,
    /// locations become objects and sets become arrays.
    pub fn marshal(&self, value: &FlagValue) -> Value {
        match value {
            FlagValue::State(state) => Value::String(state.as_str().to_string()),
            FlagValue::Boolean(b) => Value::Bool(*b),
            FlagValue::String(s) | FlagValue::Enum(s) => Value::String(s.clone()),
            FlagValue::Integer(i) => Value::from(*i),
            FlagValue::Double(d) => Value::from(*d),
            FlagValue::Group(g) => Value::String(g.as_str().to_string()),
            FlagValue::Location(l) => serde_json::json!({
                "x": l.x,
                "y": l.y,
                "z": l.z,
                "yaw": l.yaw,
                "pitch": l.pitch,
            }),
            FlagValue::Component(json) => json.clone(),
            FlagValue::Set(items) => {
                let inner = match self {
                    FlagKind::Set(inner) => inner.as_ref(),
                    other => other,
                };
                Value::Array(items.iter().map(|i| inner.marshal(i)).collect())
            }
        }
    }

    /// Read a marshalled value back.
    ///
    /// Returns `None` when the stored value does not fit this kind; the
    /// caller decides whether to drop it or report it.
    pub fn unmarshal(&self, raw: &Value) -> Option<FlagValue> {
        match self {
            FlagKind::State => raw.as_str().and_then(State::parse).map(FlagValue::State),
            FlagKind::Boolean => match raw {
                Value::Bool(b) => Some(FlagValue::Boolean(*b)),
                Value::String(s) => parse_bool(s).map(FlagValue::Boolean),
                _ => None,
            },
            FlagKind::String => raw.as_str().map(|s| FlagValue::String(s.to_string())),
            FlagKind::Integer => match raw {
                Value::Number(n) => n.as_i64().map(FlagValue::Integer),
                Value::String(s) => s.trim().parse().ok().map(FlagValue::Integer),
                _ => None,
            },
            FlagKind::Double => match raw {
                Value::Number(n) => n.as_f64().map(FlagValue::Double),
                Value::String(s) => s.trim().parse().ok().map(FlagValue::Double),
                _ => None,
            },
            FlagKind::Enum(_) | FlagKind::RegionGroup => {
                raw.as_str().and_then(|s| self.parse_input(s).ok())
            }
            FlagKind::Location => match raw {
                Value::Object(_) => serde_json::from_value::<Location>(raw.clone())
                    .ok()
                    .map(FlagValue::Location),
                Value::String(s) => parse_location(s).ok().map(FlagValue::Location),
                _ => None,
            },
            FlagKind::Component => match raw {
                Value::String(s) => Some(FlagValue::Component(parse_component(s))),
                Value::Null => None,
                other => Some(FlagValue::Component(other.clone())),
            },
            FlagKind::Set(inner) => {
                let mut items: Vec<FlagValue> = Vec::new();
                for element in raw.as_array()? {
                    if let Some(item) = inner.unmarshal(element) {
                        if !items.contains(&item) {
                            items.push(item);
                        }
                    }
                }
                Some(FlagValue::Set(items))
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_location(raw: &str) -> Result<Location, InvalidFlagFormat> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 5 {
        return Err(InvalidFlagFormat::new(
            "Expected a location as x,y,z or x,y,z,yaw,pitch",
        ));
    }

    let coord = |s: &str| -> Result<f64, InvalidFlagFormat> {
        s.parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| InvalidFlagFormat::new(format!("Not a coordinate: {}", s)))
    };
    let angle = |s: &str| -> Result<f32, InvalidFlagFormat> {
        s.parse::<f32>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| InvalidFlagFormat::new(format!("Not an angle: {}", s)))
    };

    let mut location = Location::new(coord(parts[0])?, coord(parts[1])?, coord(parts[2])?);
    if parts.len() == 5 {
        location = location.with_rotation(angle(parts[3])?, angle(parts[4])?);
    }
    Ok(location)
}

/// JSON objects and arrays are kept as components; anything else is plain text.
fn parse_component(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(json @ (Value::Object(_) | Value::Array(_))) => json,
        _ => serde_json::json!({ "text": raw }),
    }
}
