//! # Flags
//!
//! A flag is a named, typed setting. Flags are created once, registered in a
//! [`FlagRegistry`](crate::FlagRegistry) and shared as `Arc<Flag>`; regions
//! refer to them by name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlagError, FlagResult, InvalidFlagFormat};
use crate::group::RegionGroup;
use crate::kind::FlagKind;
use crate::value::{FlagValue, State};

/// A named, typed flag definition.
///
/// # Example
///
/// ```
/// use guard_flags::{Flag, FlagValue, RegionGroup, State};
///
/// let entry = Flag::state("entry", None).with_region_group(RegionGroup::NonMembers);
/// assert_eq!(entry.name(), "entry");
/// assert_eq!(entry.default_group(), Some(RegionGroup::NonMembers));
///
/// let pvp = Flag::state("pvp", Some(State::Allow));
/// assert_eq!(pvp.default_value(), Some(&FlagValue::State(State::Allow)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flag {
    /// Unique flag name.
    name: String,
    /// Value type.
    kind: FlagKind,
    /// Value used when no region sets the flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<FlagValue>,
    /// Default group of the companion region-group flag, if the flag has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<RegionGroup>,
}

impl Flag {
    /// Create a flag of the given kind with no default and no region group.
    pub fn new(name: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            group: None,
        }
    }

    /// Create a state (allow/deny) flag.
    pub fn state(name: impl Into<String>, default: Option<State>) -> Self {
        let mut flag = Self::new(name, FlagKind::State);
        flag.default = default.map(FlagValue::State);
        flag
    }

    /// Create a boolean flag.
    pub fn boolean(name: impl Into<String>, default: Option<bool>) -> Self {
        let mut flag = Self::new(name, FlagKind::Boolean);
        flag.default = default.map(FlagValue::Boolean);
        flag
    }

    /// Create a string flag.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::String)
    }

    /// Create an integer flag.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Integer)
    }

    /// Create a double flag.
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Double)
    }

    /// Create an enum flag over the given variants.
    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FlagKind::Enum(variants.into_iter().map(Into::into).collect()),
        )
    }

    /// Create a location flag.
    pub fn location(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Location)
    }

    /// Create a rich text flag.
    pub fn component(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Component)
    }

    /// Create a set flag over an inner kind.
    pub fn set(name: impl Into<String>, inner: FlagKind) -> Self {
        Self::new(name, FlagKind::Set(Box::new(inner)))
    }

    /// Set the default value.
    ///
    /// # Errors
    ///
    /// Fails with `FlagError::TypeMismatch` if the value is not of the flag's kind.
    pub fn with_default(mut self, default: FlagValue) -> FlagResult<Self> {
        self.check_value(&default)?;
        self.default = Some(default);
        Ok(self)
    }

    /// Give the flag a companion region-group with the given default group.
    pub fn with_region_group(mut self, default_group: RegionGroup) -> Self {
        self.group = Some(default_group);
        self
    }

    /// The flag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flag name folded for case-insensitive comparison.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// The value type.
    pub fn kind(&self) -> &FlagKind {
        &self.kind
    }

    /// The default value, if any.
    pub fn default_value(&self) -> Option<&FlagValue> {
        self.default.as_ref()
    }

    /// The default group of the companion region-group flag, if the flag has one.
    pub fn default_group(&self) -> Option<RegionGroup> {
        self.group
    }

    /// Check if the flag can be scoped to a region group.
    pub fn has_region_group(&self) -> bool {
        self.group.is_some()
    }

    /// Parse user input into a value for this flag.
    pub fn parse_input(&self, raw: &str) -> Result<FlagValue, InvalidFlagFormat> {
        self.kind.parse_input(raw)
    }

    /// Parse user input into a region group for this flag's companion group.
    ///
    /// # Errors
    ///
    /// `FlagError::NoRegionGroup` when the flag has no companion group,
    /// `FlagError::InvalidFormat` when the group name is not recognised.
    pub fn parse_group(&self, raw: &str) -> FlagResult<RegionGroup> {
        if !self.has_region_group() {
            return Err(FlagError::NoRegionGroup(self.name.clone()));
        }
        RegionGroup::parse(raw).ok_or_else(|| {
            InvalidFlagFormat::new(format!("Unknown region group: {}", raw.trim())).into()
        })
    }

    /// Marshal a value of this flag for storage.
    pub fn marshal(&self, value: &FlagValue) -> Value {
        self.kind.marshal(value)
    }

    /// Read a stored value of this flag back.
    pub fn unmarshal(&self, raw: &Value) -> Option<FlagValue> {
        self.kind.unmarshal(raw)
    }

    /// Ensure a value is of this flag's kind.
    ///
    /// # Errors
    ///
    /// `FlagError::TypeMismatch` naming the expected kind.
    pub fn check_value(&self, value: &FlagValue) -> FlagResult<()> {
        if self.kind.accepts(value) {
            Ok(())
        } else {
            Err(FlagError::TypeMismatch {
                flag: self.name.clone(),
                expected: self.kind.as_str(),
            })
        }
    }

    /// Check if the flag's values combine with deny-overrides-allow.
    pub fn is_permission_like(&self) -> bool {
        self.kind.is_permission_like()
    }
}
