//! Per-member policy enums.
//!
//! Each policy can be set on a property, on its owning type, or on the
//! serializer; see [`crate::contract::resolve`] for how the tiers combine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a member must be present, and whether it may be null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Required {
    /// Not required; may be absent or null.
    Default,
    /// Must be present; may be null.
    AllowNull,
    /// Must be present and non-null.
    Always,
    /// Must not be null. Absence is also rejected.
    DisallowNull,
}

impl Default for Required {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for Required {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::AllowNull => write!(f, "allow_null"),
            Self::Always => write!(f, "always"),
            Self::DisallowNull => write!(f, "disallow_null"),
        }
    }
}

impl Required {
    /// True when a missing member is an error.
    #[must_use]
    pub fn rejects_missing(&self) -> bool {
        !matches!(self, Self::Default)
    }

    /// True when a null value is an error.
    #[must_use]
    pub fn rejects_null(&self) -> bool {
        matches!(self, Self::Always | Self::DisallowNull)
    }
}

/// Whether null values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullValueHandling {
    /// Write `null`.
    Include,
    /// Omit the member.
    Ignore,
}

impl Default for NullValueHandling {
    fn default() -> Self {
        Self::Include
    }
}

impl fmt::Display for NullValueHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include => write!(f, "include"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

/// How values equal to the member default are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValueHandling {
    /// Write default values like any other.
    Include,
    /// Omit members whose value equals the default.
    Ignore,
    /// Backfill defaults for members missing from the input.
    Populate,
    /// Both `Ignore` and `Populate`.
    IgnoreAndPopulate,
}

impl Default for DefaultValueHandling {
    fn default() -> Self {
        Self::Include
    }
}

impl fmt::Display for DefaultValueHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include => write!(f, "include"),
            Self::Ignore => write!(f, "ignore"),
            Self::Populate => write!(f, "populate"),
            Self::IgnoreAndPopulate => write!(f, "ignore_and_populate"),
        }
    }
}

impl DefaultValueHandling {
    /// Serialization omits default values.
    #[must_use]
    pub fn ignores(&self) -> bool {
        matches!(self, Self::Ignore | Self::IgnoreAndPopulate)
    }

    /// Deserialization backfills missing members with the default.
    #[must_use]
    pub fn populates(&self) -> bool {
        matches!(self, Self::Populate | Self::IgnoreAndPopulate)
    }
}

/// Behavior when serialization revisits an object in its own ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceLoopHandling {
    /// Fail the pass.
    Error,
    /// Omit the looping member.
    Ignore,
    /// Serialize again, bounded by the depth limit.
    Serialize,
}

impl Default for ReferenceLoopHandling {
    fn default() -> Self {
        Self::Error
    }
}

impl fmt::Display for ReferenceLoopHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Ignore => write!(f, "ignore"),
            Self::Serialize => write!(f, "serialize"),
        }
    }
}

/// Whether deserialization reuses the instance already held by a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCreationHandling {
    /// Reuse containers, replace everything else.
    Auto,
    /// Populate the existing instance when there is one.
    Reuse,
    /// Always allocate a new instance.
    Replace,
}

impl Default for ObjectCreationHandling {
    fn default() -> Self {
        Self::Auto
    }
}

impl fmt::Display for ObjectCreationHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Reuse => write!(f, "reuse"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

impl ObjectCreationHandling {
    /// Resolves `Auto` against the container-ness of the declared type.
    #[must_use]
    pub fn reuses(&self, is_container: bool) -> bool {
        match self {
            Self::Reuse => true,
            Self::Replace => false,
            Self::Auto => is_container,
        }
    }
}

/// When a `$type` discriminator is written next to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeNameHandling {
    /// Never.
    None,
    /// For every object.
    Objects,
    /// For collections only; has no effect on object values.
    Arrays,
    /// For objects and collections.
    All,
    /// When the runtime type differs from the declared type.
    Auto,
}

impl Default for TypeNameHandling {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for TypeNameHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Objects => write!(f, "objects"),
            Self::Arrays => write!(f, "arrays"),
            Self::All => write!(f, "all"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl TypeNameHandling {
    /// Whether an object value gets a discriminator.
    ///
    /// `declared_matches` is true when the declared type already names the
    /// runtime type.
    #[must_use]
    pub fn writes_object_type(&self, declared_matches: bool) -> bool {
        match self {
            Self::Objects | Self::All => true,
            Self::Auto => !declared_matches,
            Self::None | Self::Arrays => false,
        }
    }

    /// Whether `$type` in the input is honoured.
    #[must_use]
    pub fn reads_type(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(Required::default(), Required::Default);
        assert_eq!(NullValueHandling::default(), NullValueHandling::Include);
        assert_eq!(DefaultValueHandling::default(), DefaultValueHandling::Include);
        assert_eq!(ReferenceLoopHandling::default(), ReferenceLoopHandling::Error);
        assert_eq!(ObjectCreationHandling::default(), ObjectCreationHandling::Auto);
        assert_eq!(TypeNameHandling::default(), TypeNameHandling::None);
    }

    #[test]
    fn test_required_rules() {
        assert!(!Required::Default.rejects_missing());
        assert!(Required::AllowNull.rejects_missing());
        assert!(!Required::AllowNull.rejects_null());
        assert!(Required::Always.rejects_null());
        assert!(Required::DisallowNull.rejects_missing());
        assert!(Required::DisallowNull.rejects_null());
    }

    #[test]
    fn test_default_value_handling_flags() {
        assert!(!DefaultValueHandling::Include.ignores());
        assert!(DefaultValueHandling::Ignore.ignores());
        assert!(!DefaultValueHandling::Ignore.populates());
        assert!(DefaultValueHandling::Populate.populates());
        assert!(DefaultValueHandling::IgnoreAndPopulate.ignores());
        assert!(DefaultValueHandling::IgnoreAndPopulate.populates());
    }

    #[test]
    fn test_object_creation_reuses() {
        assert!(ObjectCreationHandling::Reuse.reuses(false));
        assert!(!ObjectCreationHandling::Replace.reuses(true));
        assert!(ObjectCreationHandling::Auto.reuses(true));
        assert!(!ObjectCreationHandling::Auto.reuses(false));
    }

    #[test]
    fn test_type_name_handling() {
        assert!(TypeNameHandling::Objects.writes_object_type(true));
        assert!(TypeNameHandling::Auto.writes_object_type(false));
        assert!(!TypeNameHandling::Auto.writes_object_type(true));
        assert!(!TypeNameHandling::Arrays.writes_object_type(false));
        assert!(!TypeNameHandling::None.reads_type());
        assert!(TypeNameHandling::Arrays.reads_type());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&DefaultValueHandling::IgnoreAndPopulate).unwrap();
        assert_eq!(json, "\"ignore_and_populate\"");

        let parsed: ReferenceLoopHandling = serde_json::from_str("\"serialize\"").unwrap();
        assert_eq!(parsed, ReferenceLoopHandling::Serialize);
        assert_eq!(Required::DisallowNull.to_string(), "disallow_null");
    }
}
