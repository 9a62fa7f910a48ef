//! Serializer-wide settings: the global policy tier plus pass options.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{
    DefaultValueHandling, NullValueHandling, ObjectCreationHandling, ReferenceLoopHandling,
    Required, TypeNameHandling,
};
use crate::errors::Result;

/// How incoming field names are matched to external names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// Exact, case-sensitive match only.
    Exact,
    /// Exact match first, then a case-insensitive match.
    IgnoreCase,
}

impl Default for NameMatching {
    fn default() -> Self {
        Self::IgnoreCase
    }
}

impl NameMatching {
    /// Whether `incoming` matches `external` under this rule, ignoring the
    /// exact-first preference.
    #[must_use]
    pub fn loosely_matches(&self, incoming: &str, external: &str) -> bool {
        match self {
            Self::Exact => incoming == external,
            Self::IgnoreCase => incoming.eq_ignore_ascii_case(external),
        }
    }
}

/// Global defaults and options for one serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerSettings {
    /// Global required policy.
    #[serde(default)]
    pub required: Required,
    /// Global null value handling.
    #[serde(default)]
    pub null_value_handling: NullValueHandling,
    /// Global default value handling.
    #[serde(default)]
    pub default_value_handling: DefaultValueHandling,
    /// Global reference loop handling.
    #[serde(default)]
    pub reference_loop_handling: ReferenceLoopHandling,
    /// Global object creation handling.
    #[serde(default)]
    pub object_creation_handling: ObjectCreationHandling,
    /// Global type name handling.
    #[serde(default)]
    pub type_name_handling: TypeNameHandling,
    /// Global reference preservation.
    #[serde(default)]
    pub preserve_references: bool,
    /// Field name matching on read.
    #[serde(default)]
    pub name_matching: NameMatching,
    /// Hop limit for nested objects; bounds `ReferenceLoopHandling::Serialize`.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    64
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self {
            required: Required::default(),
            null_value_handling: NullValueHandling::default(),
            default_value_handling: DefaultValueHandling::default(),
            reference_loop_handling: ReferenceLoopHandling::default(),
            object_creation_handling: ObjectCreationHandling::default(),
            type_name_handling: TypeNameHandling::default(),
            preserve_references: false,
            name_matching: NameMatching::default(),
            max_depth: default_max_depth(),
        }
    }
}

impl SerializerSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from JSON; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads settings from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Sets the global required policy.
    #[must_use]
    pub fn with_required(mut self, required: Required) -> Self {
        self.required = required;
        self
    }

    /// Sets the global null value handling.
    #[must_use]
    pub fn with_null_value_handling(mut self, handling: NullValueHandling) -> Self {
        self.null_value_handling = handling;
        self
    }

    /// Sets the global default value handling.
    #[must_use]
    pub fn with_default_value_handling(mut self, handling: DefaultValueHandling) -> Self {
        self.default_value_handling = handling;
        self
    }

    /// Sets the global reference loop handling.
    #[must_use]
    pub fn with_reference_loop_handling(mut self, handling: ReferenceLoopHandling) -> Self {
        self.reference_loop_handling = handling;
        self
    }

    /// Sets the global object creation handling.
    #[must_use]
    pub fn with_object_creation_handling(mut self, handling: ObjectCreationHandling) -> Self {
        self.object_creation_handling = handling;
        self
    }

    /// Sets the global type name handling.
    #[must_use]
    pub fn with_type_name_handling(mut self, handling: TypeNameHandling) -> Self {
        self.type_name_handling = handling;
        self
    }

    /// Enables or disables global reference preservation.
    #[must_use]
    pub fn with_preserve_references(mut self, preserve: bool) -> Self {
        self.preserve_references = preserve;
        self
    }

    /// Sets field name matching.
    #[must_use]
    pub fn with_name_matching(mut self, matching: NameMatching) -> Self {
        self.name_matching = matching;
        self
    }

    /// Sets the hop limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ContractError;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = SerializerSettings::default();
        assert_eq!(settings.reference_loop_handling, ReferenceLoopHandling::Error);
        assert_eq!(settings.name_matching, NameMatching::IgnoreCase);
        assert_eq!(settings.max_depth, 64);
        assert!(!settings.preserve_references);
    }

    #[test]
    fn test_builder() {
        let settings = SerializerSettings::new()
            .with_null_value_handling(NullValueHandling::Ignore)
            .with_preserve_references(true)
            .with_max_depth(8);

        assert_eq!(settings.null_value_handling, NullValueHandling::Ignore);
        assert!(settings.preserve_references);
        assert_eq!(settings.max_depth, 8);
    }

    #[test]
    fn test_from_json_partial() {
        let settings = SerializerSettings::from_json_str(
            r#"{"null_value_handling": "ignore", "name_matching": "exact"}"#,
        )
        .unwrap();

        assert_eq!(settings.null_value_handling, NullValueHandling::Ignore);
        assert_eq!(settings.name_matching, NameMatching::Exact);
        assert_eq!(settings.max_depth, 64);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = SerializerSettings::from_json_str(r#"{"required": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, ContractError::Serialization(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"reference_loop_handling": "ignore", "max_depth": 3}}"#).unwrap();

        let settings = SerializerSettings::from_path(file.path()).unwrap();
        assert_eq!(settings.reference_loop_handling, ReferenceLoopHandling::Ignore);
        assert_eq!(settings.max_depth, 3);

        let missing = SerializerSettings::from_path("/definitely/not/here.json");
        assert!(matches!(missing, Err(ContractError::Io(_))));
    }

    #[test]
    fn test_name_matching() {
        assert!(NameMatching::IgnoreCase.loosely_matches("AGE", "age"));
        assert!(!NameMatching::Exact.loosely_matches("AGE", "age"));
    }
}
