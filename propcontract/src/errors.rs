//! Error types for property contracts and serialization passes.
//!
//! Every failure a read or write pass can raise is one of the structured
//! errors below, wrapped by [`ContractError`]. Nothing here is retried and
//! nothing is silently replaced by a default.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ContractError> = std::result::Result<T, E>;

/// The main error type for contract and serialization operations.
#[derive(Debug, Error)]
pub enum ContractError {
    /// An accessor could not read or write a member.
    #[error("{0}")]
    Access(#[from] AccessError),

    /// A converter could not encode or decode a value.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// A reference loop was found under the `Error` policy.
    #[error("{0}")]
    ReferenceLoop(#[from] ReferenceLoopError),

    /// A required member was absent or null.
    #[error("{0}")]
    RequiredMemberMissing(#[from] RequiredMemberMissingError),

    /// Contracts were built inconsistently.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// The configured hop limit was exceeded while re-serializing a loop.
    #[error("{0}")]
    DepthLimit(#[from] DepthLimitError),

    /// Malformed settings or input document.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Returns the external name of the property involved, if any.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::Access(e) => e.property.as_deref(),
            Self::Conversion(e) => e.property.as_deref(),
            Self::ReferenceLoop(e) => Some(e.property.as_str()),
            Self::RequiredMemberMissing(e) => Some(e.external_name.as_str()),
            Self::Configuration(e) => e.property.as_deref(),
            Self::DepthLimit(_) | Self::Serialization(_) | Self::Io(_) => None,
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Structured diagnostics attached to configuration failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Stable error code, see [`codes`].
    pub code: String,
    /// One-line summary.
    pub summary: String,
    /// How to fix the contract.
    pub fix_hint: String,
}

impl ContractErrorInfo {
    /// Creates diagnostics for one failure.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        summary: impl Into<String>,
        fix_hint: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: fix_hint.into(),
        }
    }
}

/// Common error codes.
pub mod codes {
    /// Two non-ignored properties share an external name.
    pub const DUPLICATE_NAME: &str = "CONTRACT-101-DUPLICATE_NAME";
    /// A readable or writable property has no accessor.
    pub const MISSING_ACCESSOR: &str = "CONTRACT-102-MISSING_ACCESSOR";
    /// A property has an empty external name.
    pub const EMPTY_NAME: &str = "CONTRACT-103-EMPTY_NAME";
    /// No type contract is registered for a runtime type.
    pub const UNKNOWN_TYPE: &str = "CONTRACT-104-UNKNOWN_TYPE";
    /// A type contract cannot create new instances.
    pub const MISSING_FACTORY: &str = "CONTRACT-105-MISSING_FACTORY";
    /// Two type contracts share a discriminator name.
    pub const DUPLICATE_TYPE_NAME: &str = "CONTRACT-106-DUPLICATE_TYPE_NAME";
    /// An instance factory builds a different type than its contract.
    pub const FACTORY_TYPE_MISMATCH: &str = "CONTRACT-107-FACTORY_TYPE_MISMATCH";
}

/// Raised when an accessor cannot read or write a member on an instance.
#[derive(Debug, Clone, Error)]
#[error(
    "Error accessing property '{}': {message}",
    .property.as_deref().unwrap_or("<unbound>")
)]
pub struct AccessError {
    /// External name of the property, filled in by the pass.
    pub property: Option<String>,
    /// What went wrong.
    pub message: String,
}

impl AccessError {
    /// Creates a new access error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            property: None,
            message: message.into(),
        }
    }

    /// The instance is not of the type the accessor was built for.
    #[must_use]
    pub fn shape_mismatch(expected: &str) -> Self {
        Self::new(format!("instance is not a `{expected}`"))
    }

    /// The accessor has no setter.
    #[must_use]
    pub fn read_only() -> Self {
        Self::new("member has no setter")
    }

    /// The value handed to a setter does not fit the member.
    #[must_use]
    pub fn invalid_value(reason: impl fmt::Display) -> Self {
        Self::new(format!("invalid value: {reason}"))
    }

    /// Attaches the property name.
    #[must_use]
    pub fn for_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }
}

/// Raised when a value cannot be encoded or decoded for a declared type.
#[derive(Debug, Clone, Error)]
#[error(
    "Error converting value{} to type '{declared_type}': {message}",
    .property.as_deref().map(|p| format!(" for property '{p}'")).unwrap_or_default()
)]
pub struct ConversionError {
    /// External name of the property, filled in by the pass.
    pub property: Option<String>,
    /// Rendered declared type.
    pub declared_type: String,
    /// What went wrong.
    pub message: String,
}

impl ConversionError {
    /// Creates a new conversion error.
    #[must_use]
    pub fn new(declared_type: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            property: None,
            declared_type: declared_type.to_string(),
            message: message.into(),
        }
    }

    /// Attaches the property name unless one is already set.
    #[must_use]
    pub fn for_property(mut self, property: impl Into<String>) -> Self {
        if self.property.is_none() {
            self.property = Some(property.into());
        }
        self
    }
}

/// Raised when serialization revisits an ancestor under the `Error` policy.
#[derive(Debug, Clone, Error)]
#[error(
    "Self referencing loop detected for property '{property}': {}",
    cycle_path.join(" -> ")
)]
pub struct ReferenceLoopError {
    /// The property whose value closed the loop.
    pub property: String,
    /// Path from the revisited object back to itself.
    pub cycle_path: Vec<String>,
}

impl ReferenceLoopError {
    /// Creates a new reference loop error.
    #[must_use]
    pub fn new(property: impl Into<String>, cycle_path: Vec<String>) -> Self {
        Self {
            property: property.into(),
            cycle_path,
        }
    }
}

/// Why a required member check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredViolation {
    /// No value was supplied.
    Missing,
    /// A null value was supplied where null is not allowed.
    Null,
}

impl fmt::Display for RequiredViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "was not found"),
            Self::Null => write!(f, "expects a non-null value"),
        }
    }
}

/// Raised by the post-pass required check.
#[derive(Debug, Clone, Error)]
#[error("Required property '{external_name}' on '{type_name}' {reason}")]
pub struct RequiredMemberMissingError {
    /// External name of the required property.
    pub external_name: String,
    /// Discriminator name of the owning type.
    pub type_name: String,
    /// Missing or null.
    pub reason: RequiredViolation,
}

impl RequiredMemberMissingError {
    /// The member was absent from the input.
    #[must_use]
    pub fn missing(external_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            external_name: external_name.into(),
            type_name: type_name.into(),
            reason: RequiredViolation::Missing,
        }
    }

    /// The member was present but null.
    #[must_use]
    pub fn null(external_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            external_name: external_name.into(),
            type_name: type_name.into(),
            reason: RequiredViolation::Null,
        }
    }
}

/// Raised when contracts are inconsistent. Detected when contracts are
/// built or registered, never recovered from by skipping.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// Discriminator name of the type involved.
    pub type_name: String,
    /// External name of the property involved.
    pub property: Option<String>,
    /// Structured diagnostics.
    pub error_info: ContractErrorInfo,
}

impl ConfigurationError {
    fn build(
        code: &str,
        type_name: &str,
        property: Option<&str>,
        message: String,
        hint: &str,
    ) -> Self {
        Self {
            error_info: ContractErrorInfo::new(code, message.clone(), hint),
            message,
            type_name: type_name.to_string(),
            property: property.map(String::from),
        }
    }

    /// Two non-ignored properties of one type share an external name.
    #[must_use]
    pub fn duplicate_name(type_name: &str, external_name: &str) -> Self {
        Self::build(
            codes::DUPLICATE_NAME,
            type_name,
            Some(external_name),
            format!("A member with the name '{external_name}' already exists on '{type_name}'"),
            "Rename one of the members or mark one of them as ignored.",
        )
    }

    /// A readable or writable property has no accessor.
    #[must_use]
    pub fn missing_accessor(type_name: &str, external_name: &str) -> Self {
        Self::build(
            codes::MISSING_ACCESSOR,
            type_name,
            Some(external_name),
            format!("Property '{external_name}' on '{type_name}' is readable or writable but has no accessor"),
            "Attach an accessor or mark the property as ignored.",
        )
    }

    /// A property has an empty external name.
    #[must_use]
    pub fn empty_name(type_name: &str) -> Self {
        Self::build(
            codes::EMPTY_NAME,
            type_name,
            None,
            format!("A property on '{type_name}' has an empty external name"),
            "Give every property a non-empty external name.",
        )
    }

    /// No type contract is registered for a type.
    #[must_use]
    pub fn unknown_type(type_name: &str) -> Self {
        Self::build(
            codes::UNKNOWN_TYPE,
            type_name,
            None,
            format!("No contract is registered for type '{type_name}'"),
            "Register a type contract before serializing values of this type.",
        )
    }

    /// A type contract has no instance factory.
    #[must_use]
    pub fn missing_factory(type_name: &str) -> Self {
        Self::build(
            codes::MISSING_FACTORY,
            type_name,
            None,
            format!("Type '{type_name}' has no instance factory"),
            "Attach a factory to the type contract so new instances can be created.",
        )
    }

    /// Two type contracts share a discriminator name.
    #[must_use]
    pub fn duplicate_type_name(type_name: &str) -> Self {
        Self::build(
            codes::DUPLICATE_TYPE_NAME,
            type_name,
            None,
            format!("Another type is already registered under the name '{type_name}'"),
            "Give each type contract a distinct name.",
        )
    }

    /// An instance factory builds a different type than its contract.
    #[must_use]
    pub fn factory_type_mismatch(type_name: &str, built: &str) -> Self {
        Self::build(
            codes::FACTORY_TYPE_MISMATCH,
            type_name,
            None,
            format!("The factory for '{type_name}' builds '{built}'"),
            "Pass a factory that returns the contract's own type.",
        )
    }

    /// Diagnostics as one JSON object, for structured logs.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "type": self.type_name,
            "property": self.property,
            "error_info": self.error_info,
        })
    }
}

/// Raised when re-serializing a loop exceeds the configured hop limit.
#[derive(Debug, Clone, Error)]
#[error("Maximum depth of {limit} exceeded at {}", path.join("."))]
pub struct DepthLimitError {
    /// The configured limit.
    pub limit: usize,
    /// Property path at the point the limit was hit.
    pub path: Vec<String>,
}

impl DepthLimitError {
    /// Creates a new depth limit error.
    #[must_use]
    pub fn new(limit: usize, path: Vec<String>) -> Self {
        Self { limit, path }
    }
}
