//! Effective-policy resolution.
//!
//! Every overridable policy resolves through the same three tiers, in
//! order: the property's own value, the owning type's default, the
//! serializer's global default. The first present tier wins. Resolution
//! reads the contract's current fields on every call and caches nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PropertyContract, TypeDefaults};
use crate::core::{
    DefaultValueHandling, NullValueHandling, ObjectCreationHandling, ReferenceLoopHandling,
    Required, TypeNameHandling,
};
use crate::settings::SerializerSettings;

/// Which tier supplied a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyTier {
    /// The property contract.
    Member,
    /// The owning type contract.
    Type,
    /// The serializer settings.
    Global,
}

impl fmt::Display for PolicyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Type => write!(f, "type"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// A resolved policy value and its source tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved<T> {
    /// The effective value.
    pub value: T,
    /// The tier it came from.
    pub tier: PolicyTier,
}

/// Three-tier precedence: member, then type, then global.
pub fn resolve<T>(member: Option<T>, type_default: Option<T>, global: T) -> Resolved<T> {
    match (member, type_default) {
        (Some(value), _) => Resolved {
            value,
            tier: PolicyTier::Member,
        },
        (None, Some(value)) => Resolved {
            value,
            tier: PolicyTier::Type,
        },
        (None, None) => Resolved {
            value: global,
            tier: PolicyTier::Global,
        },
    }
}

/// Resolves the effective policies of one property during one pass.
#[derive(Debug, Clone, Copy)]
pub struct PolicyResolver<'a> {
    property: &'a PropertyContract,
    defaults: &'a TypeDefaults,
    settings: &'a SerializerSettings,
}

impl<'a> PolicyResolver<'a> {
    /// Creates a resolver over the three tiers.
    #[must_use]
    pub fn new(
        property: &'a PropertyContract,
        defaults: &'a TypeDefaults,
        settings: &'a SerializerSettings,
    ) -> Self {
        Self {
            property,
            defaults,
            settings,
        }
    }

    /// The property being resolved.
    #[must_use]
    pub fn property(&self) -> &'a PropertyContract {
        self.property
    }

    /// Effective required policy.
    #[must_use]
    pub fn required(&self) -> Resolved<Required> {
        resolve(
            self.property.required,
            self.defaults.required,
            self.settings.required,
        )
    }

    /// Effective null value handling.
    #[must_use]
    pub fn null_value_handling(&self) -> Resolved<NullValueHandling> {
        resolve(
            self.property.null_value_handling,
            self.defaults.null_value_handling,
            self.settings.null_value_handling,
        )
    }

    /// Effective default value handling.
    #[must_use]
    pub fn default_value_handling(&self) -> Resolved<DefaultValueHandling> {
        resolve(
            self.property.default_value_handling,
            self.defaults.default_value_handling,
            self.settings.default_value_handling,
        )
    }

    /// Effective reference loop handling.
    #[must_use]
    pub fn reference_loop_handling(&self) -> Resolved<ReferenceLoopHandling> {
        resolve(
            self.property.reference_loop_handling,
            self.defaults.reference_loop_handling,
            self.settings.reference_loop_handling,
        )
    }

    /// Effective object creation handling.
    #[must_use]
    pub fn object_creation_handling(&self) -> Resolved<ObjectCreationHandling> {
        resolve(
            self.property.object_creation_handling,
            self.defaults.object_creation_handling,
            self.settings.object_creation_handling,
        )
    }

    /// Effective type name handling.
    #[must_use]
    pub fn type_name_handling(&self) -> Resolved<TypeNameHandling> {
        resolve(
            self.property.type_name_handling,
            self.defaults.type_name_handling,
            self.settings.type_name_handling,
        )
    }

    /// Effective reference preservation.
    #[must_use]
    pub fn is_reference(&self) -> Resolved<bool> {
        resolve(
            self.property.is_reference,
            self.defaults.is_reference,
            self.settings.preserve_references,
        )
    }

    /// Snapshot of every effective policy, for diagnostics.
    #[must_use]
    pub fn effective(&self) -> EffectivePolicy {
        EffectivePolicy {
            property: self.property.external_name.clone(),
            required: self.required(),
            null_value_handling: self.null_value_handling(),
            default_value_handling: self.default_value_handling(),
            reference_loop_handling: self.reference_loop_handling(),
            object_creation_handling: self.object_creation_handling(),
            type_name_handling: self.type_name_handling(),
            is_reference: self.is_reference(),
        }
    }
}

/// All effective policies of one property at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePolicy {
    /// External name of the property.
    pub property: String,
    /// Required policy.
    pub required: Resolved<Required>,
    /// Null value handling.
    pub null_value_handling: Resolved<NullValueHandling>,
    /// Default value handling.
    pub default_value_handling: Resolved<DefaultValueHandling>,
    /// Reference loop handling.
    pub reference_loop_handling: Resolved<ReferenceLoopHandling>,
    /// Object creation handling.
    pub object_creation_handling: Resolved<ObjectCreationHandling>,
    /// Type name handling.
    pub type_name_handling: Resolved<TypeNameHandling>,
    /// Reference preservation.
    pub is_reference: Resolved<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DeclaredType;

    #[test]
    fn test_resolve_tiers() {
        assert_eq!(resolve(Some(1), Some(2), 3), Resolved { value: 1, tier: PolicyTier::Member });
        assert_eq!(resolve(None, Some(2), 3), Resolved { value: 2, tier: PolicyTier::Type });
        assert_eq!(resolve::<i32>(None, None, 3), Resolved { value: 3, tier: PolicyTier::Global });
    }

    #[test]
    fn test_member_beats_type_and_global() {
        let property = PropertyContract::new("age", DeclaredType::Integer)
            .with_null_value_handling(NullValueHandling::Include);
        let defaults = TypeDefaults::new().with_null_value_handling(NullValueHandling::Ignore);
        let settings = SerializerSettings::new().with_null_value_handling(NullValueHandling::Ignore);

        let resolver = PolicyResolver::new(&property, &defaults, &settings);
        let resolved = resolver.null_value_handling();
        assert_eq!(resolved.value, NullValueHandling::Include);
        assert_eq!(resolved.tier, PolicyTier::Member);
    }

    #[test]
    fn test_type_beats_global() {
        let property = PropertyContract::new("age", DeclaredType::Integer);
        let defaults = TypeDefaults::new().with_required(Required::Always);
        let settings = SerializerSettings::new().with_required(Required::AllowNull);

        let resolved = PolicyResolver::new(&property, &defaults, &settings).required();
        assert_eq!(resolved.value, Required::Always);
        assert_eq!(resolved.tier, PolicyTier::Type);
    }

    #[test]
    fn test_is_reference_falls_back_to_preserve_references() {
        let property = PropertyContract::new("owner", DeclaredType::Any);
        let defaults = TypeDefaults::new();
        let settings = SerializerSettings::new().with_preserve_references(true);

        let resolved = PolicyResolver::new(&property, &defaults, &settings).is_reference();
        assert!(resolved.value);
        assert_eq!(resolved.tier, PolicyTier::Global);

        let opted_out = property.with_is_reference(false);
        let resolved = PolicyResolver::new(&opted_out, &defaults, &settings).is_reference();
        assert!(!resolved.value);
        assert_eq!(resolved.tier, PolicyTier::Member);
    }

    #[test]
    fn test_resolution_rereads_mutated_fields() {
        let mut property = PropertyContract::new("age", DeclaredType::Integer);
        let defaults = TypeDefaults::new();
        let settings = SerializerSettings::new();

        let before = PolicyResolver::new(&property, &defaults, &settings).reference_loop_handling();
        assert_eq!(before.value, ReferenceLoopHandling::Error);

        property.reference_loop_handling = Some(ReferenceLoopHandling::Ignore);
        let after = PolicyResolver::new(&property, &defaults, &settings).reference_loop_handling();
        assert_eq!(after.value, ReferenceLoopHandling::Ignore);
        assert_eq!(after.tier, PolicyTier::Member);
    }

    #[test]
    fn test_effective_snapshot() {
        let property = PropertyContract::new("tags", DeclaredType::list_of(DeclaredType::String))
            .with_object_creation_handling(ObjectCreationHandling::Replace);
        let defaults = TypeDefaults::new().with_type_name_handling(TypeNameHandling::Auto);
        let settings = SerializerSettings::new();

        let snapshot = PolicyResolver::new(&property, &defaults, &settings).effective();
        assert_eq!(snapshot.property, "tags");
        assert_eq!(snapshot.object_creation_handling.tier, PolicyTier::Member);
        assert_eq!(snapshot.type_name_handling.tier, PolicyTier::Type);
        assert_eq!(snapshot.required.tier, PolicyTier::Global);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["type_name_handling"]["value"], "auto");
        assert_eq!(json["type_name_handling"]["tier"], "type");
    }
}
