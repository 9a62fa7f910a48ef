//! Type-level contract: the ordered property list of one type plus its
//! type-wide policy defaults.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::PropertyContract;
use crate::core::{
    DefaultValueHandling, Instance, NullValueHandling, ObjectCreationHandling, ObjectRef,
    ReferenceLoopHandling, Required, TypeKey, TypeNameHandling,
};
use crate::de::ExtensionDataHandler;
use crate::errors::ConfigurationError;
use crate::settings::NameMatching;

/// Type-wide policy defaults; the middle resolution tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefaults {
    /// Required policy for every member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Required>,
    /// Null value handling for every member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_value_handling: Option<NullValueHandling>,
    /// Default value handling for every member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value_handling: Option<DefaultValueHandling>,
    /// Reference loop handling for every member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_loop_handling: Option<ReferenceLoopHandling>,
    /// Object creation handling for every member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_creation_handling: Option<ObjectCreationHandling>,
    /// Type name handling for every member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name_handling: Option<TypeNameHandling>,
    /// Reference preservation for every member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reference: Option<bool>,
}

impl TypeDefaults {
    /// Creates empty defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type-wide required policy.
    #[must_use]
    pub fn with_required(mut self, required: Required) -> Self {
        self.required = Some(required);
        self
    }

    /// Sets the type-wide null value handling.
    #[must_use]
    pub fn with_null_value_handling(mut self, handling: NullValueHandling) -> Self {
        self.null_value_handling = Some(handling);
        self
    }

    /// Sets the type-wide default value handling.
    #[must_use]
    pub fn with_default_value_handling(mut self, handling: DefaultValueHandling) -> Self {
        self.default_value_handling = Some(handling);
        self
    }

    /// Sets the type-wide reference loop handling.
    #[must_use]
    pub fn with_reference_loop_handling(mut self, handling: ReferenceLoopHandling) -> Self {
        self.reference_loop_handling = Some(handling);
        self
    }

    /// Sets the type-wide object creation handling.
    #[must_use]
    pub fn with_object_creation_handling(mut self, handling: ObjectCreationHandling) -> Self {
        self.object_creation_handling = Some(handling);
        self
    }

    /// Sets the type-wide type name handling.
    #[must_use]
    pub fn with_type_name_handling(mut self, handling: TypeNameHandling) -> Self {
        self.type_name_handling = Some(handling);
        self
    }

    /// Sets type-wide reference preservation.
    #[must_use]
    pub fn with_is_reference(mut self, is_reference: bool) -> Self {
        self.is_reference = Some(is_reference);
        self
    }
}

/// Creates fresh instances for `ObjectCreationHandling::Replace`.
pub type InstanceFactory = Arc<dyn Fn() -> Box<Instance> + Send + Sync>;

/// Contract for one type: its properties in serialization order.
#[derive(Clone)]
pub struct TypeContract {
    type_key: TypeKey,
    /// Discriminator written as `$type`; defaults to the short Rust name.
    pub type_name: String,
    /// Properties in serialization order.
    pub properties: Vec<PropertyContract>,
    /// Type-wide policy defaults.
    pub defaults: TypeDefaults,
    /// Receives input fields that match no property.
    pub extension_data: Option<Arc<dyn ExtensionDataHandler>>,
    factory: Option<(TypeKey, InstanceFactory)>,
}

impl TypeContract {
    /// Creates an empty contract for `T`.
    #[must_use]
    pub fn new<T: Any>() -> Self {
        let type_key = TypeKey::of::<T>();
        Self {
            type_key,
            type_name: type_key.short_name().to_string(),
            properties: Vec::new(),
            defaults: TypeDefaults::default(),
            extension_data: None,
            factory: None,
        }
    }

    /// Sets the discriminator name.
    #[must_use]
    pub fn with_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Appends a property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyContract) -> Self {
        self.properties.push(property);
        self
    }

    /// Sets the type-wide defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: TypeDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets the instance factory.
    #[must_use]
    pub fn with_factory<T, F>(mut self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let build: InstanceFactory = Arc::new(move || Box::new(factory()) as Box<Instance>);
        self.factory = Some((TypeKey::of::<T>(), build));
        self
    }

    /// Sets the extension data handler.
    #[must_use]
    pub fn with_extension_data(mut self, handler: Arc<dyn ExtensionDataHandler>) -> Self {
        self.extension_data = Some(handler);
        self
    }

    /// The runtime type this contract describes.
    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Allocates a new instance through the factory.
    pub fn create_instance(&self) -> Result<ObjectRef, ConfigurationError> {
        let (built, factory) = self
            .factory
            .as_ref()
            .ok_or_else(|| ConfigurationError::missing_factory(&self.type_name))?;
        if *built != self.type_key {
            return Err(ConfigurationError::factory_type_mismatch(
                &self.type_name,
                built.short_name(),
            ));
        }
        Ok(ObjectRef::from_boxed(self.type_key, factory()))
    }

    /// Property with exactly this external name.
    #[must_use]
    pub fn property(&self, external_name: &str) -> Option<&PropertyContract> {
        self.properties
            .iter()
            .find(|p| p.external_name == external_name)
    }

    /// Mutable property with exactly this external name.
    pub fn property_mut(&mut self, external_name: &str) -> Option<&mut PropertyContract> {
        self.properties
            .iter_mut()
            .find(|p| p.external_name == external_name)
    }

    /// Index of the property an incoming field name maps to.
    ///
    /// An exact match always wins; `IgnoreCase` then falls back to a
    /// case-insensitive match. Among same-named properties a non-ignored
    /// one is preferred.
    #[must_use]
    pub fn match_property(&self, incoming: &str, matching: NameMatching) -> Option<usize> {
        self.position_where(|p| p.external_name == incoming)
            .or_else(|| {
                self.position_where(|p| matching.loosely_matches(incoming, &p.external_name))
            })
    }

    fn position_where(&self, pred: impl Fn(&PropertyContract) -> bool) -> Option<usize> {
        self.properties
            .iter()
            .position(|p| !p.ignored && pred(p))
            .or_else(|| self.properties.iter().position(|p| pred(p)))
    }

    /// Checks every property and the uniqueness of external names among
    /// non-ignored properties.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some((built, _)) = &self.factory {
            if *built != self.type_key {
                return Err(ConfigurationError::factory_type_mismatch(
                    &self.type_name,
                    built.short_name(),
                ));
            }
        }
        let mut seen = HashSet::new();
        for property in &self.properties {
            property.validate(&self.type_name)?;
            if !property.ignored && !seen.insert(property.external_name.as_str()) {
                return Err(ConfigurationError::duplicate_name(
                    &self.type_name,
                    &property.external_name,
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TypeContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeContract")
            .field("type_key", &self.type_key)
            .field("type_name", &self.type_name)
            .field("properties", &self.properties)
            .field("defaults", &self.defaults)
            .field("has_factory", &self.factory.is_some())
            .field("has_extension_data", &self.extension_data.is_some())
            .finish()
    }
}
