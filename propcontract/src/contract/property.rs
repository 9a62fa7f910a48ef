//! The per-member property contract.

use std::fmt;
use std::sync::Arc;

use crate::access::SharedAccessor;
use crate::convert::ConverterBinding;
use crate::core::{
    DeclaredType, DefaultValueHandling, Instance, MemberValue, NullValueHandling,
    ObjectCreationHandling, ReferenceLoopHandling, Required, TypeNameHandling,
};
use crate::errors::ConfigurationError;

/// Instance-conditional serialization predicate.
pub type ShouldSerialize = Arc<dyn Fn(&Instance) -> bool + Send + Sync>;

/// Maps one external field to one in-memory member.
///
/// A plain, inspectable record. Every policy field is optional; an absent
/// policy defers to the owning type and then to the serializer settings
/// (see [`super::PolicyResolver`]). Nothing is derived or cached here, so
/// customization hooks may change fields freely before the contract is
/// first used.
#[derive(Clone)]
pub struct PropertyContract {
    /// Name in the serialized representation. Unique among the non-ignored
    /// properties of one type.
    pub external_name: String,
    /// Static type of the member.
    pub declared_type: DeclaredType,
    /// Reads and writes the member. Required when readable or writable.
    pub accessor: Option<SharedAccessor>,
    /// Converter overriding the one registered for the declared type.
    pub converter: Option<ConverterBinding>,
    /// Excluded from both directions.
    pub ignored: bool,
    /// Read from the source object during serialization.
    pub readable: bool,
    /// Written into the target object during deserialization.
    pub writable: bool,
    /// Value used for default suppression and backfilling.
    pub default_value: Option<MemberValue>,
    /// Required-member policy override.
    pub required: Option<Required>,
    /// Reference preservation override.
    pub is_reference: Option<bool>,
    /// Null value handling override.
    pub null_value_handling: Option<NullValueHandling>,
    /// Default value handling override.
    pub default_value_handling: Option<DefaultValueHandling>,
    /// Reference loop handling override.
    pub reference_loop_handling: Option<ReferenceLoopHandling>,
    /// Object creation handling override.
    pub object_creation_handling: Option<ObjectCreationHandling>,
    /// Type name handling override.
    pub type_name_handling: Option<TypeNameHandling>,
    /// Skips the member for instances where this returns false.
    pub should_serialize: Option<ShouldSerialize>,
}

impl PropertyContract {
    /// Creates a contract with no accessor; it is neither readable nor
    /// writable until one is attached.
    #[must_use]
    pub fn new(external_name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            external_name: external_name.into(),
            declared_type,
            accessor: None,
            converter: None,
            ignored: false,
            readable: false,
            writable: false,
            default_value: None,
            required: None,
            is_reference: None,
            null_value_handling: None,
            default_value_handling: None,
            reference_loop_handling: None,
            object_creation_handling: None,
            type_name_handling: None,
            should_serialize: None,
        }
    }

    /// Name used in diagnostics and logs.
    #[must_use]
    pub fn describe(&self) -> &str {
        &self.external_name
    }

    /// Attaches an accessor; the property becomes readable, and writable
    /// when the accessor can set.
    #[must_use]
    pub fn with_accessor(mut self, accessor: SharedAccessor) -> Self {
        self.readable = true;
        self.writable = accessor.can_set();
        self.accessor = Some(accessor);
        self
    }

    /// Sets the converter override.
    #[must_use]
    pub fn with_converter(mut self, converter: ConverterBinding) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Marks the property as ignored.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Sets readability.
    #[must_use]
    pub fn with_readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// Sets writability.
    #[must_use]
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default_value(mut self, value: impl Into<MemberValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the required policy.
    #[must_use]
    pub fn with_required(mut self, required: Required) -> Self {
        self.required = Some(required);
        self
    }

    /// Sets reference preservation.
    #[must_use]
    pub fn with_is_reference(mut self, is_reference: bool) -> Self {
        self.is_reference = Some(is_reference);
        self
    }

    /// Sets null value handling.
    #[must_use]
    pub fn with_null_value_handling(mut self, handling: NullValueHandling) -> Self {
        self.null_value_handling = Some(handling);
        self
    }

    /// Sets default value handling.
    #[must_use]
    pub fn with_default_value_handling(mut self, handling: DefaultValueHandling) -> Self {
        self.default_value_handling = Some(handling);
        self
    }

    /// Sets reference loop handling.
    #[must_use]
    pub fn with_reference_loop_handling(mut self, handling: ReferenceLoopHandling) -> Self {
        self.reference_loop_handling = Some(handling);
        self
    }

    /// Sets object creation handling.
    #[must_use]
    pub fn with_object_creation_handling(mut self, handling: ObjectCreationHandling) -> Self {
        self.object_creation_handling = Some(handling);
        self
    }

    /// Sets type name handling.
    #[must_use]
    pub fn with_type_name_handling(mut self, handling: TypeNameHandling) -> Self {
        self.type_name_handling = Some(handling);
        self
    }

    /// Sets the instance-conditional predicate.
    #[must_use]
    pub fn with_should_serialize<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        self.should_serialize = Some(Arc::new(predicate));
        self
    }

    /// The value default handling compares against: the explicit default,
    /// else the declared type's implicit default.
    #[must_use]
    pub fn effective_default(&self) -> MemberValue {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.declared_type.implicit_default())
    }

    /// Evaluates the predicate; true when there is none.
    #[must_use]
    pub fn should_serialize_instance(&self, instance: &Instance) -> bool {
        self.should_serialize
            .as_ref()
            .map_or(true, |predicate| predicate(instance))
    }

    /// Checks the record's own invariants.
    pub fn validate(&self, type_name: &str) -> Result<(), ConfigurationError> {
        if self.external_name.is_empty() {
            return Err(ConfigurationError::empty_name(type_name));
        }
        if !self.ignored && (self.readable || self.writable) && self.accessor.is_none() {
            return Err(ConfigurationError::missing_accessor(
                type_name,
                &self.external_name,
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PropertyContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl fmt::Debug for PropertyContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyContract")
            .field("external_name", &self.external_name)
            .field("declared_type", &self.declared_type)
            .field("has_accessor", &self.accessor.is_some())
            .field("converter", &self.converter.as_ref().map(|c| c.name().to_string()))
            .field("ignored", &self.ignored)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("default_value", &self.default_value)
            .field("required", &self.required)
            .field("is_reference", &self.is_reference)
            .field("null_value_handling", &self.null_value_handling)
            .field("default_value_handling", &self.default_value_handling)
            .field("reference_loop_handling", &self.reference_loop_handling)
            .field("object_creation_handling", &self.object_creation_handling)
            .field("type_name_handling", &self.type_name_handling)
            .field("has_should_serialize", &self.should_serialize.is_some())
            .finish()
    }
}
