//! The deserialization pass: matches incoming fields to properties and
//! writes decoded values into instances.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::access::SharedAccessor;
use crate::contract::{resolve, ContractRegistry, PolicyResolver, PropertyContract, TypeContract};
use crate::convert::codec::{self, json_kind};
use crate::convert::{select_converter, ConverterRegistry};
use crate::core::{DeclaredType, MemberValue, ObjectRef, TypeKey, TypeNameHandling};
use crate::errors::{
    AccessError, ConfigurationError, ContractError, ConversionError, RequiredMemberMissingError,
    Result,
};
use crate::ser::{ID_FIELD, REF_FIELD, TYPE_FIELD};
use crate::settings::SerializerSettings;
use crate::transport::{FieldSource, MapFieldSource};

const ROOT: &str = "$";

fn is_metadata(name: &str) -> bool {
    matches!(name, ID_FIELD | REF_FIELD | TYPE_FIELD)
}

/// Where a decoded object lands, for diagnostics and discriminators.
#[derive(Debug, Clone, Copy)]
struct Target<'p> {
    property: &'p str,
    type_name_handling: TypeNameHandling,
}

/// State of one deserialization pass over one document.
pub(crate) struct DeserializePass<'a> {
    settings: &'a SerializerSettings,
    contracts: &'a ContractRegistry,
    converters: &'a ConverterRegistry,
    references: HashMap<String, ObjectRef>,
    fields_read: usize,
}

impl<'a> DeserializePass<'a> {
    pub(crate) fn new(
        settings: &'a SerializerSettings,
        contracts: &'a ContractRegistry,
        converters: &'a ConverterRegistry,
    ) -> Self {
        Self {
            settings,
            contracts,
            converters,
            references: HashMap::new(),
            fields_read: 0,
        }
    }

    pub(crate) fn fields_read(&self) -> usize {
        self.fields_read
    }

    /// Reads a root document into a new instance of `key`, or of the type
    /// its discriminator names.
    pub(crate) fn read_root(&mut self, raw: &Value, key: TypeKey) -> Result<ObjectRef> {
        let contract = self.contracts.require(key)?;
        let target = Target {
            property: ROOT,
            type_name_handling: resolve(
                None,
                contract.defaults.type_name_handling,
                self.settings.type_name_handling,
            )
            .value,
        };
        self.read_object(raw, &DeclaredType::Object(key), target, None)
    }

    /// Reads streamed fields into a new instance of `key`.
    pub(crate) fn read_fields(
        &mut self,
        source: &mut dyn FieldSource,
        key: TypeKey,
    ) -> Result<ObjectRef> {
        let contract = self.contracts.require(key)?;
        let instance = contract.create_instance()?;
        self.populate(&contract, &instance, source)?;
        Ok(instance)
    }

    /// Reads a root document into an existing instance.
    pub(crate) fn populate_root(&mut self, raw: &Value, instance: &ObjectRef) -> Result<()> {
        let declared = DeclaredType::Object(instance.type_key());
        let Value::Object(map) = raw else {
            return Err(unexpected(&declared, raw, ROOT));
        };
        let contract = self.contracts.require(instance.type_key())?;
        if let Some(id) = map.get(ID_FIELD).and_then(Value::as_str) {
            self.references.insert(id.to_string(), instance.clone());
        }
        self.populate(&contract, instance, &mut MapFieldSource::new(map.clone()))
    }

    fn read_object(
        &mut self,
        raw: &Value,
        declared: &DeclaredType,
        target: Target<'_>,
        existing: Option<ObjectRef>,
    ) -> Result<ObjectRef> {
        let Value::Object(map) = raw else {
            return Err(unexpected(declared, raw, target.property));
        };

        if let Some(reference) = map.get(REF_FIELD) {
            let id = reference.as_str().ok_or_else(|| {
                conversion(declared, "`$ref` must be a string", target.property)
            })?;
            return self.references.get(id).cloned().ok_or_else(|| {
                conversion(
                    declared,
                    format!("unresolved reference '{id}'"),
                    target.property,
                )
            });
        }

        let contract = self.target_contract(map, declared, target)?;
        let instance = match existing {
            Some(object) if object.type_key() == contract.type_key() => {
                debug!(property = target.property, type_name = %contract.type_name, "Reusing existing instance");
                object
            }
            _ => contract.create_instance()?,
        };
        if let Some(id) = map.get(ID_FIELD).and_then(Value::as_str) {
            self.references.insert(id.to_string(), instance.clone());
        }

        self.populate(&contract, &instance, &mut MapFieldSource::new(map.clone()))?;
        Ok(instance)
    }

    fn target_contract(
        &self,
        map: &serde_json::Map<String, Value>,
        declared: &DeclaredType,
        target: Target<'_>,
    ) -> Result<Arc<TypeContract>> {
        let named = if target.type_name_handling.reads_type() {
            map.get(TYPE_FIELD).and_then(Value::as_str)
        } else {
            None
        };

        match (named, declared) {
            (Some(name), _) => {
                let contract = self
                    .contracts
                    .get_by_name(name)
                    .ok_or_else(|| ConfigurationError::unknown_type(name))?;
                if let DeclaredType::Object(key) = declared {
                    if *key != contract.type_key() {
                        return Err(conversion(
                            declared,
                            format!("type '{name}' is not compatible"),
                            target.property,
                        ));
                    }
                }
                Ok(contract)
            }
            (None, DeclaredType::Object(key)) => Ok(self.contracts.require(*key)?),
            (None, _) => Err(conversion(
                declared,
                "object value carries no type discriminator",
                target.property,
            )),
        }
    }

    fn populate(
        &mut self,
        contract: &TypeContract,
        instance: &ObjectRef,
        source: &mut dyn FieldSource,
    ) -> Result<()> {
        let settings = self.settings;
        let mut supplied = vec![false; contract.properties.len()];

        while let Some((name, raw)) = source.next_field() {
            if is_metadata(&name) {
                continue;
            }
            let Some(index) = contract.match_property(&name, settings.name_matching) else {
                write_extension(contract, instance, &name, raw)?;
                continue;
            };
            supplied[index] = true;

            let property = &contract.properties[index];
            if property.ignored || !property.writable {
                debug!(property = %property, reason = "not writable", "Discarding field");
                continue;
            }

            let resolver = PolicyResolver::new(property, &contract.defaults, settings);
            let value = if raw.is_null() {
                if resolver.required().value.rejects_null() {
                    return Err(RequiredMemberMissingError::null(
                        &property.external_name,
                        &contract.type_name,
                    )
                    .into());
                }
                MemberValue::Null
            } else {
                self.decode_member(&resolver, instance, &raw)?
            };
            set_member(property, instance, value)?;
            self.fields_read += 1;
        }

        finish(contract, instance, &supplied, settings)
    }

    fn decode_member(
        &mut self,
        resolver: &PolicyResolver<'_>,
        instance: &ObjectRef,
        raw: &Value,
    ) -> Result<MemberValue> {
        let property = resolver.property();
        if let Some(converter) = select_converter(property, self.converters) {
            return converter
                .decode(raw, &property.declared_type)
                .map_err(|e| e.for_property(&property.external_name).into());
        }

        let reuse = resolver
            .object_creation_handling()
            .value
            .reuses(property.declared_type.is_container());
        let existing = if reuse {
            Some(get_member(property, instance)?).filter(|current| !current.is_null())
        } else {
            None
        };

        let target = Target {
            property: &property.external_name,
            type_name_handling: resolver.type_name_handling().value,
        };
        self.decode_value(raw, &property.declared_type, target, existing)
    }

    fn decode_value(
        &mut self,
        raw: &Value,
        declared: &DeclaredType,
        target: Target<'_>,
        existing: Option<MemberValue>,
    ) -> Result<MemberValue> {
        match raw {
            Value::Null => Ok(MemberValue::Null),
            Value::Array(items) => {
                let any = DeclaredType::Any;
                let item_type = match declared {
                    DeclaredType::List(inner) => inner.as_ref(),
                    DeclaredType::Any => &any,
                    _ => return Err(unexpected(declared, raw, target.property)),
                };
                let mut values = match existing {
                    Some(MemberValue::List(current)) => current,
                    _ => Vec::new(),
                };
                values.reserve(items.len());
                for item in items {
                    values.push(self.decode_value(item, item_type, target, None)?);
                }
                Ok(MemberValue::List(values))
            }
            Value::Object(_) => match declared {
                DeclaredType::Object(_) | DeclaredType::Any => {
                    let existing = match existing {
                        Some(MemberValue::Object(object)) => Some(object),
                        _ => None,
                    };
                    let object = self.read_object(raw, declared, target, existing)?;
                    Ok(MemberValue::Object(object))
                }
                _ => Err(unexpected(declared, raw, target.property)),
            },
            scalar => codec::decode_scalar(scalar, declared)
                .map_err(|e| e.for_property(target.property).into()),
        }
    }
}

/// Post-pass over the properties no input field supplied.
fn finish(
    contract: &TypeContract,
    instance: &ObjectRef,
    supplied: &[bool],
    settings: &SerializerSettings,
) -> Result<()> {
    for (property, was_supplied) in contract.properties.iter().zip(supplied) {
        if *was_supplied || property.ignored {
            continue;
        }
        let resolver = PolicyResolver::new(property, &contract.defaults, settings);
        if resolver.default_value_handling().value.populates() && property.writable {
            debug!(property = %property, "Populating default value");
            set_member(property, instance, property.effective_default())?;
            continue;
        }
        if resolver.required().value.rejects_missing() {
            return Err(RequiredMemberMissingError::missing(
                &property.external_name,
                &contract.type_name,
            )
            .into());
        }
    }
    Ok(())
}

fn write_extension(
    contract: &TypeContract,
    instance: &ObjectRef,
    name: &str,
    raw: Value,
) -> Result<()> {
    match &contract.extension_data {
        Some(handler) => {
            let mut guard = instance.write();
            handler.write(&mut *guard, name, raw)?;
        }
        None => trace!(type_name = %contract.type_name, field = name, "Dropping unmatched field"),
    }
    Ok(())
}

fn get_member(property: &PropertyContract, instance: &ObjectRef) -> Result<MemberValue> {
    let accessor = bound_accessor(property)?;
    let guard = instance.read();
    accessor
        .get(&*guard)
        .map_err(|e| e.for_property(&property.external_name).into())
}

fn set_member(property: &PropertyContract, instance: &ObjectRef, value: MemberValue) -> Result<()> {
    let accessor = bound_accessor(property)?;
    let mut guard = instance.write();
    accessor
        .set(&mut *guard, value)
        .map_err(|e| e.for_property(&property.external_name))?;
    Ok(())
}

fn bound_accessor(property: &PropertyContract) -> Result<&SharedAccessor> {
    property
        .accessor
        .as_ref()
        .ok_or_else(|| {
            AccessError::new("no accessor bound")
                .for_property(&property.external_name)
                .into()
        })
}

fn conversion(declared: &DeclaredType, message: impl Into<String>, property: &str) -> ContractError {
    ConversionError::new(declared, message)
        .for_property(property)
        .into()
}

fn unexpected(declared: &DeclaredType, raw: &Value, property: &str) -> ContractError {
    conversion(
        declared,
        format!("unexpected {} value", json_kind(raw)),
        property,
    )
}
