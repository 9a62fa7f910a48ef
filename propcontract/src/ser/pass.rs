//! The serialization pass: reads members off instances and emits fields.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::chain::{AncestorChain, ReferenceIds};
use super::{ID_FIELD, REF_FIELD, TYPE_FIELD};
use crate::contract::{resolve, ContractRegistry, PolicyResolver, PropertyContract, TypeContract};
use crate::convert::{codec, select_converter, ConverterRegistry};
use crate::core::{
    DeclaredType, Instance, MemberValue, NullValueHandling, ObjectRef, ReferenceLoopHandling,
    TypeNameHandling,
};
use crate::errors::{AccessError, DepthLimitError, ReferenceLoopError, Result};
use crate::settings::SerializerSettings;
use crate::transport::FieldSink;

/// Label used for values that are not held by any property.
pub(crate) const ROOT: &str = "$";

/// Object framing policies, resolved from the member holding the object.
#[derive(Debug, Clone, Copy)]
struct Framing<'p> {
    property: &'p str,
    type_name_handling: TypeNameHandling,
    reference_loop_handling: ReferenceLoopHandling,
    preserve: bool,
}

impl<'p> Framing<'p> {
    fn for_root(contract: &TypeContract, settings: &SerializerSettings) -> Self {
        let defaults = &contract.defaults;
        Self {
            property: ROOT,
            type_name_handling: resolve(
                None,
                defaults.type_name_handling,
                settings.type_name_handling,
            )
            .value,
            reference_loop_handling: resolve(
                None,
                defaults.reference_loop_handling,
                settings.reference_loop_handling,
            )
            .value,
            preserve: resolve(None, defaults.is_reference, settings.preserve_references).value,
        }
    }

    fn for_member(resolver: &PolicyResolver<'p>) -> Self {
        Self {
            property: &resolver.property().external_name,
            type_name_handling: resolver.type_name_handling().value,
            reference_loop_handling: resolver.reference_loop_handling().value,
            preserve: resolver.is_reference().value,
        }
    }
}

/// State of one serialization pass over one object graph.
pub(crate) struct SerializePass<'a> {
    settings: &'a SerializerSettings,
    contracts: &'a ContractRegistry,
    converters: &'a ConverterRegistry,
    chain: AncestorChain,
    ids: ReferenceIds,
    fields_written: usize,
}

impl<'a> SerializePass<'a> {
    pub(crate) fn new(
        settings: &'a SerializerSettings,
        contracts: &'a ContractRegistry,
        converters: &'a ConverterRegistry,
    ) -> Self {
        Self {
            settings,
            contracts,
            converters,
            chain: AncestorChain::default(),
            ids: ReferenceIds::default(),
            fields_written: 0,
        }
    }

    pub(crate) fn fields_written(&self) -> usize {
        self.fields_written
    }

    /// Writes the fields of a root object into `sink`.
    pub(crate) fn write_root(&mut self, object: &ObjectRef, sink: &mut dyn FieldSink) -> Result<()> {
        let contract = self.contracts.require(object.type_key())?;
        let framing = Framing::for_root(&contract, self.settings);
        let declared = DeclaredType::Object(object.type_key());
        self.write_fields(object, &contract, &declared, framing, sink)
    }

    /// Encodes a free-standing value under the global policies.
    pub(crate) fn write_value(&mut self, value: &MemberValue, declared: &DeclaredType) -> Result<Value> {
        let settings = self.settings;
        let framing = Framing {
            property: ROOT,
            type_name_handling: settings.type_name_handling,
            reference_loop_handling: settings.reference_loop_handling,
            preserve: settings.preserve_references,
        };
        Ok(self.encode_value(value, declared, framing)?.unwrap_or(Value::Null))
    }

    fn write_object(
        &mut self,
        object: &ObjectRef,
        declared: &DeclaredType,
        framing: Framing<'_>,
    ) -> Result<Option<Value>> {
        if let Some(id) = self.ids.get(object).filter(|_| framing.preserve) {
            let mut reference = Map::new();
            reference.insert(REF_FIELD.to_string(), Value::String(id.to_string()));
            return Ok(Some(Value::Object(reference)));
        }
        // An ancestor written without an `$id` cannot be referenced.
        if self.chain.contains(object) {
            match framing.reference_loop_handling {
                ReferenceLoopHandling::Error => {
                    let cycle_path = self.chain.cycle_path(object, framing.property);
                    return Err(ReferenceLoopError::new(framing.property, cycle_path).into());
                }
                ReferenceLoopHandling::Ignore => {
                    warn!(
                        property = framing.property,
                        type_name = %object.type_key(),
                        "Skipping self referencing loop"
                    );
                    return Ok(None);
                }
                ReferenceLoopHandling::Serialize => {}
            }
        }

        let contract = self.contracts.require(object.type_key())?;
        let mut fields = Map::new();
        self.write_fields(object, &contract, declared, framing, &mut fields)?;
        Ok(Some(Value::Object(fields)))
    }

    fn write_fields(
        &mut self,
        object: &ObjectRef,
        contract: &TypeContract,
        declared: &DeclaredType,
        framing: Framing<'_>,
        sink: &mut dyn FieldSink,
    ) -> Result<()> {
        if self.chain.depth() >= self.settings.max_depth {
            let mut path = self.chain.path();
            path.push(framing.property.to_string());
            return Err(DepthLimitError::new(self.settings.max_depth, path).into());
        }

        if framing.preserve {
            let id = self.ids.assign(object);
            sink.write_field(ID_FIELD, Value::String(id));
        }
        let declared_matches =
            matches!(declared, DeclaredType::Object(key) if *key == object.type_key());
        if framing.type_name_handling.writes_object_type(declared_matches) {
            sink.write_field(TYPE_FIELD, Value::String(contract.type_name.clone()));
        }

        self.chain.push(object, &contract.type_name, framing.property);
        let result = self.write_members(object, contract, sink);
        self.chain.pop();
        result
    }

    fn write_members(
        &mut self,
        object: &ObjectRef,
        contract: &TypeContract,
        sink: &mut dyn FieldSink,
    ) -> Result<()> {
        let settings = self.settings;

        // Values are collected under the read lock and encoded after it is
        // released, so nested objects may point back at this instance.
        let (members, extension) = {
            let guard = object.read();
            let instance: &Instance = &*guard;
            let mut members = Vec::with_capacity(contract.properties.len());
            for property in &contract.properties {
                let resolver = PolicyResolver::new(property, &contract.defaults, settings);
                if let Some(value) = read_member(&resolver, instance)? {
                    members.push((property, value));
                }
            }
            let extension = match &contract.extension_data {
                Some(handler) => handler.read(instance)?,
                None => Vec::new(),
            };
            (members, extension)
        };

        for (property, value) in members {
            let resolver = PolicyResolver::new(property, &contract.defaults, settings);
            if let Some(encoded) = self.encode_member(&resolver, &value)? {
                sink.write_field(&property.external_name, encoded);
                self.fields_written += 1;
            }
        }
        for (name, value) in extension {
            if contract.property(&name).is_none() {
                sink.write_field(&name, value);
            }
        }
        Ok(())
    }

    fn encode_member(
        &mut self,
        resolver: &PolicyResolver<'_>,
        value: &MemberValue,
    ) -> Result<Option<Value>> {
        let property = resolver.property();
        if value.is_null() {
            return Ok(Some(Value::Null));
        }
        if let Some(converter) = select_converter(property, self.converters) {
            let encoded = converter
                .encode(value, &property.declared_type)
                .map_err(|e| e.for_property(&property.external_name))?;
            return Ok(Some(encoded));
        }
        self.encode_value(value, &property.declared_type, Framing::for_member(resolver))
    }

    fn encode_value(
        &mut self,
        value: &MemberValue,
        declared: &DeclaredType,
        framing: Framing<'_>,
    ) -> Result<Option<Value>> {
        match value {
            MemberValue::List(items) => {
                let any = DeclaredType::Any;
                let item_type = match declared {
                    DeclaredType::List(inner) => inner.as_ref(),
                    _ => &any,
                };
                let mut encoded = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(item) = self.encode_value(item, item_type, framing)? {
                        encoded.push(item);
                    }
                }
                Ok(Some(Value::Array(encoded)))
            }
            MemberValue::Object(object) => self.write_object(object, declared, framing),
            scalar => {
                let encoded = codec::encode_scalar(scalar, declared)
                    .map_err(|e| e.for_property(framing.property))?;
                Ok(Some(encoded))
            }
        }
    }
}

/// Decides whether one member is written for one instance, and reads it.
fn read_member(resolver: &PolicyResolver<'_>, instance: &Instance) -> Result<Option<MemberValue>> {
    let property = resolver.property();
    if property.ignored || !property.readable {
        skip(property, "not readable");
        return Ok(None);
    }
    if !property.should_serialize_instance(instance) {
        skip(property, "should_serialize returned false");
        return Ok(None);
    }

    let accessor = property
        .accessor
        .as_ref()
        .ok_or_else(|| AccessError::new("no accessor bound").for_property(&property.external_name))?;
    let value = accessor
        .get(instance)
        .map_err(|e| e.for_property(&property.external_name))?;

    if value.is_null() {
        if resolver.null_value_handling().value == NullValueHandling::Ignore {
            skip(property, "null value ignored");
            return Ok(None);
        }
        return Ok(Some(value));
    }
    if resolver.default_value_handling().value.ignores() && value == property.effective_default() {
        skip(property, "default value ignored");
        return Ok(None);
    }
    Ok(Some(value))
}

fn skip(property: &PropertyContract, reason: &'static str) {
    debug!(property = %property, reason, "Skipping member");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ShouldSerialize;
    use crate::core::TypeKey;
    use crate::errors::ContractError;
    use crate::testing::{linked_pair, node_contract, person_contract, Person};
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> ContractRegistry {
        let contracts = ContractRegistry::new();
        contracts.register(person_contract()).unwrap();
        contracts.register(node_contract()).unwrap();
        contracts
    }

    #[test]
    fn test_members_are_read_from_the_instance() {
        let contracts = registry();
        let named_only: ShouldSerialize =
            Arc::new(|instance: &Instance| instance.downcast_ref::<Person>().is_some());
        contracts
            .customize(TypeKey::of::<Person>(), |contract| {
                contract.property_mut("age").unwrap().should_serialize = Some(named_only);
            })
            .unwrap();
        let settings = SerializerSettings::default();
        let converters = ConverterRegistry::new();
        let mut pass = SerializePass::new(&settings, &contracts, &converters);

        let mut fields = Map::new();
        pass.write_root(&ObjectRef::new(Person::new("Ada", 36)), &mut fields)
            .unwrap();

        assert_eq!(Value::Object(fields), json!({"name": "Ada", "age": 36, "email": null}));
        assert_eq!(pass.fields_written(), 3);
    }

    fn reference_next(contracts: &ContractRegistry) {
        contracts
            .customize(TypeKey::of::<crate::testing::Node>(), |contract| {
                contract.property_mut("next").unwrap().is_reference = Some(true);
            })
            .unwrap();
    }

    #[test]
    fn test_unidentified_ancestor_is_still_a_loop() {
        let contracts = registry();
        reference_next(&contracts);
        let settings = SerializerSettings::default();
        let converters = ConverterRegistry::new();
        let mut pass = SerializePass::new(&settings, &contracts, &converters);
        let (a, _b) = linked_pair("a", "b");

        let err: ContractError = pass.write_root(&a, &mut Map::new()).unwrap_err();
        match err {
            ContractError::ReferenceLoop(e) => {
                assert_eq!(e.property, "next");
                assert_eq!(e.cycle_path, vec!["Node.next", "Node.next", "Node"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unidentified_ancestor_ignored_once() {
        let contracts = registry();
        reference_next(&contracts);
        let settings =
            SerializerSettings::new().with_reference_loop_handling(ReferenceLoopHandling::Ignore);
        let converters = ConverterRegistry::new();
        let mut pass = SerializePass::new(&settings, &contracts, &converters);
        let (a, _b) = linked_pair("a", "b");

        let mut fields = Map::new();
        pass.write_root(&a, &mut fields).unwrap();
        assert_eq!(
            Value::Object(fields),
            json!({"name": "a", "next": {"$id": "1", "name": "b"}})
        );
    }
}
