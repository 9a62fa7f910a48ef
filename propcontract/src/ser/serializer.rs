//! The serializer facade: settings, registries and pass instrumentation.

use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::pass::SerializePass;
use crate::contract::{ContractRegistry, EffectivePolicy, PolicyResolver, TypeContract};
use crate::convert::ConverterRegistry;
use crate::core::{DeclaredType, MemberValue, ObjectRef, TypeKey};
use crate::de::DeserializePass;
use crate::errors::Result;
use crate::observability::{
    NoOpTracingEmitter, PassKind, PassSpanAttributes, SpanTimer, TracingEmitter,
};
use crate::settings::SerializerSettings;
use crate::transport::{FieldSink, FieldSource};

/// Reads and writes object graphs according to their registered contracts.
///
/// A serializer is cheap to share: registries sit behind `Arc` and each
/// call runs an independent pass with its own loop and reference state.
pub struct Serializer {
    settings: SerializerSettings,
    contracts: Arc<ContractRegistry>,
    converters: Arc<ConverterRegistry>,
    emitter: Arc<dyn TracingEmitter>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(SerializerSettings::default())
    }
}

impl Serializer {
    /// Creates a serializer with empty registries.
    #[must_use]
    pub fn new(settings: SerializerSettings) -> Self {
        Self {
            settings,
            contracts: Arc::new(ContractRegistry::new()),
            converters: Arc::new(ConverterRegistry::new()),
            emitter: Arc::new(NoOpTracingEmitter),
        }
    }

    /// Shares an existing contract registry.
    #[must_use]
    pub fn with_contracts(mut self, contracts: Arc<ContractRegistry>) -> Self {
        self.contracts = contracts;
        self
    }

    /// Shares an existing converter registry.
    #[must_use]
    pub fn with_converters(mut self, converters: Arc<ConverterRegistry>) -> Self {
        self.converters = converters;
        self
    }

    /// Sets the span emitter.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn TracingEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// The global policy tier.
    #[must_use]
    pub fn settings(&self) -> &SerializerSettings {
        &self.settings
    }

    /// The contract registry.
    #[must_use]
    pub fn contracts(&self) -> &Arc<ContractRegistry> {
        &self.contracts
    }

    /// The converter registry.
    #[must_use]
    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.converters
    }

    /// Validates and registers a type contract.
    pub fn register(&self, contract: TypeContract) -> Result<Arc<TypeContract>> {
        Ok(self.contracts.register(contract)?)
    }

    /// Effective policies of one property under this serializer's settings.
    #[must_use]
    pub fn effective_policy(&self, key: TypeKey, external_name: &str) -> Option<EffectivePolicy> {
        let contract = self.contracts.get(key)?;
        let property = contract.property(external_name)?;
        Some(PolicyResolver::new(property, &contract.defaults, &self.settings).effective())
    }

    /// Serializes an object graph to a JSON object.
    pub fn serialize(&self, object: &ObjectRef) -> Result<Value> {
        let mut fields = Map::new();
        self.serialize_into(object, &mut fields)?;
        Ok(Value::Object(fields))
    }

    /// Serializes the root object's fields into `sink`.
    pub fn serialize_into(&self, object: &ObjectRef, sink: &mut dyn FieldSink) -> Result<()> {
        self.instrumented(PassKind::Serialize, object.type_key(), || {
            let mut pass = SerializePass::new(&self.settings, &self.contracts, &self.converters);
            pass.write_root(object, sink)?;
            Ok(((), pass.fields_written()))
        })
    }

    /// Encodes a value that no property holds, under the global policies.
    pub fn serialize_value(&self, value: &MemberValue, declared: &DeclaredType) -> Result<Value> {
        let mut pass = SerializePass::new(&self.settings, &self.contracts, &self.converters);
        pass.write_value(value, declared)
    }

    /// Deserializes a JSON object into a new instance of `key`.
    pub fn deserialize(&self, raw: &Value, key: TypeKey) -> Result<ObjectRef> {
        self.instrumented(PassKind::Deserialize, key, || {
            let mut pass = DeserializePass::new(&self.settings, &self.contracts, &self.converters);
            let object = pass.read_root(raw, key)?;
            Ok((object, pass.fields_read()))
        })
    }

    /// Deserializes a JSON object into a new `T`.
    pub fn deserialize_as<T: Any>(&self, raw: &Value) -> Result<ObjectRef> {
        self.deserialize(raw, TypeKey::of::<T>())
    }

    /// Deserializes streamed fields into a new instance of `key`.
    pub fn deserialize_from(&self, source: &mut dyn FieldSource, key: TypeKey) -> Result<ObjectRef> {
        self.instrumented(PassKind::Deserialize, key, || {
            let mut pass = DeserializePass::new(&self.settings, &self.contracts, &self.converters);
            let object = pass.read_fields(source, key)?;
            Ok((object, pass.fields_read()))
        })
    }

    /// Deserializes a JSON object into an existing instance.
    pub fn populate(&self, raw: &Value, object: &ObjectRef) -> Result<()> {
        self.instrumented(PassKind::Populate, object.type_key(), || {
            let mut pass = DeserializePass::new(&self.settings, &self.contracts, &self.converters);
            pass.populate_root(raw, object)?;
            Ok(((), pass.fields_read()))
        })
    }

    fn instrumented<R>(
        &self,
        pass: PassKind,
        key: TypeKey,
        run: impl FnOnce() -> Result<(R, usize)>,
    ) -> Result<R> {
        let type_name = self
            .contracts
            .get(key)
            .map_or_else(|| key.short_name().to_string(), |c| c.type_name.clone());
        let attributes = PassSpanAttributes::new(pass, type_name);
        self.emitter.pass_started(&attributes);

        let timer = SpanTimer::start();
        match run() {
            Ok((result, fields)) => {
                self.emitter
                    .pass_finished(&attributes.finished(fields, timer.elapsed_ms()));
                Ok(result)
            }
            Err(err) => {
                self.emitter.pass_failed(&attributes.failed(err.to_string()));
                Err(err)
            }
        }
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("settings", &self.settings)
            .field("contracts", &self.contracts)
            .field("converters", &self.converters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::PolicyTier;
    use crate::core::{NullValueHandling, Required};
    use crate::errors::ContractError;
    use crate::testing::{person_contract, Person};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recording {
        ends: Mutex<Vec<HashMap<String, String>>>,
        errors: Mutex<Vec<String>>,
    }

    impl TracingEmitter for Recording {
        fn pass_started(&self, _attributes: &PassSpanAttributes) {}

        fn pass_finished(&self, attributes: &PassSpanAttributes) {
            self.ends.lock().push(attributes.to_otel_attributes());
        }

        fn pass_failed(&self, attributes: &PassSpanAttributes) {
            self.errors
                .lock()
                .push(attributes.error.clone().unwrap_or_default());
        }
    }

    #[test]
    fn test_emits_pass_spans() {
        let recording = Arc::new(Recording::default());
        let serializer = Serializer::default().with_emitter(recording.clone());
        serializer.register(person_contract()).unwrap();

        let ada = ObjectRef::new(Person::new("Ada", 36));
        serializer.serialize(&ada).unwrap();

        let ends = recording.ends.lock();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].get("pass.name"), Some(&"serialize".to_string()));
        assert_eq!(ends[0].get("pass.type_name"), Some(&"Person".to_string()));
        assert_eq!(ends[0].get("pass.fields"), Some(&"3".to_string()));
    }

    #[test]
    fn test_unknown_type_reports_error_span() {
        let recording = Arc::new(Recording::default());
        let serializer = Serializer::default().with_emitter(recording.clone());

        let err = serializer.serialize(&ObjectRef::new(Person::new("Ada", 36))).unwrap_err();
        assert!(matches!(err, ContractError::Configuration(_)));
        assert_eq!(recording.errors.lock().len(), 1);
    }

    #[test]
    fn test_effective_policy_lookup() {
        let serializer = Serializer::new(
            SerializerSettings::new().with_null_value_handling(NullValueHandling::Ignore),
        );
        serializer.register(person_contract()).unwrap();

        let policy = serializer
            .effective_policy(TypeKey::of::<Person>(), "name")
            .unwrap();
        assert_eq!(policy.required.value, Required::Always);
        assert_eq!(policy.required.tier, PolicyTier::Member);
        assert_eq!(policy.null_value_handling.value, NullValueHandling::Ignore);
        assert_eq!(policy.null_value_handling.tier, PolicyTier::Global);

        assert!(serializer
            .effective_policy(TypeKey::of::<Person>(), "missing")
            .is_none());
    }

    #[test]
    fn test_serialize_value() {
        let serializer = Serializer::default();
        let value = MemberValue::List(vec![MemberValue::Int(1), MemberValue::Null]);
        let encoded = serializer
            .serialize_value(&value, &DeclaredType::list_of(DeclaredType::Integer))
            .unwrap();
        assert_eq!(encoded, serde_json::json!([1, null]));
    }
}
