//! Registry of type contracts produced by contract resolution.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::TypeContract;
use crate::core::TypeKey;
use crate::errors::ConfigurationError;

/// In-memory registry of type contracts, keyed by runtime type and by
/// discriminator name.
///
/// Contracts are published once and read by many passes. Customization
/// hooks replace a contract wholesale, so passes never observe a
/// half-edited contract.
#[derive(Default)]
pub struct ContractRegistry {
    by_key: RwLock<HashMap<TypeKey, Arc<TypeContract>>>,
    by_name: RwLock<HashMap<String, TypeKey>>,
}

impl ContractRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all registered contracts.
    pub fn clear(&self) {
        self.by_key.write().clear();
        self.by_name.write().clear();
    }

    /// Validates and publishes a contract, replacing any previous contract
    /// for the same type.
    pub fn register(&self, contract: TypeContract) -> Result<Arc<TypeContract>, ConfigurationError> {
        contract.validate()?;
        let key = contract.type_key();

        let mut by_key = self.by_key.write();
        let mut by_name = self.by_name.write();
        if let Some(existing) = by_name.get(&contract.type_name) {
            if *existing != key {
                return Err(ConfigurationError::duplicate_type_name(&contract.type_name));
            }
        }
        if let Some(previous) = by_key.get(&key) {
            by_name.remove(&previous.type_name);
        }

        let contract = Arc::new(contract);
        by_name.insert(contract.type_name.clone(), key);
        by_key.insert(key, Arc::clone(&contract));
        tracing::debug!(
            type_name = %contract.type_name,
            properties = contract.properties.len(),
            "Registered type contract"
        );
        Ok(contract)
    }

    /// Runs a customization hook against a registered contract, then
    /// re-validates and republishes it.
    pub fn customize<F>(&self, key: TypeKey, hook: F) -> Result<Arc<TypeContract>, ConfigurationError>
    where
        F: FnOnce(&mut TypeContract),
    {
        let mut contract = self.require(key)?.as_ref().clone();
        hook(&mut contract);
        self.register(contract)
    }

    /// Contract for a runtime type.
    #[must_use]
    pub fn get(&self, key: TypeKey) -> Option<Arc<TypeContract>> {
        self.by_key.read().get(&key).cloned()
    }

    /// Contract for a runtime type, or a configuration error.
    pub fn require(&self, key: TypeKey) -> Result<Arc<TypeContract>, ConfigurationError> {
        self.get(key)
            .ok_or_else(|| ConfigurationError::unknown_type(key.short_name()))
    }

    /// Contract registered under a discriminator name.
    #[must_use]
    pub fn get_by_name(&self, type_name: &str) -> Option<Arc<TypeContract>> {
        let key = *self.by_name.read().get(type_name)?;
        self.get(key)
    }

    /// Discriminator names of every registered contract, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.read().len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.read().is_empty()
    }
}

impl fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("types", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::PropertyContract;
    use crate::core::{DeclaredType, NullValueHandling};
    use crate::errors::codes;

    struct Alpha;
    struct Beta;

    #[test]
    fn test_register_and_get() {
        let registry = ContractRegistry::new();
        registry.register(TypeContract::new::<Alpha>()).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(TypeKey::of::<Alpha>()).is_some());
        assert!(registry.get(TypeKey::of::<Beta>()).is_none());
        assert_eq!(
            registry.get_by_name("Alpha").unwrap().type_key(),
            TypeKey::of::<Alpha>()
        );
    }

    #[test]
    fn test_clear_forgets_keys_and_names() {
        let registry = ContractRegistry::new();
        registry.register(TypeContract::new::<Alpha>()).unwrap();
        registry.register(TypeContract::new::<Beta>().with_name("b")).unwrap();

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get(TypeKey::of::<Alpha>()).is_none());
        assert!(registry.get_by_name("b").is_none());

        // A cleared name can be taken by another type.
        registry.register(TypeContract::new::<Alpha>().with_name("b")).unwrap();
        assert_eq!(registry.get_by_name("b").unwrap().type_key(), TypeKey::of::<Alpha>());
    }

    #[test]
    fn test_register_rejects_invalid_contract() {
        let registry = ContractRegistry::new();
        let contract = TypeContract::new::<Alpha>()
            .with_property(PropertyContract::new("x", DeclaredType::Integer).with_writable(true));

        let err = registry.register(contract).unwrap_err();
        assert_eq!(err.error_info.code, codes::MISSING_ACCESSOR);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate_type_name() {
        let registry = ContractRegistry::new();
        registry
            .register(TypeContract::new::<Alpha>().with_name("shared"))
            .unwrap();

        let err = registry
            .register(TypeContract::new::<Beta>().with_name("shared"))
            .unwrap_err();
        assert_eq!(err.error_info.code, codes::DUPLICATE_TYPE_NAME);
    }

    #[test]
    fn test_reregister_renames() {
        let registry = ContractRegistry::new();
        registry.register(TypeContract::new::<Alpha>()).unwrap();
        registry
            .register(TypeContract::new::<Alpha>().with_name("alpha.v2"))
            .unwrap();

        assert!(registry.get_by_name("Alpha").is_none());
        assert!(registry.get_by_name("alpha.v2").is_some());
        assert_eq!(registry.list(), vec!["alpha.v2".to_string()]);
    }

    #[test]
    fn test_customize_republishes() {
        let registry = ContractRegistry::new();
        let original = registry
            .register(
                TypeContract::new::<Alpha>()
                    .with_property(PropertyContract::new("note", DeclaredType::String)),
            )
            .unwrap();

        let customized = registry
            .customize(TypeKey::of::<Alpha>(), |contract| {
                if let Some(note) = contract.property_mut("note") {
                    note.null_value_handling = Some(NullValueHandling::Ignore);
                }
            })
            .unwrap();

        assert!(original.property("note").unwrap().null_value_handling.is_none());
        assert_eq!(
            customized.property("note").unwrap().null_value_handling,
            Some(NullValueHandling::Ignore)
        );
        assert_eq!(
            registry
                .get(TypeKey::of::<Alpha>())
                .unwrap()
                .property("note")
                .unwrap()
                .null_value_handling,
            Some(NullValueHandling::Ignore)
        );
    }

    #[test]
    fn test_customize_unknown_type() {
        let registry = ContractRegistry::new();
        let err = registry.customize(TypeKey::of::<Beta>(), |_| {}).unwrap_err();
        assert_eq!(err.error_info.code, codes::UNKNOWN_TYPE);
    }
}
