//! Converter lookup by declared type, and per-member converter selection.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

use super::ConverterBinding;
use crate::contract::PropertyContract;
use crate::core::DeclaredType;

/// Converters registered for declared types.
///
/// Exact registrations win over fallback converters, which are consulted
/// in registration order through [`super::Converter::can_convert`].
#[derive(Default)]
pub struct ConverterRegistry {
    exact: RwLock<HashMap<DeclaredType, ConverterBinding>>,
    fallbacks: RwLock<Vec<ConverterBinding>>,
}

impl ConverterRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `converter` to exactly `declared`, replacing any previous binding.
    pub fn register(&self, declared: DeclaredType, converter: ConverterBinding) {
        self.exact.write().insert(declared, converter);
    }

    /// Adds a converter consulted for any type it claims.
    pub fn register_fallback(&self, converter: ConverterBinding) {
        self.fallbacks.write().push(converter);
    }

    /// The converter that governs values declared as `declared`, if any.
    #[must_use]
    pub fn lookup(&self, declared: &DeclaredType) -> Option<ConverterBinding> {
        if let Some(found) = self.exact.read().get(declared) {
            return Some(found.clone());
        }
        self.fallbacks
            .read()
            .iter()
            .find(|c| c.can_convert(declared))
            .cloned()
    }

    /// Returns the number of exact registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exact.read().is_empty() && self.fallbacks.read().is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("exact", &self.exact.read().len())
            .field("fallbacks", &self.fallbacks.read().len())
            .finish()
    }
}

/// Picks the converter for one member.
///
/// The property's own converter wins over the registry entry for its
/// declared type; `None` means the default encoding rules apply.
#[must_use]
pub fn select_converter(
    property: &PropertyContract,
    registry: &ConverterRegistry,
) -> Option<ConverterBinding> {
    property
        .converter
        .clone()
        .or_else(|| registry.lookup(&property.declared_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{StringifyConverter, TimestampConverter};
    use std::sync::Arc;

    #[test]
    fn test_lookup_exact_before_fallback() {
        let registry = ConverterRegistry::new();
        registry.register_fallback(Arc::new(StringifyConverter));
        registry.register(DeclaredType::Integer, Arc::new(TimestampConverter));

        let found = registry.lookup(&DeclaredType::Integer).unwrap();
        assert_eq!(found.name(), "timestamp");

        let found = registry.lookup(&DeclaredType::Bool).unwrap();
        assert_eq!(found.name(), "stringify");

        assert!(registry.lookup(&DeclaredType::Any).is_none());
    }

    #[test]
    fn test_select_converter_precedence() {
        let registry = ConverterRegistry::new();
        registry.register(DeclaredType::Integer, Arc::new(TimestampConverter));

        let plain = PropertyContract::new("created", DeclaredType::Integer);
        assert_eq!(select_converter(&plain, &registry).unwrap().name(), "timestamp");

        let overridden = PropertyContract::new("created", DeclaredType::Integer)
            .with_converter(Arc::new(StringifyConverter));
        assert_eq!(select_converter(&overridden, &registry).unwrap().name(), "stringify");

        let untouched = PropertyContract::new("name", DeclaredType::String);
        assert!(select_converter(&untouched, &registry).is_none());
    }

    #[test]
    fn test_registry_len() {
        let registry = ConverterRegistry::new();
        assert!(registry.is_empty());
        registry.register(DeclaredType::Float, Arc::new(StringifyConverter));
        assert_eq!(registry.len(), 1);
    }
}
