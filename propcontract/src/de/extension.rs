//! Extension data: input fields that match no property.

use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;

use crate::core::Instance;
use crate::errors::AccessError;

/// Stores unmatched input fields on an instance and hands them back when
/// the instance is serialized.
pub trait ExtensionDataHandler: Send + Sync {
    /// Stores one unmatched field.
    fn write(&self, instance: &mut Instance, name: &str, value: Value) -> Result<(), AccessError>;

    /// Fields to emit after the declared properties.
    fn read(&self, _instance: &Instance) -> Result<Vec<(String, Value)>, AccessError> {
        Ok(Vec::new())
    }
}

type MapGetter<T> = Box<dyn Fn(&T) -> &Map<String, Value> + Send + Sync>;
type MapSetter<T> = Box<dyn Fn(&mut T) -> &mut Map<String, Value> + Send + Sync>;

/// Collects extension data into a JSON map member of `T`.
pub struct CollectExtensionData<T> {
    read: MapGetter<T>,
    write: MapSetter<T>,
}

impl<T: Any + Send + Sync> CollectExtensionData<T> {
    /// Binds the handler to the map member projected by `read` / `write`.
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn(&T) -> &Map<String, Value> + Send + Sync + 'static,
        W: Fn(&mut T) -> &mut Map<String, Value> + Send + Sync + 'static,
    {
        Self {
            read: Box::new(read),
            write: Box::new(write),
        }
    }
}

impl<T: Any + Send + Sync> ExtensionDataHandler for CollectExtensionData<T> {
    fn write(&self, instance: &mut Instance, name: &str, value: Value) -> Result<(), AccessError> {
        let target = instance
            .downcast_mut::<T>()
            .ok_or_else(|| AccessError::shape_mismatch(std::any::type_name::<T>()))?;
        (self.write)(target).insert(name.to_string(), value);
        Ok(())
    }

    fn read(&self, instance: &Instance) -> Result<Vec<(String, Value)>, AccessError> {
        let source = instance
            .downcast_ref::<T>()
            .ok_or_else(|| AccessError::shape_mismatch(std::any::type_name::<T>()))?;
        Ok((self.read)(source)
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }
}

impl<T> fmt::Debug for CollectExtensionData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectExtensionData")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
