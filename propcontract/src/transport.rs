//! Field-level transport between the passes and the external document.
//!
//! The passes never tokenize. They emit and consume whole fields; a
//! transport decides how those fields are framed.

use serde_json::{Map, Value};

/// Receives the fields of one object during serialization.
pub trait FieldSink {
    /// Writes one field. Later writes of the same name replace earlier ones.
    fn write_field(&mut self, name: &str, value: Value);
}

impl FieldSink for Map<String, Value> {
    fn write_field(&mut self, name: &str, value: Value) {
        self.insert(name.to_string(), value);
    }
}

impl FieldSink for Vec<(String, Value)> {
    fn write_field(&mut self, name: &str, value: Value) {
        self.push((name.to_string(), value));
    }
}

/// Yields the fields of one object during deserialization.
pub trait FieldSource {
    /// Next field, or `None` at the end of the object.
    fn next_field(&mut self) -> Option<(String, Value)>;
}

/// A [`FieldSource`] over an in-memory JSON object.
#[derive(Debug)]
pub struct MapFieldSource {
    fields: std::vec::IntoIter<(String, Value)>,
}

impl MapFieldSource {
    /// Creates a source over the entries of `map`, in map order.
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl FieldSource for MapFieldSource {
    fn next_field(&mut self) -> Option<(String, Value)> {
        self.fields.next()
    }
}

impl FieldSource for std::vec::IntoIter<(String, Value)> {
    fn next_field(&mut self) -> Option<(String, Value)> {
        self.next()
    }
}
