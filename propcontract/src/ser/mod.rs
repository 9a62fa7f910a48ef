//! Serialization: the read path over instances and the facade that runs
//! both passes.
//!
//! Reserved field names carry pass metadata next to an object's own
//! fields: `$id` and `$ref` for preserved references, `$type` for the
//! runtime type discriminator.

mod chain;
mod pass;
mod serializer;


pub use serializer::Serializer;

/// Identifier of a preserved object.
pub const ID_FIELD: &str = "$id";
/// Reference to a previously written object.
pub const REF_FIELD: &str = "$ref";
/// Runtime type discriminator.
pub const TYPE_FIELD: &str = "$type";
