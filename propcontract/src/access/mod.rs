//! Member access.
//!
//! Accessors hide how a member is reached: a typed struct field, an entry of
//! a schemaless record, or a user-supplied getter/setter pair.

mod accessor;

pub use accessor::{DynamicObject, FieldAccessor, KeyedAccessor, SharedAccessor, ValueAccessor};
