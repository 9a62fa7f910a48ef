//! Core value model.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Member values and shared object handles
//! - Runtime type keys and declared member types
//! - Policy enums carried by contracts and settings

mod policy;
mod types;
mod value;

pub use policy::{
    DefaultValueHandling, NullValueHandling, ObjectCreationHandling, ReferenceLoopHandling,
    Required, TypeNameHandling,
};
pub use types::{DeclaredType, TypeKey};
pub use value::{Instance, MemberType, MemberValue, ObjectRef};
