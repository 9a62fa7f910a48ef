//! # Propcontract
//!
//! Property contracts for structured-data serialization.
//!
//! A property contract describes how one member of an in-memory object maps
//! to one field of a JSON-like document:
//!
//! - **Identity and access**: external name, declared type, value accessor
//! - **Capability flags**: ignored, readable, writable
//! - **Policy overrides**: null, default value, required, reference loop,
//!   object creation and type name handling
//! - **Three-tier resolution**: member, then type, then serializer settings
//!
//! The [`ser::Serializer`] consumes registered contracts to read objects
//! into `serde_json::Value` documents and to write documents back into
//! objects.
//!
//! ## Quick Start
//!
//! ```rust
//! use propcontract::prelude::*;
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let serializer = Serializer::default();
//! serializer.register(
//!     TypeContract::new::<Person>()
//!         .with_factory(Person::default)
//!         .with_property(
//!             PropertyContract::new("name", DeclaredType::String)
//!                 .with_accessor(FieldAccessor::field(|p: &Person| &p.name, |p| &mut p.name).shared()),
//!         )
//!         .with_property(
//!             PropertyContract::new("age", DeclaredType::Integer)
//!                 .with_accessor(FieldAccessor::field(|p: &Person| &p.age, |p| &mut p.age).shared())
//!                 .with_default_value(0)
//!                 .with_default_value_handling(DefaultValueHandling::Ignore),
//!         ),
//! )?;
//!
//! let ada = ObjectRef::new(Person { name: "Ada".into(), age: 0 });
//! let json = serializer.serialize(&ada)?;
//! assert_eq!(json, serde_json::json!({"name": "Ada"}));
//! # Ok::<(), propcontract::errors::ContractError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod access;
pub mod contract;
pub mod convert;
pub mod core;
pub mod de;
pub mod errors;
pub mod observability;
pub mod ser;
pub mod settings;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::access::{DynamicObject, FieldAccessor, KeyedAccessor, ValueAccessor};
    pub use crate::contract::{
        ContractRegistry, PolicyResolver, PolicyTier, PropertyContract, TypeContract,
        TypeDefaults,
    };
    pub use crate::convert::{
        Converter, ConverterRegistry, StringifyConverter, TimestampConverter,
    };
    pub use crate::core::{
        DeclaredType, DefaultValueHandling, MemberType, MemberValue, NullValueHandling,
        ObjectCreationHandling, ObjectRef, ReferenceLoopHandling, Required, TypeKey,
        TypeNameHandling,
    };
    pub use crate::de::{CollectExtensionData, ExtensionDataHandler};
    pub use crate::errors::{
        AccessError, ConfigurationError, ContractError, ConversionError, DepthLimitError,
        ReferenceLoopError, RequiredMemberMissingError,
    };
    pub use crate::ser::Serializer;
    pub use crate::settings::{NameMatching, SerializerSettings};
    pub use crate::transport::{FieldSink, FieldSource, MapFieldSource};
}
