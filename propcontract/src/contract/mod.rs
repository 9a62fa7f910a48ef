//! Property and type contracts.
//!
//! This module provides:
//! - The per-member `PropertyContract` record
//! - Type-level contracts with type-wide policy defaults
//! - Three-tier effective-policy resolution
//! - A registry that contract resolution publishes into

mod property;
mod registry;
mod resolver;
mod type_contract;

pub use property::{PropertyContract, ShouldSerialize};
pub use registry::ContractRegistry;
pub use resolver::{resolve, EffectivePolicy, PolicyResolver, PolicyTier, Resolved};
pub use type_contract::{InstanceFactory, TypeContract, TypeDefaults};
