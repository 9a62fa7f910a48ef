//! Converters.
//!
//! This module provides:
//! - The converter trait and shared bindings
//! - A registry keyed by declared type
//! - Converter selection for one member
//! - Default scalar encoding rules

pub mod codec;
mod converter;
mod registry;

pub use converter::{Converter, ConverterBinding, StringifyConverter, TimestampConverter};
pub use registry::{select_converter, ConverterRegistry};
