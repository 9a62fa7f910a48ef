//! Deserialization: the write path into instances.

mod deserializer;
mod extension;

pub(crate) use deserializer::DeserializePass;
pub use extension::{CollectExtensionData, ExtensionDataHandler};
