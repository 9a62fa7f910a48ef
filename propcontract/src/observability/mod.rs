//! Observability utilities.

mod logging;
mod tracing;

pub use logging::init_logging;
pub use self::tracing::{
    LoggingTracingEmitter, NoOpTracingEmitter, PassKind, PassSpanAttributes, SpanTimer,
    TracingEmitter,
};
