//! Span helpers for serialization passes.
//!
//! Passes report their start, end and failure through a [`TracingEmitter`],
//! so callers can route pass timings into whatever tracing backend they use.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Which pass a span covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Object graph to document.
    Serialize,
    /// Document to a new object graph.
    Deserialize,
    /// Document into an existing instance.
    Populate,
}

impl PassKind {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serialize => "serialize",
            Self::Deserialize => "deserialize",
            Self::Populate => "populate",
        }
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Span attributes for one pass over one root type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSpanAttributes {
    /// The pass.
    pub pass: PassKind,
    /// Discriminator name of the root type.
    pub type_name: String,
    /// Members written or read, once the pass has finished.
    pub fields: Option<usize>,
    /// Duration in milliseconds, once the pass has finished.
    pub duration_ms: Option<f64>,
    /// Error message if the pass failed.
    pub error: Option<String>,
}

impl PassSpanAttributes {
    /// Attributes of a pass that has just started.
    #[must_use]
    pub fn new(pass: PassKind, type_name: impl Into<String>) -> Self {
        Self {
            pass,
            type_name: type_name.into(),
            fields: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Records a successful finish.
    #[must_use]
    pub fn finished(mut self, fields: usize, duration_ms: f64) -> Self {
        self.fields = Some(fields);
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Records a failure.
    #[must_use]
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Flat OpenTelemetry-style attributes under the `pass.` prefix.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let optional = [
            ("pass.fields", self.fields.map(|n| n.to_string())),
            ("pass.duration_ms", self.duration_ms.map(|ms| ms.to_string())),
            ("pass.error", self.error.clone()),
        ];
        [
            ("pass.name", Some(self.pass.to_string())),
            ("pass.type_name", Some(self.type_name.clone())),
        ]
        .into_iter()
        .chain(optional)
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
    }
}

/// Wall-clock timer for one pass.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
}

impl SpanTimer {
    /// Starts timing now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since start.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Receives pass span events.
pub trait TracingEmitter: Send + Sync {
    /// A pass started.
    fn pass_started(&self, attributes: &PassSpanAttributes);

    /// A pass finished; `fields` and `duration_ms` are set.
    fn pass_finished(&self, attributes: &PassSpanAttributes);

    /// A pass failed; `error` is set.
    fn pass_failed(&self, attributes: &PassSpanAttributes);
}

/// Discards every span event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTracingEmitter;

impl TracingEmitter for NoOpTracingEmitter {
    fn pass_started(&self, _attributes: &PassSpanAttributes) {}
    fn pass_finished(&self, _attributes: &PassSpanAttributes) {}
    fn pass_failed(&self, _attributes: &PassSpanAttributes) {}
}

/// Forwards span events to `tracing` as structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTracingEmitter;

impl TracingEmitter for LoggingTracingEmitter {
    fn pass_started(&self, attributes: &PassSpanAttributes) {
        tracing::debug!(pass = %attributes.pass, type_name = %attributes.type_name, "Pass started");
    }

    fn pass_finished(&self, attributes: &PassSpanAttributes) {
        tracing::info!(
            pass = %attributes.pass,
            type_name = %attributes.type_name,
            fields = attributes.fields.unwrap_or_default(),
            duration_ms = attributes.duration_ms.unwrap_or_default(),
            "Pass finished"
        );
    }

    fn pass_failed(&self, attributes: &PassSpanAttributes) {
        tracing::error!(
            pass = %attributes.pass,
            type_name = %attributes.type_name,
            error = attributes.error.as_deref().unwrap_or("unknown"),
            "Pass failed"
        );
    }
}
