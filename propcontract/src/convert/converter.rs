//! Converter trait and the built-in converters.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::sync::Arc;

use crate::core::{DeclaredType, MemberValue};
use crate::errors::ConversionError;

/// Encodes and decodes member values for one or more declared types.
///
/// Converters are shared across contracts and concurrent passes, so they
/// must be stateless or synchronize internally. Null values never reach a
/// converter: the pass writes and reads `null` itself.
pub trait Converter: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether this converter handles values declared as `declared`.
    fn can_convert(&self, declared: &DeclaredType) -> bool;

    /// Encodes a non-null value.
    fn encode(
        &self,
        value: &MemberValue,
        declared: &DeclaredType,
    ) -> Result<serde_json::Value, ConversionError>;

    /// Decodes a non-null external value.
    fn decode(
        &self,
        raw: &serde_json::Value,
        declared: &DeclaredType,
    ) -> Result<MemberValue, ConversionError>;
}

/// A converter bound to a property or registered for a declared type.
pub type ConverterBinding = Arc<dyn Converter>;

/// Writes scalars as JSON strings and parses them back.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringifyConverter;

impl Converter for StringifyConverter {
    fn name(&self) -> &str {
        "stringify"
    }

    fn can_convert(&self, declared: &DeclaredType) -> bool {
        matches!(
            declared,
            DeclaredType::Bool | DeclaredType::Integer | DeclaredType::Float | DeclaredType::String
        )
    }

    fn encode(
        &self,
        value: &MemberValue,
        declared: &DeclaredType,
    ) -> Result<serde_json::Value, ConversionError> {
        let text = match value {
            MemberValue::Bool(b) => b.to_string(),
            MemberValue::Int(i) => i.to_string(),
            MemberValue::Float(f) => f.to_string(),
            MemberValue::String(s) => s.clone(),
            other => {
                return Err(ConversionError::new(
                    declared,
                    format!("cannot stringify a {} value", other.kind()),
                ))
            }
        };
        Ok(serde_json::Value::String(text))
    }

    fn decode(
        &self,
        raw: &serde_json::Value,
        declared: &DeclaredType,
    ) -> Result<MemberValue, ConversionError> {
        let text = raw
            .as_str()
            .ok_or_else(|| ConversionError::new(declared, "expected a string"))?;
        let parsed = match declared {
            DeclaredType::Bool => text.parse().map(MemberValue::Bool).map_err(|e| e.to_string()),
            DeclaredType::Integer => text.parse().map(MemberValue::Int).map_err(|e| e.to_string()),
            DeclaredType::Float => text.parse().map(MemberValue::Float).map_err(|e| e.to_string()),
            _ => Ok(MemberValue::String(text.to_string())),
        };
        parsed.map_err(|reason| ConversionError::new(declared, format!("'{text}': {reason}")))
    }
}

/// Maps integer unix seconds to RFC 3339 timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampConverter;

impl Converter for TimestampConverter {
    fn name(&self) -> &str {
        "timestamp"
    }

    fn can_convert(&self, declared: &DeclaredType) -> bool {
        matches!(declared, DeclaredType::Integer)
    }

    fn encode(
        &self,
        value: &MemberValue,
        declared: &DeclaredType,
    ) -> Result<serde_json::Value, ConversionError> {
        let MemberValue::Int(seconds) = value else {
            return Err(ConversionError::new(
                declared,
                format!("expected unix seconds, found {}", value.kind()),
            ));
        };
        let moment = DateTime::<Utc>::from_timestamp(*seconds, 0).ok_or_else(|| {
            ConversionError::new(declared, format!("{seconds} is out of range for a timestamp"))
        })?;
        Ok(serde_json::Value::String(
            moment.to_rfc3339_opts(SecondsFormat::Secs, true),
        ))
    }

    fn decode(
        &self,
        raw: &serde_json::Value,
        declared: &DeclaredType,
    ) -> Result<MemberValue, ConversionError> {
        let text = raw
            .as_str()
            .ok_or_else(|| ConversionError::new(declared, "expected an RFC 3339 string"))?;
        let moment = DateTime::parse_from_rfc3339(text)
            .map_err(|e| ConversionError::new(declared, format!("'{text}': {e}")))?;
        Ok(MemberValue::Int(moment.timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stringify_round_trip() {
        let conv = StringifyConverter;
        let encoded = conv.encode(&MemberValue::Int(42), &DeclaredType::Integer).unwrap();
        assert_eq!(encoded, json!("42"));

        let decoded = conv.decode(&encoded, &DeclaredType::Integer).unwrap();
        assert_eq!(decoded, MemberValue::Int(42));
    }

    #[test]
    fn test_stringify_rejects_bad_input() {
        let conv = StringifyConverter;
        assert!(conv.decode(&json!(42), &DeclaredType::Integer).is_err());

        let err = conv.decode(&json!("forty"), &DeclaredType::Integer).unwrap_err();
        assert!(err.message.contains("forty"));
        assert_eq!(err.declared_type, "integer");
    }

    #[test]
    fn test_stringify_can_convert() {
        assert!(StringifyConverter.can_convert(&DeclaredType::Float));
        assert!(!StringifyConverter.can_convert(&DeclaredType::list_of(DeclaredType::Float)));
    }

    #[test]
    fn test_timestamp_encode() {
        let conv = TimestampConverter;
        let encoded = conv
            .encode(&MemberValue::Int(1_700_000_000), &DeclaredType::Integer)
            .unwrap();
        assert_eq!(encoded, json!("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn test_timestamp_decode_with_offset() {
        let conv = TimestampConverter;
        let decoded = conv
            .decode(&json!("2023-11-15T00:13:20+02:00"), &DeclaredType::Integer)
            .unwrap();
        assert_eq!(decoded, MemberValue::Int(1_700_000_000));
    }

    #[test]
    fn test_timestamp_rejects_non_integer() {
        let conv = TimestampConverter;
        assert!(conv.encode(&MemberValue::from("now"), &DeclaredType::Integer).is_err());
        assert!(conv.decode(&json!("yesterday"), &DeclaredType::Integer).is_err());
    }
}
