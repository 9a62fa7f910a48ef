//! Default encoding rules, used when no converter applies.
//!
//! Only scalars are handled here. Lists and objects are walked by the
//! serializer, which calls back into these functions for their leaves.

use crate::core::{DeclaredType, MemberValue};
use crate::errors::ConversionError;

/// Encodes a scalar member value.
pub fn encode_scalar(
    value: &MemberValue,
    declared: &DeclaredType,
) -> Result<serde_json::Value, ConversionError> {
    match value {
        MemberValue::Null => Ok(serde_json::Value::Null),
        MemberValue::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        MemberValue::Int(i) => Ok(serde_json::Value::from(*i)),
        MemberValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| ConversionError::new(declared, format!("{f} is not a finite number"))),
        MemberValue::String(s) => Ok(serde_json::Value::String(s.clone())),
        MemberValue::List(_) | MemberValue::Object(_) => Err(ConversionError::new(
            declared,
            format!("{} is not a scalar", value.kind()),
        )),
    }
}

/// Decodes a scalar external value into `declared`.
///
/// `Any` infers the member value from the JSON shape.
pub fn decode_scalar(
    raw: &serde_json::Value,
    declared: &DeclaredType,
) -> Result<MemberValue, ConversionError> {
    use serde_json::Value;

    let unexpected = || {
        ConversionError::new(
            declared,
            format!("unexpected {} value {raw}", json_kind(raw)),
        )
    };

    match (declared, raw) {
        (_, Value::Null) => Ok(MemberValue::Null),
        (DeclaredType::Bool | DeclaredType::Any, Value::Bool(b)) => Ok(MemberValue::Bool(*b)),
        (DeclaredType::Integer, Value::Number(n)) => integer_from(n).ok_or_else(unexpected),
        (DeclaredType::Float, Value::Number(n)) => n
            .as_f64()
            .map(MemberValue::Float)
            .ok_or_else(unexpected),
        (DeclaredType::Any, Value::Number(n)) => integer_from(n)
            .or_else(|| n.as_f64().map(MemberValue::Float))
            .ok_or_else(unexpected),
        (DeclaredType::String | DeclaredType::Any, Value::String(s)) => {
            Ok(MemberValue::String(s.clone()))
        }
        _ => Err(unexpected()),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integer_from(n: &serde_json::Number) -> Option<MemberValue> {
    if let Some(i) = n.as_i64() {
        return Some(MemberValue::Int(i));
    }
    if n.is_u64() {
        return None;
    }
    // Whole floats such as 3.0 are accepted as integers. `i64::MAX as f64`
    // is 2^63, one past the range, so the upper bound is exclusive.
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
        .then(|| MemberValue::Int(f as i64))
}

/// Name of a JSON value's shape, for diagnostics.
#[must_use]
pub fn json_kind(raw: &serde_json::Value) -> &'static str {
    match raw {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(
            encode_scalar(&MemberValue::Int(5), &DeclaredType::Integer).unwrap(),
            json!(5)
        );
        assert_eq!(
            encode_scalar(&MemberValue::Null, &DeclaredType::String).unwrap(),
            json!(null)
        );
        assert_eq!(
            encode_scalar(&MemberValue::from("hi"), &DeclaredType::String).unwrap(),
            json!("hi")
        );
    }

    #[test]
    fn test_encode_rejects_nan() {
        let err = encode_scalar(&MemberValue::Float(f64::NAN), &DeclaredType::Float).unwrap_err();
        assert!(err.message.contains("finite"));
    }

    #[test]
    fn test_decode_by_declared_type() {
        assert_eq!(
            decode_scalar(&json!(3), &DeclaredType::Float).unwrap(),
            MemberValue::Float(3.0)
        );
        assert_eq!(
            decode_scalar(&json!(3.0), &DeclaredType::Integer).unwrap(),
            MemberValue::Int(3)
        );
        assert!(decode_scalar(&json!(3.5), &DeclaredType::Integer).is_err());
        assert!(decode_scalar(&json!("3"), &DeclaredType::Integer).is_err());
        assert_eq!(
            decode_scalar(&json!(null), &DeclaredType::Integer).unwrap(),
            MemberValue::Null
        );
    }

    #[test]
    fn test_decode_integer_range_edges() {
        assert_eq!(
            decode_scalar(&json!(i64::MAX), &DeclaredType::Integer).unwrap(),
            MemberValue::Int(i64::MAX)
        );
        assert_eq!(
            decode_scalar(&json!(i64::MIN), &DeclaredType::Integer).unwrap(),
            MemberValue::Int(i64::MIN)
        );
        let one_past: serde_json::Value = serde_json::from_str("9223372036854775808").unwrap();
        assert!(decode_scalar(&one_past, &DeclaredType::Integer).is_err());
        assert!(decode_scalar(&json!(9.223_372_036_854_776e18), &DeclaredType::Integer).is_err());
        assert!(decode_scalar(&json!(1e19), &DeclaredType::Integer).is_err());
        assert_eq!(
            decode_scalar(&json!(-9.223_372_036_854_776e18), &DeclaredType::Integer).unwrap(),
            MemberValue::Int(i64::MIN)
        );
    }

    #[test]
    fn test_decode_any_infers_shape() {
        assert_eq!(decode_scalar(&json!(7), &DeclaredType::Any).unwrap(), MemberValue::Int(7));
        assert_eq!(
            decode_scalar(&json!(0.5), &DeclaredType::Any).unwrap(),
            MemberValue::Float(0.5)
        );
        assert_eq!(
            decode_scalar(&json!(true), &DeclaredType::Any).unwrap(),
            MemberValue::Bool(true)
        );
    }

    #[test]
    fn test_decode_error_names_type() {
        let err = decode_scalar(&json!([1]), &DeclaredType::String).unwrap_err();
        assert_eq!(err.declared_type, "string");
        assert!(err.message.contains("array"));
    }
}
