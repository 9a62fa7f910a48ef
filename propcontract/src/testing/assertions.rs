//! Assertions over serialized objects.

use serde_json::Value;

/// Asserts that `field` is not present on the serialized object.
pub fn assert_field_absent(object: &Value, field: &str) {
    assert!(
        object.get(field).is_none(),
        "Expected field '{}' to be absent, got {:?}",
        field,
        object.get(field)
    );
}

/// Asserts that `field` is present with the expected value.
pub fn assert_field_eq(object: &Value, field: &str, expected: &Value) {
    let actual = object.get(field);
    assert_eq!(
        actual,
        Some(expected),
        "Expected value {:?} for field '{}', got {:?}",
        expected,
        field,
        actual
    );
}

/// Asserts that the serialized object has exactly these field names.
pub fn assert_fields(object: &Value, expected: &[&str]) {
    let mut actual: Vec<&str> = object
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default();
    actual.sort_unstable();

    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(actual, expected, "Field names differ");
}
