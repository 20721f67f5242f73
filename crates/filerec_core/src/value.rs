//! Value comparison helpers.
//!
//! One documented equality rule is used everywhere values meet:
//! primary-key lookups, uniqueness scans, and query filtering. It is
//! strict JSON equality with a single loosening: a number and a
//! numeric string compare by numeric value, so a record stored under
//! document key `"7"` is found by `find(json!(7))`.

use serde_json::Value;
use std::cmp::Ordering;

/// Returns `true` if a value counts as empty for validation purposes.
///
/// Empty means JSON `null` or the empty string. Numeric zero and
/// `false` are values, not absences.
#[must_use]
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Compares two values for equality, normalizing number-vs-string.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Orders two values, if they are comparable.
///
/// Numbers (and numeric strings) compare numerically; strings compare
/// lexicographically; anything else is incomparable and every ordering
/// filter rejects it.
#[must_use]
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    None
}

/// Extracts a numeric interpretation of a value.
///
/// Numbers pass through; strings are parsed. Everything else is
/// non-numeric.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extracts an integer interpretation of a value, truncating floats.
#[must_use]
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Renders a primary-key value as a document key.
///
/// Strings are used as-is; everything else uses its JSON rendering
/// (so the integer `7` becomes the key `"7"`).
#[must_use]
pub fn to_key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emptiness() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("")));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!("x")));
    }

    #[test]
    fn strict_equality() {
        assert!(values_equal(&json!("a"), &json!("a")));
        assert!(!values_equal(&json!("a"), &json!("b")));
        assert!(values_equal(&json!(2), &json!(2)));
        assert!(!values_equal(&json!(true), &json!(1)));
    }

    #[test]
    fn numeric_string_normalization() {
        assert!(values_equal(&json!(42), &json!("42")));
        assert!(values_equal(&json!("42"), &json!(42)));
        assert!(!values_equal(&json!("42x"), &json!(42)));
    }

    #[test]
    fn ordering() {
        assert_eq!(compare(&json!(1), &json!(2)), Some(Ordering::Less));
        assert_eq!(compare(&json!("10"), &json!(9)), Some(Ordering::Greater));
        assert_eq!(compare(&json!("abc"), &json!("abd")), Some(Ordering::Less));
        assert_eq!(compare(&json!(null), &json!(1)), None);
    }

    #[test]
    fn key_strings() {
        assert_eq!(to_key_string(&json!(7)), "7");
        assert_eq!(to_key_string(&json!("user-7")), "user-7");
    }

    #[test]
    fn integer_extraction() {
        assert_eq!(as_i64(&json!(3)), Some(3));
        assert_eq!(as_i64(&json!("3")), Some(3));
        assert_eq!(as_i64(&json!(null)), None);
    }
}
