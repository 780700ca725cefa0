//! Emptiness checks for JSON values.
//!
//! A value is empty when it has no enumerable keys: `{}`, `[]`, and every
//! scalar (including `null`) count as empty. Strings are treated as scalars,
//! not as character sequences, so `is_empty(&json!("ab"))` is `true`. This
//! differs from JavaScript's `Object.keys("ab")`, which yields `["0", "1"]`.

use serde_json::Value;

/// True when `value` has no keys or elements.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => true,
    }
}

/// True when `value` has at least one key or element.
pub fn has_properties(value: &Value) -> bool {
    !is_empty(value)
}
