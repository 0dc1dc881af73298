//! Body matching for interaction request matchers.
//!
//! The recorded body is a partial template: every key present in it must be
//! present with an equal value in the request body, recursively, while extra
//! keys on the request are permitted. Arrays are compared element-wise and
//! scalars are strictly typed unless [`BodyMatchOptions`] relaxes either.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Tunables for body comparison.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BodyMatchOptions {
    /// Treat arrays as unordered collections (lengths must still agree)
    #[serde(default)]
    pub ignore_array_order: bool,
    /// Compare scalars by their string form, so `1` equals `"1"`
    #[serde(default)]
    pub coerce_scalars: bool,
}

/// Check whether a raw request body satisfies the expected body.
///
/// A request body that is not JSON can only match a string expectation,
/// compared against the body text.
pub fn body_matches(expected: &Value, actual: &[u8], options: BodyMatchOptions) -> bool {
    let text = String::from_utf8_lossy(actual);

    if let Value::String(expected_text) = expected {
        if *expected_text == text {
            return true;
        }
    }

    match serde_json::from_slice::<Value>(actual) {
        Ok(actual_json) => json_partial_match(expected, &actual_json, options),
        Err(_) => false,
    }
}

/// Recursive partial structural comparison of two JSON values.
pub fn json_partial_match(expected: &Value, actual: &Value, options: BodyMatchOptions) -> bool {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => e.iter().all(|(key, expected_value)| {
            a.get(key)
                .is_some_and(|actual_value| json_partial_match(expected_value, actual_value, options))
        }),
        (Value::Array(e), Value::Array(a)) => {
            if e.len() != a.len() {
                return false;
            }
            if options.ignore_array_order {
                unordered_match(e, a, options)
            } else {
                e.iter()
                    .zip(a)
                    .all(|(x, y)| json_partial_match(x, y, options))
            }
        }
        (Value::Number(e), Value::Number(a)) => numbers_equal(e, a),
        (e, a) if options.coerce_scalars && is_scalar(e) && is_scalar(a) => {
            scalar_text(e) == scalar_text(a)
        }
        (e, a) => e == a,
    }
}

/// Integers compare exactly; floats only come into play when either side is one.
fn numbers_equal(expected: &Number, actual: &Number) -> bool {
    if let (Some(x), Some(y)) = (expected.as_i64(), actual.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (expected.as_u64(), actual.as_u64()) {
        return x == y;
    }
    if expected.is_f64() || actual.is_f64() {
        return matches!((expected.as_f64(), actual.as_f64()), (Some(x), Some(y)) if x == y);
    }
    false
}

/// Each expected element must claim a distinct actual element.
fn unordered_match(expected: &[Value], actual: &[Value], options: BodyMatchOptions) -> bool {
    let mut claimed = vec![false; actual.len()];
    expected.iter().all(|e| {
        let slot = actual
            .iter()
            .enumerate()
            .position(|(i, a)| !claimed[i] && json_partial_match(e, a, options));
        match slot {
            Some(i) => {
                claimed[i] = true;
                true
            }
            None => false,
        }
    })
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
