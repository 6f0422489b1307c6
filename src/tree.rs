//! Safe navigation over untyped NerdGraph/REST response trees.
//!
//! Responses are shape-variable: optional fields, union types, server-side
//! schema drift. Container lookups return a [`Error::Shape`] naming the first
//! missing key so diagnostics stay actionable; leaf scalar accessors degrade
//! to zero values instead, which makes "absent" and "present-but-default"
//! indistinguishable at those call sites.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Looks up `key` in `object` and requires the value to be an object.
pub fn object_at<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Map<String, Value>> {
    object
        .get(key)
        .and_then(Value::as_object)
        .ok_or(Error::Shape { key })
}

/// Looks up `key` in `object` and requires the value to be a list.
pub fn list_at<'a>(object: &'a Map<String, Value>, key: &'static str) -> Result<&'a [Value]> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(Error::Shape { key })
}

/// Tolerant object view of any node; `None` for every non-object including
/// null. Used by the skip-malformed-element loops.
pub fn as_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

/// Tolerant list view of any node.
pub fn as_list(value: &Value) -> Option<&[Value]> {
    value.as_array().map(Vec::as_slice)
}

/// Returns the string under `key`, or "" for an absent or non-string value.
pub fn string_of(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Returns the number under `key` truncated to an integer, or 0 for an absent
/// or non-numeric value. JSON numbers arrive as floating point.
pub fn int_of(object: &Map<String, Value>, key: &str) -> i64 {
    match object.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Returns the bool under `key`, or false for anything else.
pub fn bool_of(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}
