//! Field lookup utilities
//!
//! Navigates draft snapshots by dotted-path condition fields. A missing key
//! or a path through a non-object yields `Value::Null`, which no operator
//! matches, so the condition fails gracefully.

use fraudwatch_core::Value;
use std::collections::HashMap;

/// Resolve a dotted path (e.g. "location.country") against an object
pub(crate) fn lookup_path(data: &HashMap<String, Value>, path: &str) -> Value {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    get_nested_value(data, &segments)
}

fn get_nested_value(data: &HashMap<String, Value>, path: &[&str]) -> Value {
    let (key, rest) = match path.split_first() {
        Some(parts) => parts,
        None => return Value::Null,
    };

    let value = match data.get(*key) {
        Some(v) => v,
        None => {
            tracing::debug!(field = *key, "field not found, returning Null");
            return Value::Null;
        }
    };

    if rest.is_empty() {
        return value.clone();
    }

    match value {
        Value::Object(map) => get_nested_value(map, rest),
        _ => {
            tracing::debug!(field = *key, "cannot descend into non-object, returning Null");
            Value::Null
        }
    }
}
