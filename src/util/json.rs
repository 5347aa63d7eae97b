// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Helpers for working with loosely typed `serde_json` trees.

use serde_json::{Map, Value};

/// Copy (and clone) an entry from one serde_json::Map to another.
pub fn copy_entry(source: &Map<String, Value>, dest: &mut Map<String, Value>, key: &str) -> bool {
    source
        .get(key)
        .map(|v| {
            dest.insert(key.to_string(), v.clone());
        })
        .is_some()
}

/// Recursively merge `update` into a copy of `base`.
///
/// Object values are merged key by key, any other value in `update` replaces the value in
/// `base`. Neither input is modified.
pub fn deep_merge(base: &Map<String, Value>, update: &Map<String, Value>) -> Map<String, Value> {
    let mut result = base.clone();
    for (key, value) in update {
        let merged = match (result.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(patch)) => {
                Value::Object(deep_merge(existing, patch))
            }
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    result
}

/// Get a value by key, first as flat key, then by walking the `/` separated levels.
pub fn get_path<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = root.get(path) {
        return Some(value);
    }
    let mut levels = path.split('/');
    let mut current = root.get(levels.next()?)?;
    for level in levels {
        current = current.as_object()?.get(level)?;
    }
    Some(current)
}

/// Set a value at a `/` separated path, creating intermediate objects as required.
///
/// Non-object values on the way are replaced with objects.
pub fn set_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('/') {
        None => {
            root.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}

/// Truthiness of a JSON value: `null`, `false`, `0`, empty strings, arrays and objects are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Convert a number or a numeric string to `f64`.
pub fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
