//! Structural merge of workflow nodes
//!
//! `deep_merge` unions mappings recursively and lets the source win on
//! leaves. `merge_with_replacements` does the same for a workflow node but
//! copies the source value wholesale at every replacement path.

use super::ReplacementPath;
use serde_json::{Map, Value};

/// Recursively merge `source` into `target`.
///
/// - mapping + mapping: keys are unioned, shared keys merged recursively,
///   new keys appended after the existing ones
/// - sequence + sequence: source items not already present are appended
/// - anything else: the source value replaces the target value
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            merge_maps(target_map, source_map);
        }
        (Value::Array(target_items), Value::Array(source_items)) => {
            for item in source_items {
                if !target_items.contains(item) {
                    target_items.push(item.clone());
                }
            }
        }
        (target, source) => {
            *target = source.clone();
        }
    }
}

/// Deep merge of two mappings, see [`deep_merge`]
pub fn merge_maps(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, source_value) in source {
        match target.get_mut(key) {
            Some(target_value) => deep_merge(target_value, source_value),
            None => {
                target.insert(key.clone(), source_value.clone());
            }
        }
    }
}

/// Merge an imported workflow node into the target node.
///
/// A key whose full path is listed in `replacements` takes the source value
/// verbatim. Paths that are not present in the source leave the target alone.
pub fn merge_with_replacements(
    target: &mut Map<String, Value>,
    source: &Map<String, Value>,
    replacements: &[ReplacementPath],
) {
    let paths: Vec<&[String]> = replacements.iter().map(|p| p.segments()).collect();
    merge_level(target, source, &paths);
}

fn merge_level(target: &mut Map<String, Value>, source: &Map<String, Value>, paths: &[&[String]]) {
    if paths.is_empty() {
        merge_maps(target, source);
        return;
    }

    for (key, source_value) in source {
        let below: Vec<&[String]> = paths
            .iter()
            .filter(|p| p.first() == Some(key))
            .map(|p| &p[1..])
            .collect();

        if below.iter().any(|rest| rest.is_empty()) {
            tracing::trace!(key = %key, "replacing value wholesale");
            target.insert(key.clone(), source_value.clone());
            continue;
        }

        match (target.get_mut(key), source_value) {
            (Some(Value::Object(target_inner)), Value::Object(source_inner)) if !below.is_empty() => {
                merge_level(target_inner, source_inner, &below);
            }
            (Some(target_value), _) => deep_merge(target_value, source_value),
            (None, _) => {
                target.insert(key.clone(), source_value.clone());
            }
        }
    }
}
