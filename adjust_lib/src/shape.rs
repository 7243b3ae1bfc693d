//! Shape inference over KPI `result_set` payloads.
//!
//! The KPI service nests results one level per requested grouping dimension,
//! e.g. `{"apps": [{"name": .., "trackers": [{"name": .., "kpi_values": ..}]}]}`.
//! The nesting is not declared anywhere, so it is discovered by walking the
//! first element of each level. All siblings of a level are assumed to share
//! the first element's keys.
//!
//! Rules:
//! - A grouping dimension is a key holding an array whose first element is an
//!   object (an empty array also counts). Arrays of scalars are plain fields.
//! - Only the first such key of an object is followed; later array-valued keys
//!   on the same level are ignored.
//! - The `kpi_values` key is never a dimension.
//! - Discovery stops at the level whose first element holds `kpi_values`, or
//!   when a level has no dimension. Neither case is an error.

use crate::model::VALUE_FIELD;
use serde_json::{Map, Value};

/// Ordered grouping dimensions from the root down to the leaf level.
///
/// Returns an empty list for anything that is not an object.
pub fn infer_grouping(result_set: &Value) -> Vec<String> {
    match result_set.as_object() {
        Some(root) => infer_grouping_map(root),
        None => Vec::new(),
    }
}

pub fn infer_grouping_map(result_set: &Map<String, Value>) -> Vec<String> {
    let mut grouping = Vec::new();
    descend_grouping(result_set, &mut grouping);
    grouping
}

fn descend_grouping(node: &Map<String, Value>, grouping: &mut Vec<String>) {
    let Some((key, children)) = first_dimension(node) else {
        return;
    };
    grouping.push(key.to_string());
    if let Some(child) = children.first().and_then(Value::as_object) {
        if !child.contains_key(VALUE_FIELD) {
            descend_grouping(child, grouping);
        }
    }
}

fn first_dimension(node: &Map<String, Value>) -> Option<(&str, &[Value])> {
    node.iter().find_map(|(key, value)| match value {
        Value::Array(items) if key != VALUE_FIELD && is_dimension(items) => {
            Some((key.as_str(), items.as_slice()))
        }
        _ => None,
    })
}

fn is_dimension(items: &[Value]) -> bool {
    items.first().map_or(true, Value::is_object)
}

/// Key paths of every field reachable through the first branch of each level.
///
/// Intermediate levels and the leaf level are both descended into, so for
/// `{"apps": [{"name": .., "trackers": [{"name": .., "kpi_values": ..}]}]}`
/// the result is `[apps,name]`, `[apps,trackers,name]` and
/// `[apps,trackers,kpi_values]`. Paths are in traversal order; a key repeated
/// on different branches shows up once per branch.
pub fn infer_meta_paths(result_set: &Value) -> Vec<Vec<String>> {
    let mut meta = Vec::new();
    if let Some(root) = result_set.as_object() {
        collect_meta(root, &[], &mut meta);
    }
    meta
}

fn collect_meta(node: &Map<String, Value>, path: &[String], meta: &mut Vec<Vec<String>>) {
    for (key, value) in node {
        let mut next = path.to_vec();
        next.push(key.clone());
        let child = match value {
            Value::Array(items) if key != VALUE_FIELD => items.first().and_then(Value::as_object),
            _ => None,
        };
        match child {
            Some(child) => collect_meta(child, &next, meta),
            None => meta.push(next),
        }
    }
}

/// Flatten a result set into one row per leaf.
///
/// Each row holds the scalar fields of every level on the way down, named
/// `<dimension>.<field>` (root fields keep their bare name), followed by the
/// leaf's metric values. An object `kpi_values` is merged as is; an array is
/// paired positionally with `kpis`, falling back to `kpi_<index>`.
pub fn flatten_result_set(result_set: &Value, kpis: &[String]) -> Vec<Map<String, Value>> {
    let Some(root) = result_set.as_object() else {
        return Vec::new();
    };
    let grouping = infer_grouping_map(root);
    let mut rows = Vec::new();
    flatten_level(root, None, &grouping, kpis, Map::new(), &mut rows);
    tracing::debug!(rows = rows.len(), levels = grouping.len(), "flattened result set");
    rows
}

fn flatten_level(
    node: &Map<String, Value>,
    prefix: Option<&str>,
    remaining: &[String],
    kpis: &[String],
    mut row: Map<String, Value>,
    rows: &mut Vec<Map<String, Value>>,
) {
    let dimension = remaining.first();
    for (key, value) in node {
        if key == VALUE_FIELD || Some(key) == dimension {
            continue;
        }
        if !value.is_array() && !value.is_object() {
            row.insert(column(prefix, key), value.clone());
        }
    }
    match remaining.split_first() {
        Some((dim, rest)) => {
            if let Some(Value::Array(children)) = node.get(dim.as_str()) {
                for child in children.iter().filter_map(Value::as_object) {
                    flatten_level(child, Some(dim.as_str()), rest, kpis, row.clone(), rows);
                }
            }
        }
        None => {
            if let Some(values) = node.get(VALUE_FIELD) {
                insert_kpi_values(&mut row, values, kpis);
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }
    }
}

fn column(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    }
}

fn insert_kpi_values(row: &mut Map<String, Value>, values: &Value, kpis: &[String]) {
    match values {
        Value::Object(m) => {
            for (k, v) in m {
                row.insert(k.clone(), v.clone());
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                let name = kpis
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("kpi_{}", i));
                row.insert(name, v.clone());
            }
        }
        other => {
            row.insert(VALUE_FIELD.to_string(), other.clone());
        }
    }
}
