//! JSON tree helpers shared by the store backends.
//!
//! The data tree follows realtime-database semantics: `null` means absent,
//! writing `null` deletes, and objects left without children disappear.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{ChildEvent, Snapshot, StoreError};

/// Characters a path segment may not contain.
const FORBIDDEN: [char; 5] = ['.', '$', '#', '[', ']'];

/// Split a slash-separated path. The root is `""` or `"/"`.
///
/// # Errors
///
/// Returns `StoreError::InvalidPath` for empty inner segments or forbidden
/// characters.
pub fn split_path(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = trimmed.split('/').collect();
    for segment in &segments {
        if segment.is_empty() || segment.contains(FORBIDDEN) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok(segments)
}

/// Last segment of a path, `""` for the root.
#[must_use]
pub fn last_segment(path: &str) -> &str {
    path.trim_matches('/').rsplit('/').next().unwrap_or("")
}

/// Value at `segments`, if present.
#[must_use]
pub fn get_at<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_object()?.get(*segment)?;
    }
    if node.is_null() { None } else { Some(node) }
}

/// Replace the value at `segments`, creating parents and pruning empties.
pub fn set_at(node: &mut Value, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = prune(value);
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }

    let now_empty = match node {
        Value::Object(map) => {
            let child = map.entry((*first).to_string()).or_insert(Value::Null);
            set_at(child, rest, value);
            if is_empty(child) {
                map.remove(*first);
            }
            map.is_empty()
        }
        _ => false,
    };

    if now_empty {
        *node = Value::Null;
    }
}

/// Children of a value, ordered by key.
#[must_use]
pub fn children(value: Option<&Value>) -> BTreeMap<String, Value> {
    value
        .and_then(Value::as_object)
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// Child events that turn `old` into `new`. Removals come first, then
/// additions and changes in key order.
#[must_use]
pub fn diff_children(old: &BTreeMap<String, Value>, new: &BTreeMap<String, Value>) -> Vec<ChildEvent> {
    let mut events = Vec::new();

    for (key, value) in old {
        if !new.contains_key(key) {
            events.push(ChildEvent::Removed { snapshot: Snapshot::new(key.clone(), value.clone()) });
        }
    }

    let mut previous: Option<String> = None;
    for (key, value) in new {
        match old.get(key) {
            None => events.push(ChildEvent::Added {
                snapshot: Snapshot::new(key.clone(), value.clone()),
                previous: previous.clone(),
            }),
            Some(before) if before != value => events.push(ChildEvent::Changed {
                snapshot: Snapshot::new(key.clone(), value.clone()),
                previous: previous.clone(),
            }),
            Some(_) => {}
        }
        previous = Some(key.clone());
    }

    events
}

fn is_empty(value: &Value) -> bool {
    value.is_null() || value.as_object().is_some_and(Map::is_empty)
}

/// Drop null members and empty objects, recursively.
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect();
            if pruned.is_empty() { Value::Null } else { Value::Object(pruned) }
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tests;
