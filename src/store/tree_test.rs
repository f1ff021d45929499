use super::*;
use serde_json::json;

fn map(value: Value) -> BTreeMap<String, Value> {
    children(Some(&value))
}

// =============================================================================
// paths
// =============================================================================

#[test]
fn split_path_handles_root_and_slashes() {
    assert!(split_path("").unwrap().is_empty());
    assert!(split_path("/").unwrap().is_empty());
    assert_eq!(split_path("/furniture/-K1/").unwrap(), vec!["furniture", "-K1"]);
}

#[test]
fn split_path_rejects_bad_segments() {
    assert!(matches!(split_path("a//b"), Err(StoreError::InvalidPath(_))));
    assert!(matches!(split_path("furniture/a.b"), Err(StoreError::InvalidPath(_))));
    assert!(matches!(split_path("furniture/$x"), Err(StoreError::InvalidPath(_))));
}

#[test]
fn last_segment_of_paths() {
    assert_eq!(last_segment("furniture/-K1"), "-K1");
    assert_eq!(last_segment("background"), "background");
    assert_eq!(last_segment("/"), "");
}

// =============================================================================
// set_at / get_at
// =============================================================================

#[test]
fn set_creates_parents() {
    let mut root = Value::Null;
    set_at(&mut root, &["furniture", "a"], json!({"type": "desk"}));
    assert_eq!(root, json!({"furniture": {"a": {"type": "desk"}}}));
    assert_eq!(get_at(&root, &["furniture", "a", "type"]), Some(&json!("desk")));
}

#[test]
fn set_null_removes_and_prunes_empty_parents() {
    let mut root = json!({"furniture": {"a": {"type": "desk"}}, "background": "wood"});
    set_at(&mut root, &["furniture", "a"], Value::Null);
    assert_eq!(root, json!({"background": "wood"}));
    set_at(&mut root, &["background"], Value::Null);
    assert_eq!(root, Value::Null);
}

#[test]
fn set_prunes_nulls_inside_written_value() {
    let mut root = Value::Null;
    set_at(&mut root, &["x"], json!({"keep": 1, "drop": null, "empty": {}}));
    assert_eq!(root, json!({"x": {"keep": 1}}));
}

#[test]
fn set_replaces_scalar_parent_with_object() {
    let mut root = json!({"background": "wood"});
    set_at(&mut root, &["background", "inner"], json!(1));
    assert_eq!(root, json!({"background": {"inner": 1}}));
}

#[test]
fn get_missing_path_is_none() {
    let root = json!({"a": 1});
    assert!(get_at(&root, &["b"]).is_none());
    assert!(get_at(&root, &["a", "b"]).is_none());
    assert!(get_at(&Value::Null, &[]).is_none());
}

// =============================================================================
// diff_children
// =============================================================================

#[test]
fn diff_reports_added_with_previous_sibling() {
    let events = diff_children(&BTreeMap::new(), &map(json!({"a": 1, "b": 2})));
    assert_eq!(
        events,
        vec![
            ChildEvent::Added { snapshot: Snapshot::new("a", json!(1)), previous: None },
            ChildEvent::Added { snapshot: Snapshot::new("b", json!(2)), previous: Some("a".into()) },
        ]
    );
}

#[test]
fn diff_reports_removed_before_changes() {
    let events = diff_children(&map(json!({"a": 1, "b": 2})), &map(json!({"b": 3})));
    assert_eq!(
        events,
        vec![
            ChildEvent::Removed { snapshot: Snapshot::new("a", json!(1)) },
            ChildEvent::Changed { snapshot: Snapshot::new("b", json!(3)), previous: None },
        ]
    );
}

#[test]
fn diff_of_identical_maps_is_empty() {
    let same = map(json!({"a": {"left": 1}}));
    assert!(diff_children(&same, &same).is_empty());
}
