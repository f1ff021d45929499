use super::*;
use serde_json::json;

// =============================================================================
// writes
// =============================================================================

#[tokio::test]
async fn set_and_remove_update_the_tree() {
    let store = MemoryStore::new();
    store.set_value("furniture/a", json!({"type": "desk"})).await.unwrap();
    assert_eq!(store.value_at("furniture/a"), Some(json!({"type": "desk"})));

    store.remove_value("furniture/a").await.unwrap();
    assert!(store.value_at("furniture/a").is_none());
    assert!(store.value_at("furniture").is_none());
}

#[tokio::test]
async fn invalid_path_is_rejected() {
    let store = MemoryStore::new();
    let err = store.set_value("furniture/a.b", json!(1)).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidPath(_)));
}

#[tokio::test]
async fn anonymous_auth_is_tracked_until_unauth() {
    let store = MemoryStore::new();
    let auth = store.auth_anonymously().await.unwrap();
    assert_eq!(auth.provider, "anonymous");
    assert!(auth.uid.starts_with("anonymous:"));
    assert_eq!(store.current_auth(), Some(auth));

    store.unauth().await;
    assert!(store.current_auth().is_none());
}

#[test]
fn push_keys_are_unique_and_ordered() {
    let store = MemoryStore::new();
    let a = store.push_key();
    let b = store.push_key();
    assert_ne!(a, b);
    assert!(a < b);
}

// =============================================================================
// value listeners
// =============================================================================

#[tokio::test]
async fn value_listener_fires_initial_and_on_change() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe_value("background").await.unwrap();
    assert_eq!(sub.try_recv(), Some(ValueEvent::Data(Snapshot::new("background", Value::Null))));

    store.set_value("background", json!("wood")).await.unwrap();
    assert_eq!(sub.try_recv(), Some(ValueEvent::Data(Snapshot::new("background", json!("wood")))));

    store.remove_value("background").await.unwrap();
    assert_eq!(sub.try_recv(), Some(ValueEvent::Data(Snapshot::new("background", Value::Null))));
}

#[tokio::test]
async fn value_listener_ignores_unrelated_writes() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe_value("background").await.unwrap();
    let _initial = sub.try_recv();

    store.set_value("furniture/a", json!({"type": "desk"})).await.unwrap();
    assert!(sub.try_recv().is_none());

    store.set_value("background", json!("grid")).await.unwrap();
    store.set_value("background", json!("grid")).await.unwrap();
    assert!(sub.try_recv().is_some());
    assert!(sub.try_recv().is_none());
}

// =============================================================================
// child listeners
// =============================================================================

#[tokio::test]
async fn child_listener_replays_existing_children() {
    let store = MemoryStore::new();
    store.set_value("furniture/a", json!({"type": "desk"})).await.unwrap();
    store.set_value("furniture/b", json!({"type": "laptop"})).await.unwrap();

    let mut sub = store.subscribe_children("furniture").await.unwrap();
    let first = sub.try_recv().unwrap();
    let second = sub.try_recv().unwrap();
    assert!(matches!(first, ChildEvent::Added { ref snapshot, previous: None } if snapshot.key == "a"));
    assert!(matches!(second, ChildEvent::Added { ref snapshot, .. } if snapshot.key == "b"));
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn child_listener_sees_add_change_remove() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe_children("furniture").await.unwrap();

    store.set_value("furniture/a", json!({"type": "desk", "left": 1})).await.unwrap();
    assert!(matches!(sub.try_recv(), Some(ChildEvent::Added { .. })));

    store.set_value("furniture/a/left", json!(5)).await.unwrap();
    match sub.try_recv() {
        Some(ChildEvent::Changed { snapshot, .. }) => assert_eq!(snapshot.value, json!({"type": "desk", "left": 5})),
        other => panic!("expected change, got {other:?}"),
    }

    store.remove_value("furniture/a").await.unwrap();
    match sub.try_recv() {
        Some(ChildEvent::Removed { snapshot }) => assert_eq!(snapshot.key, "a"),
        other => panic!("expected removal, got {other:?}"),
    }
}

#[tokio::test]
async fn dropped_listeners_are_pruned() {
    let store = MemoryStore::new();
    let sub = store.subscribe_children("furniture").await.unwrap();
    drop(sub);

    store.set_value("furniture/a", json!({"type": "desk"})).await.unwrap();
    let inner = store.lock();
    assert!(inner.child_listeners.is_empty());
}

#[tokio::test]
async fn two_listeners_on_one_path_both_receive() {
    let store = MemoryStore::new();
    let mut one = store.subscribe_children("furniture").await.unwrap();
    let mut two = store.subscribe_children("furniture").await.unwrap();

    store.set_value("furniture/a", json!({"type": "desk"})).await.unwrap();
    assert_eq!(one.try_recv().as_ref().and_then(ChildEvent::key), Some("a"));
    assert_eq!(two.try_recv().as_ref().and_then(ChildEvent::key), Some("a"));
}
