use super::*;
use crate::config::{DEFAULT_AUTH_URL, RestTimeouts};
use serde_json::json;

fn config(database_url: &str) -> RestConfig {
    RestConfig {
        database_url: database_url.into(),
        api_key: None,
        auth_url: DEFAULT_AUTH_URL.into(),
        timeouts: RestTimeouts { request_secs: 1, connect_secs: 1 },
    }
}

// =============================================================================
// urls & auth parsing
// =============================================================================

#[test]
fn url_for_appends_json_suffix() {
    let store = RestStore::new(config("https://office.example.com/")).unwrap();
    assert_eq!(store.url_for("furniture/-K1").unwrap(), "https://office.example.com/furniture/-K1.json");
    assert_eq!(store.url_for("/").unwrap(), "https://office.example.com/.json");
    assert!(store.url_for("bad/pa.th").is_err());
}

#[test]
fn parse_sign_up_reads_token_and_uid() {
    let auth = parse_sign_up(r#"{"idToken":"tok","localId":"uid-1","refreshToken":"r","expiresIn":"3600"}"#).unwrap();
    assert_eq!(auth.uid, "uid-1");
    assert_eq!(auth.provider, "anonymous");
    assert_eq!(auth.token.as_deref(), Some("tok"));
}

#[test]
fn parse_sign_up_rejects_missing_fields() {
    assert!(matches!(parse_sign_up(r#"{"localId":"uid-1"}"#), Err(StoreError::Auth(_))));
}

#[test]
fn debug_output_redacts_token() {
    let auth = parse_sign_up(r#"{"idToken":"secret-token","localId":"uid-1"}"#).unwrap();
    let printed = format!("{auth:?}");
    assert!(!printed.contains("secret-token"));
    assert!(printed.contains("uid-1"));
}

#[tokio::test]
async fn anonymous_auth_without_api_key_fails_fast() {
    let store = RestStore::new(config("https://office.example.com")).unwrap();
    assert!(matches!(store.auth_anonymously().await, Err(StoreError::MissingApiKey)));
}

// =============================================================================
// mirror updates
// =============================================================================

#[test]
fn put_at_root_replaces_mirror() {
    let mut mirror = json!({"old": 1});
    let changed = apply_message(&mut mirror, StreamMessage::Put { path: "/".into(), data: json!({"a": {"type": "desk"}}) });
    assert_eq!(changed, Ok(true));
    assert_eq!(mirror, json!({"a": {"type": "desk"}}));
}

#[test]
fn put_null_at_child_removes_it() {
    let mut mirror = json!({"a": {"type": "desk"}, "b": {"type": "laptop"}});
    apply_message(&mut mirror, StreamMessage::Put { path: "/a".into(), data: Value::Null }).unwrap();
    assert_eq!(mirror, json!({"b": {"type": "laptop"}}));
}

#[test]
fn patch_merges_children() {
    let mut mirror = json!({"a": {"type": "desk", "left": 1}});
    apply_message(&mut mirror, StreamMessage::Patch { path: "/a".into(), data: json!({"left": 9, "top": 4}) }).unwrap();
    assert_eq!(mirror, json!({"a": {"type": "desk", "left": 9, "top": 4}}));
}

#[test]
fn patch_with_non_object_is_rejected() {
    let mut mirror = Value::Null;
    assert!(apply_message(&mut mirror, StreamMessage::Patch { path: "/".into(), data: json!(3) }).is_err());
}

#[test]
fn keep_alive_changes_nothing_and_cancel_ends() {
    let mut mirror = json!({"a": 1});
    assert_eq!(apply_message(&mut mirror, StreamMessage::KeepAlive), Ok(false));
    assert_eq!(
        apply_message(&mut mirror, StreamMessage::Cancel { reason: "rules".into() }),
        Err("rules".to_string())
    );
}

// =============================================================================
// listener emission
// =============================================================================

#[test]
fn children_listener_diffs_successive_mirrors() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut listener = MirrorListener::Children { last: BTreeMap::new(), tx };

    assert!(listener.emit(&json!({"a": {"type": "desk"}})));
    assert!(matches!(rx.try_recv(), Ok(ChildEvent::Added { .. })));

    assert!(listener.emit(&json!({"a": {"type": "desk", "left": 2}})));
    assert!(matches!(rx.try_recv(), Ok(ChildEvent::Changed { .. })));

    assert!(listener.emit(&Value::Null));
    assert!(matches!(rx.try_recv(), Ok(ChildEvent::Removed { .. })));
}

#[test]
fn value_listener_emits_whole_value_and_reports_closed_receiver() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut listener = MirrorListener::Value { key: "background".into(), tx };
    assert!(listener.emit(&json!("tile")));
    assert_eq!(rx.try_recv().unwrap(), ValueEvent::Data(Snapshot::new("background", json!("tile"))));

    drop(rx);
    assert!(!listener.emit(&json!("wood")));
}
