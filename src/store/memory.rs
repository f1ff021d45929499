//! In-process realtime store.
//!
//! DESIGN
//! ======
//! One JSON tree behind a mutex plus a list of attached listeners. Every
//! write updates the tree, then re-evaluates each listener's location and
//! sends what changed: the whole value for value listeners, diffed child
//! events for child listeners. Listeners whose receiver was dropped are
//! pruned on the next notification.
//!
//! Used for the local single-process mode and as the backend in tests.
//! Several sessions sharing one `MemoryStore` behave like several clients
//! of one hosted database.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::push_id::PushIdGenerator;
use super::tree::{children, diff_children, get_at, last_segment, set_at, split_path};
use super::{AuthData, ChildEvent, RealtimeStore, Snapshot, StoreError, Subscription, ValueEvent};

pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    push_ids: PushIdGenerator,
}

#[derive(Default)]
struct MemoryInner {
    root: Value,
    value_listeners: Vec<ValueListener>,
    child_listeners: Vec<ChildListener>,
    auth: Option<AuthData>,
}

struct ValueListener {
    segments: Vec<String>,
    key: String,
    last: Value,
    tx: mpsc::UnboundedSender<ValueEvent>,
}

struct ChildListener {
    segments: Vec<String>,
    last: BTreeMap<String, Value>,
    tx: mpsc::UnboundedSender<ChildEvent>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Mutex::new(MemoryInner::default()), push_ids: PushIdGenerator::new() }
    }

    /// Current value at `path`, `None` when absent or the path is invalid.
    #[must_use]
    pub fn value_at(&self, path: &str) -> Option<Value> {
        let segments = split_path(path).ok()?;
        let inner = self.lock();
        get_at(&inner.root, &segments).cloned()
    }

    /// Currently signed-in user, if any.
    #[must_use]
    pub fn current_auth(&self) -> Option<AuthData> {
        self.lock().auth.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        let mut inner = self.lock();
        set_at(&mut inner.root, &segments, value);
        inner.notify();
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInner {
    fn notify(&mut self) {
        let root = &self.root;

        self.value_listeners.retain_mut(|listener| {
            let segments: Vec<&str> = listener.segments.iter().map(String::as_str).collect();
            let current = get_at(root, &segments).cloned().unwrap_or(Value::Null);
            if current == listener.last {
                return !listener.tx.is_closed();
            }
            listener.last = current.clone();
            listener
                .tx
                .send(ValueEvent::Data(Snapshot::new(listener.key.clone(), current)))
                .is_ok()
        });

        self.child_listeners.retain_mut(|listener| {
            let segments: Vec<&str> = listener.segments.iter().map(String::as_str).collect();
            let current = children(get_at(root, &segments));
            let events = diff_children(&listener.last, &current);
            listener.last = current;
            events.into_iter().all(|event| listener.tx.send(event).is_ok()) && !listener.tx.is_closed()
        });
    }
}

#[async_trait::async_trait]
impl RealtimeStore for MemoryStore {
    async fn auth_anonymously(&self) -> Result<AuthData, StoreError> {
        let auth = AuthData { uid: format!("anonymous:{}", Uuid::new_v4()), provider: "anonymous".into(), token: None };
        self.lock().auth = Some(auth.clone());
        debug!(uid = %auth.uid, "memory store signed in");
        Ok(auth)
    }

    async fn unauth(&self) {
        self.lock().auth = None;
    }

    async fn set_value(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.write(path, value)
    }

    async fn remove_value(&self, path: &str) -> Result<(), StoreError> {
        self.write(path, Value::Null)
    }

    fn push_key(&self) -> String {
        self.push_ids.next_id()
    }

    async fn subscribe_value(&self, path: &str) -> Result<Subscription<ValueEvent>, StoreError> {
        let segments = split_path(path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        let current = get_at(&inner.root, &segments).cloned().unwrap_or(Value::Null);
        let key = last_segment(path).to_string();
        // A fresh receiver cannot be closed yet.
        let _ = tx.send(ValueEvent::Data(Snapshot::new(key.clone(), current.clone())));
        inner.value_listeners.push(ValueListener {
            segments: segments.iter().map(ToString::to_string).collect(),
            key,
            last: current,
            tx,
        });
        Ok(Subscription::new(rx))
    }

    async fn subscribe_children(&self, path: &str) -> Result<Subscription<ChildEvent>, StoreError> {
        let segments = split_path(path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        let current = children(get_at(&inner.root, &segments));
        for event in diff_children(&BTreeMap::new(), &current) {
            let _ = tx.send(event);
        }
        inner.child_listeners.push(ChildListener {
            segments: segments.iter().map(ToString::to_string).collect(),
            last: current,
            tx,
        });
        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
