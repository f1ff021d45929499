//! Realtime store — the hosted data tree the office is synchronized through.
//!
//! ARCHITECTURE
//! ============
//! The office is stored under two top-level paths: `background` (a floor
//! pattern string) and `furniture` (a map of push keys to records). Every
//! client writes whole records with `set_value` and learns about changes,
//! including its own, through subscriptions.
//!
//! DESIGN
//! ======
//! - `RealtimeStore` is the seam between the session and a backend. The
//!   in-process `MemoryStore` and the Firebase-compatible `RestStore`
//!   implement it.
//! - Subscriptions are typed channels. Callers drain them on their own task,
//!   so listener callbacks never touch rendering state directly.
//! - Child events are derived by diffing child maps (`tree::diff_children`),
//!   identically for both backends.

pub mod memory;
pub mod push_id;
pub mod rest;
pub mod sse;
pub mod tree;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::BackendConfig;
use crate::model::OfficeThing;

/// Path of the floor pattern value.
pub const BACKGROUND_PATH: &str = "background";

/// Path of the furniture collection.
pub const FURNITURE_PATH: &str = "furniture";

/// Path of a single furniture record.
#[must_use]
pub fn furniture_path(key: &str) -> String {
    format!("{FURNITURE_PATH}/{key}")
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("anonymous sign-in requires an API key")]
    MissingApiKey,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("store responded with status {status}: {body}")]
    Response { status: u16, body: String },
    #[error("malformed payload: {0}")]
    Payload(String),
}

// =============================================================================
// AUTH
// =============================================================================

/// Result of a successful sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthData {
    pub uid: String,
    pub provider: String,
    /// Bearer token sent with requests, if the backend issued one.
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthData")
            .field("uid", &self.uid)
            .field("provider", &self.provider)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// =============================================================================
// SNAPSHOTS & EVENTS
// =============================================================================

/// Value at a location at the time of an event. `Value::Null` when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub key: String,
    pub value: Value,
}

impl Snapshot {
    #[must_use]
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self { key: key.into(), value }
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// Decode the snapshot value into a typed record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Payload` if the value does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.value.clone()).map_err(|e| StoreError::Payload(format!("{}: {e}", self.key)))
    }
}

/// Notification from a child listener. `previous` names the preceding sibling.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildEvent {
    Added { snapshot: Snapshot, previous: Option<String> },
    Changed { snapshot: Snapshot, previous: Option<String> },
    Removed { snapshot: Snapshot },
    Moved { snapshot: Snapshot, previous: Option<String> },
    Cancelled { reason: String },
}

impl ChildEvent {
    /// Key of the affected child, if the event concerns one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Added { snapshot, .. }
            | Self::Changed { snapshot, .. }
            | Self::Removed { snapshot }
            | Self::Moved { snapshot, .. } => Some(&snapshot.key),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Notification from a value listener.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueEvent {
    Data(Snapshot),
    Cancelled { reason: String },
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Receiving end of a listener. Dropping it detaches the listener.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<T>) -> Self {
        Self { rx, task: None }
    }

    /// Subscription whose events are produced by a background task.
    pub(crate) fn with_task(rx: mpsc::UnboundedReceiver<T>, task: JoinHandle<()>) -> Self {
        Self { rx, task: Some(task) }
    }

    /// Wait for the next event. `None` once the listener has shut down.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Client API of a hierarchical realtime database.
#[async_trait::async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Sign in without credentials.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend rejects the sign-in.
    async fn auth_anonymously(&self) -> Result<AuthData, StoreError>;

    /// Forget the current sign-in.
    async fn unauth(&self);

    /// Replace the value at `path`. `Value::Null` removes it.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the path is invalid or the write is rejected.
    async fn set_value(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Remove the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the path is invalid or the removal is rejected.
    async fn remove_value(&self, path: &str) -> Result<(), StoreError>;

    /// Generate a new, chronologically ordered child key.
    fn push_key(&self) -> String;

    /// Listen to the whole value at `path`. Fires once with the current value.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the listener cannot be attached.
    async fn subscribe_value(&self, path: &str) -> Result<Subscription<ValueEvent>, StoreError>;

    /// Listen to the children of `path`. Existing children arrive as `Added`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the listener cannot be attached.
    async fn subscribe_children(&self, path: &str) -> Result<Subscription<ChildEvent>, StoreError>;
}

/// Write one furniture record, re-applying its key to the path.
///
/// # Errors
///
/// Returns a `StoreError` if the record cannot be encoded or the write fails.
pub async fn put_thing(store: &dyn RealtimeStore, key: &str, thing: &OfficeThing) -> Result<(), StoreError> {
    let value = serde_json::to_value(thing).map_err(|e| StoreError::Payload(e.to_string()))?;
    store.set_value(&furniture_path(key), value).await
}

/// Build the store selected by configuration.
///
/// # Errors
///
/// Returns a `StoreError` if the REST client cannot be constructed.
pub fn connect(config: &BackendConfig) -> Result<Arc<dyn RealtimeStore>, StoreError> {
    match config {
        BackendConfig::Memory => Ok(Arc::new(memory::MemoryStore::new())),
        BackendConfig::Rest(rest) => Ok(Arc::new(rest::RestStore::new(rest.clone())?)),
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
