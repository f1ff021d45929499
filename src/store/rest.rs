//! Firebase-compatible REST client.
//!
//! ARCHITECTURE
//! ============
//! Writes map to `PUT`/`DELETE {database_url}/{path}.json`. Listeners open a
//! `GET` with `Accept: text/event-stream` and keep a local mirror of the
//! listened location, updated by `put`/`patch` events. Value listeners emit
//! the whole mirror after each update; child listeners diff the mirror's
//! children against the previous state.
//!
//! Anonymous sign-in posts `{"returnSecureToken": true}` to the configured
//! identity endpoint and sends the returned id token as the `auth` query
//! parameter on every later request.
//!
//! ERROR HANDLING
//! ==============
//! A stream that fails, closes, or is cancelled by the server delivers one
//! `Cancelled` event and ends. Listeners are not re-established.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::push_id::PushIdGenerator;
use super::sse::{SseParser, StreamMessage};
use super::tree::{children, diff_children, get_at, last_segment, set_at, split_path};
use super::{AuthData, ChildEvent, RealtimeStore, Snapshot, StoreError, Subscription, ValueEvent};
use crate::config::RestConfig;

// =============================================================================
// CLIENT
// =============================================================================

pub struct RestStore {
    http: reqwest::Client,
    config: RestConfig,
    auth: RwLock<Option<AuthData>>,
    push_ids: PushIdGenerator,
}

impl RestStore {
    /// Build a client for the configured database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Request` if the HTTP client cannot be built.
    pub fn new(config: RestConfig) -> Result<Self, StoreError> {
        // No overall timeout here: streaming listeners stay open indefinitely.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(Self { http, config, auth: RwLock::new(None), push_ids: PushIdGenerator::new() })
    }

    fn url_for(&self, path: &str) -> Result<String, StoreError> {
        let segments = split_path(path)?;
        Ok(format!("{}/{}.json", self.config.database_url.trim_end_matches('/'), segments.join("/")))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeouts.request_secs)
    }

    fn token(&self) -> Option<String> {
        self.auth
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .and_then(|auth| auth.token.clone())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn open_stream(&self, path: &str) -> Result<reqwest::Response, StoreError> {
        let url = self.url_for(path)?;
        let response = self
            .authorize(self.http.get(url).header(ACCEPT, "text/event-stream"))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Response { status: status.as_u16(), body })
}

#[async_trait::async_trait]
impl RealtimeStore for RestStore {
    async fn auth_anonymously(&self) -> Result<AuthData, StoreError> {
        let api_key = self.config.api_key.as_deref().ok_or(StoreError::MissingApiKey)?;
        let response = self
            .http
            .post(&self.config.auth_url)
            .query(&[("key", api_key)])
            .json(&SignUpRequest { return_secure_token: true })
            .timeout(self.request_timeout())
            .send()
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(StoreError::Auth(format!("status {status}: {text}")));
        }

        let auth = parse_sign_up(&text)?;
        info!(uid = %auth.uid, "signed in anonymously");
        *self.auth.write().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(auth.clone());
        Ok(auth)
    }

    async fn unauth(&self) {
        *self.auth.write().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    async fn set_value(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.url_for(path)?;
        let response = self
            .authorize(self.http.put(url).json(&value))
            .timeout(self.request_timeout())
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        ensure_success(response).await?;
        debug!(path, "value written");
        Ok(())
    }

    async fn remove_value(&self, path: &str) -> Result<(), StoreError> {
        let url = self.url_for(path)?;
        let response = self
            .authorize(self.http.delete(url))
            .timeout(self.request_timeout())
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        ensure_success(response).await?;
        debug!(path, "value removed");
        Ok(())
    }

    fn push_key(&self) -> String {
        self.push_ids.next_id()
    }

    async fn subscribe_value(&self, path: &str) -> Result<Subscription<ValueEvent>, StoreError> {
        let response = self.open_stream(path).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = MirrorListener::Value { key: last_segment(path).to_string(), tx };
        let task = tokio::spawn(pump_stream(response, path.to_string(), listener));
        Ok(Subscription::with_task(rx, task))
    }

    async fn subscribe_children(&self, path: &str) -> Result<Subscription<ChildEvent>, StoreError> {
        let response = self.open_stream(path).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = MirrorListener::Children { last: BTreeMap::new(), tx };
        let task = tokio::spawn(pump_stream(response, path.to_string(), listener));
        Ok(Subscription::with_task(rx, task))
    }
}

// =============================================================================
// AUTH WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest {
    return_secure_token: bool,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    id_token: String,
    local_id: String,
}

fn parse_sign_up(json: &str) -> Result<AuthData, StoreError> {
    let response: SignUpResponse = serde_json::from_str(json).map_err(|e| StoreError::Auth(format!("bad sign-in response: {e}")))?;
    Ok(AuthData { uid: response.local_id, provider: "anonymous".into(), token: Some(response.id_token) })
}

// =============================================================================
// STREAMING
// =============================================================================

/// Turns mirror updates into listener events.
enum MirrorListener {
    Value { key: String, tx: mpsc::UnboundedSender<ValueEvent> },
    Children { last: BTreeMap<String, Value>, tx: mpsc::UnboundedSender<ChildEvent> },
}

impl MirrorListener {
    /// Emit events for the new mirror. Returns false once the receiver is gone.
    fn emit(&mut self, mirror: &Value) -> bool {
        let current = get_at(mirror, &[]);
        match self {
            Self::Value { key, tx } => {
                let value = current.cloned().unwrap_or(Value::Null);
                tx.send(ValueEvent::Data(Snapshot::new(key.clone(), value))).is_ok()
            }
            Self::Children { last, tx } => {
                let next = children(current);
                let events = diff_children(last, &next);
                *last = next;
                events.into_iter().all(|event| tx.send(event).is_ok())
            }
        }
    }

    fn cancel(&self, reason: String) {
        // Receiver may already be gone.
        match self {
            Self::Value { tx, .. } => {
                let _ = tx.send(ValueEvent::Cancelled { reason });
            }
            Self::Children { tx, .. } => {
                let _ = tx.send(ChildEvent::Cancelled { reason });
            }
        }
    }
}

/// Apply one stream message to the mirror. Returns whether it changed data.
fn apply_message(mirror: &mut Value, message: StreamMessage) -> Result<bool, String> {
    match message {
        StreamMessage::Put { path, data } => {
            let segments = split_path(&path).map_err(|e| e.to_string())?;
            set_at(mirror, &segments, data);
            Ok(true)
        }
        StreamMessage::Patch { path, data } => {
            let segments = split_path(&path).map_err(|e| e.to_string())?;
            let Value::Object(entries) = data else {
                return Err(format!("patch at {path} is not an object"));
            };
            for (child, value) in entries {
                let mut target = segments.clone();
                target.push(&child);
                set_at(mirror, &target, value);
            }
            Ok(true)
        }
        StreamMessage::KeepAlive => Ok(false),
        StreamMessage::Cancel { reason } | StreamMessage::AuthRevoked { reason } => Err(reason),
    }
}

async fn pump_stream(response: reqwest::Response, path: String, mut listener: MirrorListener) {
    let mut bytes = response.bytes_stream();
    let mut parser = SseParser::default();
    let mut mirror = Value::Null;

    while let Some(chunk) = bytes.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, %path, "listener stream failed");
                listener.cancel(e.to_string());
                return;
            }
        };

        for event in parser.feed(&chunk) {
            let message = match StreamMessage::parse(&event) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, %path, "skipping stream event");
                    continue;
                }
            };
            match apply_message(&mut mirror, message) {
                Ok(true) => {
                    if !listener.emit(&mirror) {
                        debug!(%path, "listener dropped");
                        return;
                    }
                }
                Ok(false) => {}
                Err(reason) => {
                    warn!(%path, %reason, "listener cancelled by server");
                    listener.cancel(reason);
                    return;
                }
            }
        }
    }

    listener.cancel("stream closed".into());
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
