//! Server-sent events — incremental parsing of a realtime stream.
//!
//! DESIGN
//! ======
//! `SseParser` is fed raw byte chunks as they arrive and yields complete
//! events. Partial lines (including split UTF-8 sequences) stay buffered
//! until their newline arrives. `StreamMessage` interprets an event
//! according to the realtime-database streaming protocol.

use serde::Deserialize;
use serde_json::Value;

use super::StoreError;

/// One dispatched event: its `event:` name and joined `data:` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: String,
    data: Vec<String>,
}

impl SseParser {
    /// Consume a chunk and return every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = value.to_string(),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.event.is_empty() && self.data.is_empty() {
            return None;
        }
        let event = SseEvent { event: std::mem::take(&mut self.event), data: self.data.join("\n") };
        self.data.clear();
        Some(event)
    }
}

// =============================================================================
// STREAM MESSAGES
// =============================================================================

/// A realtime-database streaming event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Replace the value at `path`, relative to the listened location.
    Put { path: String, data: Value },
    /// Merge the children of `data` into the value at `path`.
    Patch { path: String, data: Value },
    KeepAlive,
    Cancel { reason: String },
    AuthRevoked { reason: String },
}

#[derive(Deserialize)]
struct PathData {
    path: String,
    data: Value,
}

impl StreamMessage {
    /// Interpret a parsed server-sent event.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Payload` for unknown event names or malformed
    /// `put`/`patch` bodies.
    pub fn parse(event: &SseEvent) -> Result<Self, StoreError> {
        match event.event.as_str() {
            "put" | "patch" => {
                let body: PathData = serde_json::from_str(&event.data)
                    .map_err(|e| StoreError::Payload(format!("{} event: {e}", event.event)))?;
                if event.event == "put" {
                    Ok(Self::Put { path: body.path, data: body.data })
                } else {
                    Ok(Self::Patch { path: body.path, data: body.data })
                }
            }
            "keep-alive" => Ok(Self::KeepAlive),
            "cancel" => Ok(Self::Cancel { reason: reason_text(&event.data, "listener cancelled") }),
            "auth_revoked" => Ok(Self::AuthRevoked { reason: reason_text(&event.data, "credential revoked") }),
            other => Err(StoreError::Payload(format!("unknown stream event: {other}"))),
        }
    }
}

/// Event data is a JSON string, a JSON null, or bare text.
fn reason_text(data: &str, fallback: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(s)) => s,
        Ok(Value::Null) => fallback.to_string(),
        _ if data.trim().is_empty() => fallback.to_string(),
        _ => data.to_string(),
    }
}

#[cfg(test)]
#[path = "sse_test.rs"]
mod tests;
