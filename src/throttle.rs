//! Update throttle — coalesced furniture writes on a fixed interval.
//!
//! DESIGN
//! ======
//! A drag produces a mutation per pointer event. Instead of writing each
//! one, the UI records the latest state per key in `PendingUpdates` and a
//! background task pushes whatever is pending every interval (40ms by
//! default). Intermediate states between two ticks are dropped: last write
//! wins per key.
//!
//! The flush drains the pending map by swapping it out under the lock, then
//! writes without holding it. A mutation recorded after the swap lands in
//! the next tick, so no update is lost or written twice.
//!
//! A flush holds the write gate (`hold_writes`) from drain until its last
//! write completes. Immediate writes (rotate, rename, delete) take the same
//! gate before discarding the pending entry, so an older drag state that was
//! already drained can never land after them and revert them remotely.
//!
//! ERROR HANDLING
//! ==============
//! Writes are best-effort. A failed write is logged and not retried, and the
//! drained state is not restored.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::model::OfficeThing;
use crate::store::{RealtimeStore, put_thing};

// =============================================================================
// PENDING UPDATES
// =============================================================================

/// Latest unsent state per furniture key. Shared between UI and flush task.
#[derive(Clone, Default)]
pub struct PendingUpdates {
    inner: Arc<Mutex<HashMap<String, OfficeThing>>>,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl PendingUpdates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest state for `key`, replacing anything pending.
    pub fn record(&self, key: &str, mut thing: OfficeThing) {
        thing.key = Some(key.to_string());
        self.lock().insert(key.to_string(), thing);
    }

    /// Forget the pending state for `key`, if any.
    pub fn discard(&self, key: &str) -> Option<OfficeThing> {
        self.lock().remove(key)
    }

    /// Take everything pending, leaving the map empty.
    #[must_use]
    pub fn drain(&self) -> HashMap<String, OfficeThing> {
        std::mem::take(&mut *self.lock())
    }

    /// Exclusive right to write furniture records. Held by a flush for its
    /// whole batch.
    pub async fn hold_writes(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, OfficeThing>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Write everything pending once. Returns the number of writes issued.
pub async fn flush_pending(pending: &PendingUpdates, store: &dyn RealtimeStore) -> usize {
    let _writes = pending.hold_writes().await;
    let batch = pending.drain();
    if batch.is_empty() {
        return 0;
    }

    let count = batch.len();
    let writes = batch.into_iter().map(|(key, thing)| async move {
        if let Err(e) = put_thing(store, &key, &thing).await {
            warn!(error = %e, %key, "update failed");
        }
    });
    futures::future::join_all(writes).await;

    debug!(count, "pending updates flushed");
    count
}

// =============================================================================
// THROTTLE TASK
// =============================================================================

/// Owns the periodic flush task. Stop it with [`UpdateThrottle::shutdown`];
/// dropping it aborts the task without a final flush.
pub struct UpdateThrottle {
    pending: PendingUpdates,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl UpdateThrottle {
    /// Start flushing to `store` every `interval`.
    #[must_use]
    pub fn spawn(store: Arc<dyn RealtimeStore>, interval: Duration) -> Self {
        let pending = PendingUpdates::new();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let task_pending = pending.clone();

        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        debug!(interval_ms, "update throttle started");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        flush_pending(&task_pending, store.as_ref()).await;
                    }
                    _ = &mut shutdown_rx => {
                        let count = flush_pending(&task_pending, store.as_ref()).await;
                        debug!(count, "final flush on shutdown");
                        break;
                    }
                }
            }
        });

        Self { pending, shutdown_tx: Some(shutdown_tx), task: Some(task) }
    }

    /// Schedule `thing` to be written under `key` on the next tick.
    pub fn record(&self, key: &str, thing: OfficeThing) {
        self.pending.record(key, thing);
    }

    /// Drop any pending write for `key`.
    pub fn discard(&self, key: &str) {
        if self.pending.discard(key).is_some() {
            debug!(%key, "pending update discarded");
        }
    }

    /// Wait for any in-flight flush, then block flushes until the guard drops.
    pub async fn hold_writes(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.pending.hold_writes().await
    }

    #[must_use]
    pub fn pending(&self) -> &PendingUpdates {
        &self.pending
    }

    /// Stop the periodic task after one final flush.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "update throttle task ended abnormally");
            }
        }
        debug!("update throttle stopped");
    }
}

impl Drop for UpdateThrottle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "throttle_test.rs"]
mod tests;
