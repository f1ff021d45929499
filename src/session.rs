//! Office session — everything the main screen owns while it is open.
//!
//! DESIGN
//! ======
//! `OfficeSession` is the explicit application context: the store handle,
//! the update throttle, the rendering state (layout, floor, selection), and
//! the two listeners that feed it. It is created when the main screen opens
//! (`open`) and torn down when it closes (`close`), which stops the throttle
//! so no timer outlives the screen.
//!
//! Store notifications are pulled with `next_event` and applied with
//! `apply` by the single UI loop. Nothing else mutates rendering state.
//!
//! ERROR HANDLING
//! ==============
//! Remote write failures are logged and swallowed; the office simply does
//! not change for anyone. Programmer errors (empty keys, acting on nothing)
//! return `SessionError` immediately.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::layout::OfficeLayout;
use crate::menu::{MenuItem, options_menu};
use crate::model::{Floor, OfficeThing, ThingKind};
use crate::store::{
    AuthData, BACKGROUND_PATH, ChildEvent, FURNITURE_PATH, RealtimeStore, StoreError, Subscription, ValueEvent,
    furniture_path, put_thing,
};
use crate::throttle::UpdateThrottle;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("authentication failed: {0}")]
    Auth(#[source] StoreError),
    #[error("could not attach listener: {0}")]
    Subscribe(#[source] StoreError),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("nothing is selected")]
    NoSelection,
    #[error("no office thing with key {0}")]
    UnknownThing(String),
    #[error("only desks can be renamed, not {0}")]
    NotEditable(String),
}

/// A notification from one of the session's listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Floor(ValueEvent),
    Furniture(ChildEvent),
}

pub struct OfficeSession {
    store: Arc<dyn RealtimeStore>,
    auth: AuthData,
    throttle: UpdateThrottle,
    layout: OfficeLayout,
    floor: Floor,
    selected: Option<String>,
    floor_events: Subscription<ValueEvent>,
    furniture_events: Subscription<ChildEvent>,
}

impl OfficeSession {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Sign in anonymously, attach listeners, and start the throttle.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Auth` if sign-in fails and
    /// `SessionError::Subscribe` if a listener cannot be attached.
    pub async fn open(store: Arc<dyn RealtimeStore>, throttle_interval: Duration) -> Result<Self, SessionError> {
        let auth = store.auth_anonymously().await.map_err(|e| {
            warn!(error = %e, "authentication failed");
            SessionError::Auth(e)
        })?;
        info!(uid = %auth.uid, provider = %auth.provider, "authenticated");

        let floor_events = store
            .subscribe_value(BACKGROUND_PATH)
            .await
            .map_err(SessionError::Subscribe)?;
        let furniture_events = store
            .subscribe_children(FURNITURE_PATH)
            .await
            .map_err(SessionError::Subscribe)?;

        let throttle = UpdateThrottle::spawn(Arc::clone(&store), throttle_interval);

        Ok(Self {
            store,
            auth,
            throttle,
            layout: OfficeLayout::new(),
            floor: Floor::None,
            selected: None,
            floor_events,
            furniture_events,
        })
    }

    /// Stop the throttle (after a final flush), detach listeners, sign out.
    pub async fn close(self) {
        let Self { store, auth, throttle, floor_events, furniture_events, .. } = self;
        throttle.shutdown().await;
        drop(floor_events);
        drop(furniture_events);
        store.unauth().await;
        info!(uid = %auth.uid, "session closed");
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Wait for the next listener notification. `None` once both listeners end.
    pub async fn next_event(&mut self) -> Option<StoreEvent> {
        tokio::select! {
            Some(event) = self.floor_events.recv() => Some(StoreEvent::Floor(event)),
            Some(event) = self.furniture_events.recv() => Some(StoreEvent::Furniture(event)),
            else => None,
        }
    }

    /// A notification that is already queued, without waiting.
    pub fn try_next_event(&mut self) -> Option<StoreEvent> {
        if let Some(event) = self.floor_events.try_recv() {
            return Some(StoreEvent::Floor(event));
        }
        self.furniture_events.try_recv().map(StoreEvent::Furniture)
    }

    /// Apply every queued notification. Returns whether anything changed.
    pub fn apply_pending(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.try_next_event() {
            changed |= self.apply(event);
        }
        changed
    }

    /// Fold a notification into the rendering state. Returns whether the
    /// view needs redrawing.
    pub fn apply(&mut self, event: StoreEvent) -> bool {
        match event {
            StoreEvent::Floor(ValueEvent::Data(snapshot)) => {
                let floor = match &snapshot.value {
                    Value::Null => Floor::None,
                    Value::String(name) => match name.parse::<Floor>() {
                        Ok(floor) => floor,
                        Err(e) => {
                            warn!(error = %e, "keeping current floor");
                            return false;
                        }
                    },
                    other => {
                        warn!(value = %other, "floor is not a string; keeping current floor");
                        return false;
                    }
                };
                debug!(%floor, "floor changed");
                let changed = floor != self.floor;
                self.floor = floor;
                changed
            }
            StoreEvent::Floor(ValueEvent::Cancelled { reason }) => {
                warn!(%reason, "floor listener cancelled");
                false
            }
            StoreEvent::Furniture(event) => {
                if let ChildEvent::Removed { snapshot } = &event {
                    if self.selected.as_deref() == Some(snapshot.key.as_str()) {
                        self.selected = None;
                    }
                }
                self.layout.apply(&event)
            }
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn auth(&self) -> &AuthData {
        &self.auth
    }

    #[must_use]
    pub fn layout(&self) -> &OfficeLayout {
        &self.layout
    }

    #[must_use]
    pub fn floor(&self) -> Floor {
        self.floor
    }

    #[must_use]
    pub fn selected_key(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&OfficeThing> {
        self.selected.as_deref().and_then(|key| self.layout.get(key))
    }

    /// Options menu for the current selection.
    #[must_use]
    pub fn menu(&self) -> Vec<MenuItem> {
        options_menu(self.selected())
    }

    #[must_use]
    pub fn throttle(&self) -> &UpdateThrottle {
        &self.throttle
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Select the thing stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownThing` if the layout has no such key.
    pub fn select(&mut self, key: &str) -> Result<&OfficeThing, SessionError> {
        if !self.layout.contains(key) {
            return Err(SessionError::UnknownThing(key.to_string()));
        }
        self.selected = Some(key.to_string());
        self.layout
            .get(key)
            .ok_or_else(|| SessionError::UnknownThing(key.to_string()))
    }

    /// Select the topmost thing under a logical point, or clear the selection.
    pub fn select_at(&mut self, x: i32, y: i32) -> Option<&OfficeThing> {
        self.selected = self.layout.thing_at(x, y).and_then(|thing| thing.key.clone());
        self.selected()
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    fn selected_thing_mut(&mut self) -> Result<(String, &mut OfficeThing), SessionError> {
        let key = self.selected.clone().ok_or(SessionError::NoSelection)?;
        match self.layout.get_mut(&key) {
            Some(thing) => Ok((key, thing)),
            None => Err(SessionError::UnknownThing(key)),
        }
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Create a new thing of `kind` above everything else. Returns its key.
    pub async fn add_thing(&self, kind: ThingKind) -> String {
        let key = self.store.push_key();
        let highest = self.layout.highest_z_index();
        let z_index = highest.checked_add(1).unwrap_or_else(|| {
            warn!(highest, "stacking order exhausted; new thing shares the top zIndex");
            highest
        });
        let thing = OfficeThing::new(kind, z_index);
        debug!(%key, %kind, z_index, "adding thing");
        if let Err(e) = put_thing(self.store.as_ref(), &key, &thing).await {
            warn!(error = %e, %key, "add failed");
        }
        key
    }

    /// Move the selection to `(left, top)`. The write is throttled.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is selected.
    pub fn move_selected(&mut self, left: i32, top: i32) -> Result<(), SessionError> {
        let (key, thing) = self.selected_thing_mut()?;
        thing.move_to(left, top);
        let snapshot = thing.clone();
        self.throttle.record(&key, snapshot);
        Ok(())
    }

    /// Move the selection by `(dx, dy)`. The write is throttled.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is selected.
    pub fn drag_selected(&mut self, dx: i32, dy: i32) -> Result<(), SessionError> {
        let (left, top) = {
            let (_, thing) = self.selected_thing_mut()?;
            (thing.left.saturating_add(dx), thing.top.saturating_add(dy))
        };
        self.move_selected(left, top)
    }

    /// Turn the selection a quarter turn clockwise and write it immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is selected.
    pub async fn rotate_selected(&mut self) -> Result<(), SessionError> {
        let (key, thing) = self.selected_thing_mut()?;
        thing.rotate();
        let snapshot = thing.clone();
        debug!(%key, rotation = snapshot.rotation.degrees(), "rotating thing");
        self.update_thing(&key, snapshot).await
    }

    /// Rename the selected desk and write it immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is selected and
    /// `SessionError::NotEditable` for anything but a desk.
    pub async fn rename_selected(&mut self, name: &str) -> Result<(), SessionError> {
        let (key, thing) = self.selected_thing_mut()?;
        if !thing.is_editable() {
            return Err(SessionError::NotEditable(thing.kind.clone()));
        }
        thing.name = name.to_string();
        let snapshot = thing.clone();
        self.update_thing(&key, snapshot).await
    }

    /// Delete the selection. The layout drops it when the removal comes back.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when nothing is selected.
    pub async fn delete_selected(&mut self) -> Result<(), SessionError> {
        let key = self.selected.take().ok_or(SessionError::NoSelection)?;
        self.delete_thing(&key).await
    }

    /// Write `thing` under `key` now. Waits for an in-flight flush, then
    /// supersedes any pending throttled write, which can only carry older
    /// state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidArgument` for an empty key.
    pub async fn update_thing(&self, key: &str, mut thing: OfficeThing) -> Result<(), SessionError> {
        if key.is_empty() {
            return Err(SessionError::InvalidArgument("key must not be empty"));
        }
        thing.key = Some(key.to_string());
        let _writes = self.throttle.hold_writes().await;
        self.throttle.discard(key);
        if let Err(e) = put_thing(self.store.as_ref(), key, &thing).await {
            warn!(error = %e, %key, "update failed");
        }
        Ok(())
    }

    /// Remove the record under `key` and any pending write for it, after any
    /// in-flight flush has landed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidArgument` for an empty key.
    pub async fn delete_thing(&self, key: &str) -> Result<(), SessionError> {
        if key.is_empty() {
            return Err(SessionError::InvalidArgument("key must not be empty"));
        }
        let _writes = self.throttle.hold_writes().await;
        self.throttle.discard(key);
        debug!(%key, "deleting thing");
        if let Err(e) = self.store.remove_value(&furniture_path(key)).await {
            warn!(error = %e, %key, "delete failed");
        }
        Ok(())
    }

    /// Change the floor pattern for everyone. `Floor::None` removes it.
    pub async fn change_floor(&self, floor: Floor) {
        debug!(%floor, "changing floor");
        let result = match floor {
            Floor::None => self.store.remove_value(BACKGROUND_PATH).await,
            other => {
                self.store
                    .set_value(BACKGROUND_PATH, Value::String(other.as_str().to_string()))
                    .await
            }
        };
        if let Err(e) = result {
            warn!(error = %e, %floor, "floor change failed");
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
