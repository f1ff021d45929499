//! Office layout — the local rendering cache of `furniture`.
//!
//! DESIGN
//! ======
//! The layout is derived state: it is rebuilt incrementally from child
//! events and never written back as a whole. Local drags mutate entries
//! optimistically; the authoritative value arrives later through the same
//! child listener and simply overwrites the entry.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::model::OfficeThing;
use crate::store::ChildEvent;

#[derive(Debug, Default)]
pub struct OfficeLayout {
    things: HashMap<String, OfficeThing>,
}

impl OfficeLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a thing, re-applying its key.
    pub fn upsert(&mut self, key: &str, mut thing: OfficeThing) {
        thing.key = Some(key.to_string());
        self.things.insert(key.to_string(), thing);
    }

    pub fn remove(&mut self, key: &str) -> Option<OfficeThing> {
        self.things.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OfficeThing> {
        self.things.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut OfficeThing> {
        self.things.get_mut(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.things.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.things.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    /// Apply a furniture child event. Returns whether the layout changed.
    pub fn apply(&mut self, event: &ChildEvent) -> bool {
        match event {
            ChildEvent::Added { snapshot, .. } | ChildEvent::Changed { snapshot, .. } | ChildEvent::Moved { snapshot, .. } => {
                match snapshot.decode::<OfficeThing>() {
                    Ok(thing) => {
                        debug!(key = %snapshot.key, kind = %thing.kind, "thing updated");
                        self.upsert(&snapshot.key, thing);
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, key = %snapshot.key, "ignoring undecodable thing");
                        false
                    }
                }
            }
            ChildEvent::Removed { snapshot } => {
                debug!(key = %snapshot.key, "thing removed");
                self.remove(&snapshot.key).is_some()
            }
            ChildEvent::Cancelled { reason } => {
                warn!(%reason, "furniture listener cancelled");
                false
            }
        }
    }

    /// Highest stacking order in use, 0 for an empty office.
    #[must_use]
    pub fn highest_z_index(&self) -> i64 {
        self.things.values().map(|t| t.z_index).max().unwrap_or(0)
    }

    /// Things in draw order: `(z_index, key)` ascending.
    #[must_use]
    pub fn sorted(&self) -> Vec<&OfficeThing> {
        let mut things: Vec<(&String, &OfficeThing)> = self.things.iter().collect();
        things.sort_by(|(ka, a), (kb, b)| a.z_index.cmp(&b.z_index).then_with(|| ka.cmp(kb)));
        things.into_iter().map(|(_, thing)| thing).collect()
    }

    /// Topmost thing under a logical point.
    #[must_use]
    pub fn thing_at(&self, x: i32, y: i32) -> Option<&OfficeThing> {
        self.sorted().into_iter().rev().find(|thing| thing.contains(x, y))
    }

    /// Key equal to `prefix`, or the only key starting with it.
    #[must_use]
    pub fn resolve_key(&self, prefix: &str) -> Option<&str> {
        if let Some((key, _)) = self.things.get_key_value(prefix) {
            return Some(key.as_str());
        }
        let mut matches = self.things.keys().filter(|key| key.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(key), None) if !prefix.is_empty() => Some(key.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
