//! Office Mover — a shared office floor plan kept in sync through a realtime
//! JSON store.
//!
//! Every signed-in client sees the same furniture (`furniture/<key>`) and
//! floor pattern (`background`). Creates, rotations, renames and deletions
//! are written immediately; drags are coalesced by the update throttle and
//! written at most once per interval per piece.
//!
//! - `model`: furniture records, kinds, rotation, floor patterns
//! - `store`: the `RealtimeStore` trait with in-memory and REST backends
//! - `layout`: local cache of the furniture subtree
//! - `throttle`: coalescing periodic writer
//! - `session`: application context for one signed-in office view
//! - `app`: terminal screens driving a session

pub mod app;
pub mod command;
pub mod config;
pub mod layout;
pub mod menu;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
pub mod throttle;
