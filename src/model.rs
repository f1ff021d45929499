//! Office model — furniture records, rotation steps, and floor patterns.
//!
//! DESIGN
//! ======
//! `OfficeThing` mirrors one record under `furniture/<key>`. The key is the
//! record's path segment, so it travels next to the record but is never
//! serialized into it. The `type` field stays a free string on the wire so
//! records written by other clients with kinds we do not know still render;
//! `ThingKind` is the closed set this client can create.
//!
//! Positions are in logical floor units (`LOGICAL_WIDTH` x `LOGICAL_HEIGHT`),
//! independent of how the floor is drawn.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// LOGICAL FLOOR
// =============================================================================

/// Width of the office floor in logical units.
pub const LOGICAL_WIDTH: i32 = 600;

/// Height of the office floor in logical units.
pub const LOGICAL_HEIGHT: i32 = 800;

/// Footprint used for records whose `type` this client does not recognize.
const UNKNOWN_FOOTPRINT: (i32, i32) = (50, 50);

/// Returned when a menu name does not match any known kind or floor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value}")]
pub struct ParseNameError {
    pub what: &'static str,
    pub value: String,
}

// =============================================================================
// ROTATION
// =============================================================================

/// Clockwise rotation, restricted to quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Normalize arbitrary degrees down to the nearest quarter turn.
    #[must_use]
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) / 90 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    #[must_use]
    pub fn degrees(self) -> i64 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// The next quarter turn; 270 wraps to 0.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// True when the footprint is turned on its side.
    #[must_use]
    pub fn is_sideways(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

impl From<i64> for Rotation {
    fn from(degrees: i64) -> Self {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

// =============================================================================
// THING KIND
// =============================================================================

/// Furniture this client offers in the "new thing" menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThingKind {
    Android,
    Ballpit,
    Desk,
    DogCorgi,
    DogRetriever,
    Laptop,
    Nerfgun,
    Pacman,
    Pingpong,
    Plant1,
    Plant2,
    Redstapler,
}

impl ThingKind {
    /// Menu order.
    pub const ALL: [ThingKind; 12] = [
        Self::Android,
        Self::Ballpit,
        Self::Desk,
        Self::DogCorgi,
        Self::DogRetriever,
        Self::Laptop,
        Self::Nerfgun,
        Self::Pacman,
        Self::Pingpong,
        Self::Plant1,
        Self::Plant2,
        Self::Redstapler,
    ];

    /// Wire name stored in the record's `type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ballpit => "ballpit",
            Self::Desk => "desk",
            Self::DogCorgi => "dog_corgi",
            Self::DogRetriever => "dog_retriever",
            Self::Laptop => "laptop",
            Self::Nerfgun => "nerfgun",
            Self::Pacman => "pacman",
            Self::Pingpong => "pingpong",
            Self::Plant1 => "plant1",
            Self::Plant2 => "plant2",
            Self::Redstapler => "redstapler",
        }
    }

    /// Unrotated `(width, height)` in logical units.
    #[must_use]
    pub fn footprint(self) -> (i32, i32) {
        match self {
            Self::Android => (60, 70),
            Self::Ballpit => (150, 150),
            Self::Desk => (120, 80),
            Self::DogCorgi => (60, 40),
            Self::DogRetriever => (80, 50),
            Self::Laptop => (40, 30),
            Self::Nerfgun => (50, 25),
            Self::Pacman => (110, 130),
            Self::Pingpong => (150, 90),
            Self::Plant1 | Self::Plant2 => (45, 45),
            Self::Redstapler => (30, 15),
        }
    }

    /// Single-character glyph used by the text renderer.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Android => 'a',
            Self::Ballpit => 'o',
            Self::Desk => 'd',
            Self::DogCorgi => 'c',
            Self::DogRetriever => 'r',
            Self::Laptop => 'l',
            Self::Nerfgun => 'n',
            Self::Pacman => 'm',
            Self::Pingpong => 't',
            Self::Plant1 => 'p',
            Self::Plant2 => 'q',
            Self::Redstapler => 's',
        }
    }
}

impl fmt::Display for ThingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThingKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseNameError { what: "thing kind", value: s.to_string() })
    }
}

// =============================================================================
// FLOOR
// =============================================================================

/// Floor pattern stored under `background`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Floor {
    #[default]
    None,
    Carpet,
    Grid,
    Tile,
    Wood,
}

impl Floor {
    pub const ALL: [Floor; 5] = [Self::None, Self::Carpet, Self::Grid, Self::Tile, Self::Wood];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Carpet => "carpet",
            Self::Grid => "grid",
            Self::Tile => "tile",
            Self::Wood => "wood",
        }
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Floor {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|floor| floor.as_str() == s)
            .ok_or_else(|| ParseNameError { what: "floor", value: s.to_string() })
    }
}

// =============================================================================
// OFFICE THING
// =============================================================================

/// A piece of furniture on the office floor. Mirrors `furniture/<key>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeThing {
    /// Store-assigned key. Not part of the stored record.
    #[serde(skip)]
    pub key: Option<String>,
    /// Furniture category. Immutable after creation.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub left: i32,
    #[serde(default, deserialize_with = "de_coordinate")]
    pub top: i32,
    #[serde(default, deserialize_with = "de_rotation")]
    pub rotation: Rotation,
    #[serde(default, rename = "zIndex", deserialize_with = "de_z_index")]
    pub z_index: i64,
    #[serde(default)]
    pub name: String,
}

impl OfficeThing {
    /// A fresh, unrotated, unnamed thing centered on the floor.
    #[must_use]
    pub fn new(kind: ThingKind, z_index: i64) -> Self {
        Self {
            key: None,
            kind: kind.as_str().to_string(),
            left: LOGICAL_WIDTH / 2,
            top: LOGICAL_HEIGHT / 2,
            rotation: Rotation::Deg0,
            z_index,
            name: String::new(),
        }
    }

    /// Known kind, or `None` for types written by other clients.
    #[must_use]
    pub fn thing_kind(&self) -> Option<ThingKind> {
        self.kind.parse().ok()
    }

    /// Only desks carry an editable name.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.thing_kind() == Some(ThingKind::Desk)
    }

    /// Rotated `(width, height)` in logical units.
    #[must_use]
    pub fn footprint(&self) -> (i32, i32) {
        let (w, h) = self.thing_kind().map_or(UNKNOWN_FOOTPRINT, ThingKind::footprint);
        if self.rotation.is_sideways() { (h, w) } else { (w, h) }
    }

    /// Whether the logical point lies inside the rotated footprint.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (w, h) = self.footprint();
        let (x, y) = (i64::from(x), i64::from(y));
        let (left, top) = (i64::from(self.left), i64::from(self.top));
        x >= left && x < left + i64::from(w) && y >= top && y < top + i64::from(h)
    }

    /// Move to `(left, top)`, clamped so the footprint stays on the floor.
    pub fn move_to(&mut self, left: i32, top: i32) {
        let (w, h) = self.footprint();
        self.left = left.clamp(0, (LOGICAL_WIDTH - w).max(0));
        self.top = top.clamp(0, (LOGICAL_HEIGHT - h).max(0));
    }

    /// Advance to the next quarter turn.
    pub fn rotate(&mut self) {
        self.rotation = self.rotation.next();
    }
}

// =============================================================================
// WIRE NUMBERS
// =============================================================================

/// A JSON number as other clients write it: integral or fractional.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Int(i64),
    Float(f64),
}

impl WireNumber {
    /// Truncate toward zero, saturating at the `i64` range. NaN becomes 0.
    #[allow(clippy::cast_possible_truncation)]
    fn truncate(self) -> i64 {
        match self {
            Self::Int(value) => value,
            Self::Float(value) => value as i64,
        }
    }
}

fn de_coordinate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = WireNumber::deserialize(deserializer)?.truncate();
    Ok(i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX }))
}

fn de_z_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(WireNumber::deserialize(deserializer)?.truncate())
}

fn de_rotation<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rotation, D::Error> {
    Ok(Rotation::from_degrees(WireNumber::deserialize(deserializer)?.truncate()))
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
