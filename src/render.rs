//! Text renderer for the office floor plan.
//!
//! The logical floor (600x800) is scaled onto a character grid. The floor
//! pattern fills the background, then things are painted in z order so the
//! topmost one wins each cell. The selected thing is drawn with its glyph
//! in uppercase. A desk's name is written across its middle row when it
//! fits inside the footprint.

use std::fmt::Write as _;

use crate::layout::OfficeLayout;
use crate::model::{Floor, LOGICAL_HEIGHT, LOGICAL_WIDTH, OfficeThing, ThingKind};

pub const DEFAULT_COLS: usize = 60;
pub const DEFAULT_ROWS: usize = 40;

const UNKNOWN_GLYPH: char = '?';

fn floor_cell(floor: Floor, col: usize, row: usize) -> char {
    match floor {
        Floor::None => ' ',
        Floor::Carpet => '.',
        Floor::Grid => match (col % 5 == 0, row % 5 == 0) {
            (true, true) => '+',
            (false, true) => '-',
            (true, false) => '|',
            (false, false) => ' ',
        },
        Floor::Tile => {
            if (col / 2 + row) % 2 == 0 {
                ':'
            } else {
                ' '
            }
        }
        Floor::Wood => {
            if row % 2 == 0 {
                '='
            } else {
                '-'
            }
        }
    }
}

/// Map a logical span `[start, end)` onto `cells` cells along an axis of
/// `extent` logical units. Always covers at least one cell when visible.
fn span(start: i32, end: i32, extent: i32, cells: usize) -> Option<(usize, usize)> {
    if end <= 0 || start >= extent {
        return None;
    }
    let cells_i = i64::try_from(cells).ok()?;
    let extent = i64::from(extent);
    let lo = (i64::from(start) * cells_i).div_euclid(extent).clamp(0, cells_i);
    let hi = (i64::from(end) * cells_i + extent - 1).div_euclid(extent).clamp(0, cells_i);
    let hi = if hi <= lo { lo + 1 } else { hi };
    if lo >= cells_i {
        return None;
    }
    Some((usize::try_from(lo).ok()?, usize::try_from(hi.min(cells_i)).ok()?))
}

fn glyph(thing: &OfficeThing, selected: bool) -> char {
    let glyph = thing.thing_kind().map_or(UNKNOWN_GLYPH, ThingKind::glyph);
    if selected { glyph.to_ascii_uppercase() } else { glyph }
}

/// Draw the office into a bordered `cols` x `rows` character grid.
#[must_use]
pub fn render_floor_plan(
    layout: &OfficeLayout,
    floor: Floor,
    selected: Option<&str>,
    cols: usize,
    rows: usize,
) -> String {
    let mut grid: Vec<Vec<char>> = (0..rows)
        .map(|row| (0..cols).map(|col| floor_cell(floor, col, row)).collect())
        .collect();

    for thing in layout.sorted() {
        let (w, h) = thing.footprint();
        let (Some((c0, c1)), Some((r0, r1))) = (
            span(thing.left, thing.left.saturating_add(w), LOGICAL_WIDTH, cols),
            span(thing.top, thing.top.saturating_add(h), LOGICAL_HEIGHT, rows),
        ) else {
            continue;
        };
        let is_selected = thing.key.is_some() && thing.key.as_deref() == selected;
        let ch = glyph(thing, is_selected);
        for line in &mut grid[r0..r1] {
            for cell in &mut line[c0..c1] {
                *cell = ch;
            }
        }

        let name: Vec<char> = thing.name.chars().collect();
        if !name.is_empty() && name.len() <= c1 - c0 {
            let row = r0 + (r1 - r0) / 2;
            let start = c0 + (c1 - c0 - name.len()) / 2;
            grid[row][start..start + name.len()].copy_from_slice(&name);
        }
    }

    let border = format!("+{}+", "-".repeat(cols));
    let mut out = String::with_capacity((cols + 3) * (rows + 2));
    out.push_str(&border);
    out.push('\n');
    for line in grid {
        out.push('|');
        out.extend(line);
        out.push_str("|\n");
    }
    out.push_str(&border);
    out.push('\n');
    out
}

/// One line per thing for `list`.
#[must_use]
pub fn describe(thing: &OfficeThing, selected: bool) -> String {
    let mut line = String::new();
    let marker = if selected { '*' } else { ' ' };
    let _ = write!(
        line,
        "{marker} {key:<20} {glyph} {kind:<13} at ({left}, {top}) rot {rot:>3} z {z}",
        key = thing.key.as_deref().unwrap_or("-"),
        glyph = glyph(thing, false),
        kind = thing.kind,
        left = thing.left,
        top = thing.top,
        rot = thing.rotation.degrees(),
        z = thing.z_index,
    );
    if !thing.name.is_empty() {
        let _ = write!(line, " \"{}\"", thing.name);
    }
    line
}

/// Every thing in draw order, one per line.
#[must_use]
pub fn list(layout: &OfficeLayout, selected: Option<&str>) -> String {
    if layout.is_empty() {
        return "(the office is empty)\n".to_string();
    }
    let mut out = String::new();
    for thing in layout.sorted() {
        out.push_str(&describe(thing, thing.key.as_deref() == selected));
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
