use super::*;
use crate::model::Rotation;

fn placed(kind: ThingKind, key: &str, left: i32, top: i32, z: i64) -> (String, OfficeThing) {
    let mut thing = OfficeThing::new(kind, z);
    thing.left = left;
    thing.top = top;
    (key.to_string(), thing)
}

fn layout_of(things: Vec<(String, OfficeThing)>) -> OfficeLayout {
    let mut layout = OfficeLayout::new();
    for (key, thing) in things {
        layout.upsert(&key, thing);
    }
    layout
}

fn cell(plan: &str, col: usize, row: usize) -> char {
    plan.lines().nth(row + 1).and_then(|line| line.chars().nth(col + 1)).unwrap()
}

#[test]
fn empty_office_is_bordered_floor() {
    let plan = render_floor_plan(&OfficeLayout::new(), Floor::Carpet, None, 4, 2);
    assert_eq!(plan, "+----+\n|....|\n|....|\n+----+\n");
}

#[test]
fn floor_none_is_blank() {
    let plan = render_floor_plan(&OfficeLayout::new(), Floor::None, None, 3, 1);
    assert_eq!(plan, "+---+\n|   |\n+---+\n");
}

#[test]
fn desk_covers_its_scaled_footprint() {
    let layout = layout_of(vec![placed(ThingKind::Desk, "d", 0, 0, 1)]);
    let plan = render_floor_plan(&layout, Floor::None, None, DEFAULT_COLS, DEFAULT_ROWS);
    // 120x80 logical on a 10x20 cell scale.
    assert_eq!(cell(&plan, 0, 0), 'd');
    assert_eq!(cell(&plan, 11, 3), 'd');
    assert_eq!(cell(&plan, 12, 0), ' ');
    assert_eq!(cell(&plan, 0, 4), ' ');
}

#[test]
fn rotated_thing_swaps_footprint() {
    let mut things = vec![placed(ThingKind::Desk, "d", 0, 0, 1)];
    things[0].1.rotation = Rotation::Deg90;
    let plan = render_floor_plan(&layout_of(things), Floor::None, None, DEFAULT_COLS, DEFAULT_ROWS);
    // 80x120 logical.
    assert_eq!(cell(&plan, 7, 5), 'd');
    assert_eq!(cell(&plan, 8, 0), ' ');
}

#[test]
fn topmost_thing_wins_and_selection_is_uppercase() {
    let layout = layout_of(vec![
        placed(ThingKind::Desk, "under", 0, 0, 1),
        placed(ThingKind::Laptop, "over", 0, 0, 2),
    ]);
    let plan = render_floor_plan(&layout, Floor::Wood, Some("over"), DEFAULT_COLS, DEFAULT_ROWS);
    assert_eq!(cell(&plan, 0, 0), 'L');
    assert_eq!(cell(&plan, 10, 0), 'd');
    assert_eq!(cell(&plan, 30, 30), '=');
    assert_eq!(cell(&plan, 30, 31), '-');
}

#[test]
fn desk_name_is_centered_on_middle_row() {
    let mut things = vec![placed(ThingKind::Desk, "d", 0, 0, 1)];
    things[0].1.name = "Ada".into();
    let plan = render_floor_plan(&layout_of(things), Floor::None, None, DEFAULT_COLS, DEFAULT_ROWS);
    let row: String = plan.lines().nth(3).unwrap().chars().skip(1).take(12).collect();
    assert_eq!(row, "ddddAdaddddd");
}

#[test]
fn unknown_kind_uses_placeholder_glyph() {
    let (key, mut thing) = placed(ThingKind::Desk, "x", 0, 0, 1);
    thing.kind = "hammock".into();
    let plan = render_floor_plan(&layout_of(vec![(key, thing)]), Floor::None, None, DEFAULT_COLS, DEFAULT_ROWS);
    assert_eq!(cell(&plan, 0, 0), '?');
}

#[test]
fn list_marks_selection_and_shows_names() {
    let mut things = vec![placed(ThingKind::Desk, "k1", 10, 20, 1), placed(ThingKind::Plant1, "k2", 0, 0, 2)];
    things[0].1.name = "Ada".into();
    let out = list(&layout_of(things), Some("k2"));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("  k1"));
    assert!(lines[0].contains("at (10, 20)"));
    assert!(lines[0].ends_with("\"Ada\""));
    assert!(lines[1].starts_with("* k2"));
}

#[test]
fn list_of_empty_office() {
    assert_eq!(list(&OfficeLayout::new(), None), "(the office is empty)\n");
}

#[test]
fn things_far_off_the_floor_are_skipped() {
    let layout = layout_of(vec![
        placed(ThingKind::Desk, "right", i32::MAX, 0, 1),
        placed(ThingKind::Desk, "below", 0, i32::MAX - 5, 2),
        placed(ThingKind::Desk, "left", i32::MIN, 0, 3),
    ]);
    let plan = render_floor_plan(&layout, Floor::None, None, DEFAULT_COLS, DEFAULT_ROWS);
    assert!(!plan.contains('d'));
}
