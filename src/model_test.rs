use super::*;
use serde_json::json;

// =============================================================================
// Rotation
// =============================================================================

#[test]
fn rotation_cycles_through_quarter_turns_and_wraps() {
    let mut rotation = Rotation::Deg0;
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(rotation.degrees());
        rotation = rotation.next();
    }
    assert_eq!(seen, vec![0, 90, 180, 270, 0]);
}

#[test]
fn rotation_normalizes_foreign_values() {
    assert_eq!(Rotation::from_degrees(45), Rotation::Deg0);
    assert_eq!(Rotation::from_degrees(359), Rotation::Deg270);
    assert_eq!(Rotation::from_degrees(360), Rotation::Deg0);
    assert_eq!(Rotation::from_degrees(-90), Rotation::Deg270);
    assert_eq!(Rotation::from_degrees(450), Rotation::Deg90);
}

#[test]
fn rotation_serializes_as_integer_degrees() {
    assert_eq!(serde_json::to_value(Rotation::Deg180).unwrap(), json!(180));
    let back: Rotation = serde_json::from_value(json!(270)).unwrap();
    assert_eq!(back, Rotation::Deg270);
}

// =============================================================================
// ThingKind / Floor names
// =============================================================================

#[test]
fn thing_kind_names_round_trip_through_from_str() {
    for kind in ThingKind::ALL {
        assert_eq!(kind.as_str().parse::<ThingKind>().unwrap(), kind);
    }
}

#[test]
fn thing_kind_serde_matches_wire_names() {
    assert_eq!(serde_json::to_value(ThingKind::DogCorgi).unwrap(), json!("dog_corgi"));
    assert_eq!(serde_json::to_value(ThingKind::Plant2).unwrap(), json!("plant2"));
}

#[test]
fn unknown_kind_is_rejected() {
    let err = "sofa".parse::<ThingKind>().unwrap_err();
    assert_eq!(err.value, "sofa");
    assert_eq!(err.to_string(), "unknown thing kind: sofa");
}

#[test]
fn floor_parses_every_menu_entry() {
    for floor in Floor::ALL {
        assert_eq!(floor.as_str().parse::<Floor>().unwrap(), floor);
    }
    assert!("marble".parse::<Floor>().is_err());
}

// =============================================================================
// OfficeThing
// =============================================================================

#[test]
fn new_thing_is_centered_unrotated_and_unnamed() {
    let thing = OfficeThing::new(ThingKind::Desk, 7);
    assert_eq!(thing.kind, "desk");
    assert_eq!(thing.left, LOGICAL_WIDTH / 2);
    assert_eq!(thing.top, LOGICAL_HEIGHT / 2);
    assert_eq!(thing.rotation, Rotation::Deg0);
    assert_eq!(thing.z_index, 7);
    assert_eq!(thing.name, "");
    assert!(thing.key.is_none());
}

#[test]
fn wire_format_uses_type_and_z_index_names_without_key() {
    let mut thing = OfficeThing::new(ThingKind::Laptop, 3);
    thing.key = Some("-Kabc".into());
    let value = serde_json::to_value(&thing).unwrap();
    assert_eq!(
        value,
        json!({"type": "laptop", "left": 300, "top": 400, "rotation": 0, "zIndex": 3, "name": ""})
    );
}

#[test]
fn decode_fills_missing_fields_with_defaults() {
    let thing: OfficeThing = serde_json::from_value(json!({"type": "plant1"})).unwrap();
    assert_eq!(thing.left, 0);
    assert_eq!(thing.z_index, 0);
    assert_eq!(thing.rotation, Rotation::Deg0);
    assert_eq!(thing.name, "");
}

#[test]
fn decode_without_type_fails() {
    assert!(serde_json::from_value::<OfficeThing>(json!({"left": 1})).is_err());
}

#[test]
fn only_desks_are_editable() {
    assert!(OfficeThing::new(ThingKind::Desk, 0).is_editable());
    assert!(!OfficeThing::new(ThingKind::Pacman, 0).is_editable());
}

#[test]
fn sideways_rotation_swaps_footprint() {
    let mut thing = OfficeThing::new(ThingKind::Desk, 0);
    assert_eq!(thing.footprint(), (120, 80));
    thing.rotate();
    assert_eq!(thing.footprint(), (80, 120));
    thing.rotate();
    assert_eq!(thing.footprint(), (120, 80));
}

#[test]
fn unknown_kind_uses_fallback_footprint() {
    let thing: OfficeThing = serde_json::from_value(json!({"type": "sofa"})).unwrap();
    assert!(thing.thing_kind().is_none());
    assert_eq!(thing.footprint(), (50, 50));
}

#[test]
fn move_to_clamps_inside_floor() {
    let mut thing = OfficeThing::new(ThingKind::Desk, 0);
    thing.move_to(-40, 10_000);
    assert_eq!(thing.left, 0);
    assert_eq!(thing.top, LOGICAL_HEIGHT - 80);
    thing.move_to(10_000, -1);
    assert_eq!(thing.left, LOGICAL_WIDTH - 120);
    assert_eq!(thing.top, 0);
}

#[test]
fn contains_uses_half_open_footprint() {
    let mut thing = OfficeThing::new(ThingKind::Laptop, 0);
    thing.move_to(10, 20);
    assert!(thing.contains(10, 20));
    assert!(thing.contains(49, 49));
    assert!(!thing.contains(50, 20));
    assert!(!thing.contains(9, 20));
}

#[test]
fn decode_truncates_fractional_numbers() {
    let thing: OfficeThing =
        serde_json::from_value(json!({"type": "desk", "left": 120.5, "top": -3.9, "rotation": 90.0, "zIndex": 4.7}))
            .unwrap();
    assert_eq!((thing.left, thing.top), (120, -3));
    assert_eq!(thing.rotation, Rotation::Deg90);
    assert_eq!(thing.z_index, 4);
}

#[test]
fn decode_saturates_out_of_range_coordinates() {
    let thing: OfficeThing =
        serde_json::from_value(json!({"type": "desk", "left": 1e12, "top": -9_000_000_000_i64})).unwrap();
    assert_eq!(thing.left, i32::MAX);
    assert_eq!(thing.top, i32::MIN);
}

#[test]
fn decode_rejects_non_numeric_position() {
    assert!(serde_json::from_value::<OfficeThing>(json!({"type": "desk", "left": "12"})).is_err());
}

#[test]
fn contains_near_coordinate_ceiling_does_not_overflow() {
    let mut thing = OfficeThing::new(ThingKind::Desk, 0);
    thing.left = i32::MAX - 10;
    thing.top = i32::MAX - 10;
    assert!(thing.contains(i32::MAX, i32::MAX));
    assert!(!thing.contains(i32::MAX - 11, i32::MAX));
}
