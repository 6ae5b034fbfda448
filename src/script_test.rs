#![allow(clippy::float_cmp)]

use super::*;

fn run(raw: &str, touch: bool) -> (EngineCore, Vec<Action>) {
    let steps = parse_script(raw).unwrap();
    let mut core = build_engine(&CanvasConfig::default(), touch).unwrap();
    let actions = replay(&mut core, &steps).unwrap();
    (core, actions)
}

const DROP_AND_RESIZE: &str = r#"[
    {"op": "surface", "x": 0, "y": 0, "width": 800, "height": 600},
    {"op": "palette_drag", "template": "1", "x": -20, "y": 40},
    {"op": "move", "x": 120, "y": 80},
    {"op": "up", "x": 120, "y": 80},
    {"op": "down", "x": 220, "y": 180},
    {"op": "move", "x": 260, "y": 200},
    {"op": "up", "x": 260, "y": 200}
]"#;

#[test]
fn parses_every_step_kind() {
    let steps = parse_script(
        r#"[
            {"op": "surface", "x": 0, "y": 0, "width": 10, "height": 10},
            {"op": "overlay", "x": 0, "y": 0, "width": 5, "height": 5},
            {"op": "image", "data_uri": "data:image/png;base64,AA=="},
            {"op": "palette_drag", "template": "2", "device": "touch", "x": 1, "y": 2},
            {"op": "down", "x": 1, "y": 1},
            {"op": "move", "device": "touch", "x": 2, "y": 2},
            {"op": "up", "device": "touch"},
            {"op": "leave", "x": 3, "y": 3},
            {"op": "key", "key": "Escape"},
            {"op": "blur"},
            {"op": "remove", "id": "1-0"},
            {"op": "clear"}
        ]"#,
    )
    .unwrap();
    assert_eq!(steps.len(), 12);
    assert_eq!(
        steps[3],
        Step::PaletteDrag {
            template: "2".into(),
            pointer: PointerStep { device: DeviceKind::Touch, x: Some(1.0), y: Some(2.0) },
        }
    );
    assert_eq!(steps[6], Step::Up(PointerStep { device: DeviceKind::Touch, x: None, y: None }));
    assert_eq!(steps[10], Step::Remove { id: InstanceId::new("1", 0) });
}

#[test]
fn unknown_op_is_a_decode_error() {
    assert!(matches!(parse_script(r#"[{"op": "explode"}]"#), Err(ScriptError::Decode(_))));
}

#[test]
fn malformed_instance_id_is_a_decode_error() {
    assert!(matches!(parse_script(r#"[{"op": "remove", "id": "nodash"}]"#), Err(ScriptError::Decode(_))));
}

#[test]
fn replay_places_and_resizes() {
    let (core, actions) = run(DROP_AND_RESIZE, false);
    let layout = Layout::of(&core);
    assert_eq!(layout.items.len(), 1);
    let item = &layout.items[0];
    assert_eq!((item.x, item.y, item.width, item.height), (120.0, 80.0, 140.0, 120.0));
    assert!(actions.iter().any(|a| matches!(a, Action::ItemPlaced(_))));
    assert!(actions.iter().any(|a| matches!(a, Action::ItemResized(_))));
    assert!(!layout.has_image);
    assert!(!layout.drawing);
}

#[test]
fn touch_replay_matches_mouse_replay() {
    let touch_script = r#"[
        {"op": "surface", "x": 0, "y": 0, "width": 800, "height": 600},
        {"op": "palette_drag", "template": "1", "device": "touch", "x": -20, "y": 40},
        {"op": "move", "device": "touch", "x": 120, "y": 80},
        {"op": "up", "device": "touch"},
        {"op": "down", "device": "touch", "x": 220, "y": 180},
        {"op": "move", "device": "touch", "x": 260, "y": 200},
        {"op": "up", "device": "touch"}
    ]"#;
    let (mouse_core, _) = run(DROP_AND_RESIZE, false);
    let (touch_core, _) = run(touch_script, true);
    assert_eq!(Layout::of(&mouse_core), Layout::of(&touch_core));
}

#[test]
fn mouse_step_without_point_is_rejected() {
    let steps = parse_script(r#"[{"op": "up"}]"#).unwrap();
    let mut core = build_engine(&CanvasConfig::default(), false).unwrap();
    let err = replay(&mut core, &steps).unwrap_err();
    assert!(matches!(err, ScriptError::MissingPoint { index: 0 }));
}

#[test]
fn drawing_and_clear_round_trip() {
    let (core, _) = run(
        r#"[
            {"op": "surface", "x": 0, "y": 0, "width": 800, "height": 600},
            {"op": "image", "data_uri": "data:image/png;base64,AA=="},
            {"op": "down", "x": 0, "y": 0},
            {"op": "move", "x": 50, "y": 50},
            {"op": "up", "x": 50, "y": 50}
        ]"#,
        false,
    );
    assert!(Layout::of(&core).drawing);

    let (core, actions) = run(
        r#"[
            {"op": "surface", "x": 0, "y": 0, "width": 800, "height": 600},
            {"op": "image", "data_uri": "data:image/png;base64,AA=="},
            {"op": "down", "x": 0, "y": 0},
            {"op": "move", "x": 50, "y": 50},
            {"op": "up", "x": 50, "y": 50},
            {"op": "clear"}
        ]"#,
        false,
    );
    assert!(!Layout::of(&core).drawing);
    assert!(actions.contains(&Action::OverlayCleared));
}

#[test]
fn escape_then_remove() {
    let (core, actions) = run(
        r#"[
            {"op": "surface", "x": 0, "y": 0, "width": 800, "height": 600},
            {"op": "palette_drag", "template": "2", "x": 10, "y": 10},
            {"op": "key", "key": "Escape"},
            {"op": "up", "x": 10, "y": 10},
            {"op": "palette_drag", "template": "2", "x": -5, "y": 10},
            {"op": "up", "x": 300, "y": 300},
            {"op": "remove", "id": "2-0"}
        ]"#,
        false,
    );
    assert!(core.placed().is_empty());
    assert!(actions.iter().any(|a| matches!(a, Action::ItemRemoved { .. })));
}

#[test]
fn layout_serializes_ids_as_strings() {
    let (core, _) = run(DROP_AND_RESIZE, false);
    let json = serde_json::to_value(Layout::of(&core)).unwrap();
    assert_eq!(json["items"][0]["id"], "1-0");
    assert_eq!(json["items"][0]["width"], 140.0);
}

#[test]
fn mime_from_extension() {
    assert_eq!(image_mime(Path::new("plan.PNG")), "image/png");
    assert_eq!(image_mime(Path::new("site.jpeg")), "image/jpeg");
    assert_eq!(image_mime(Path::new("notes")), "application/octet-stream");
}
