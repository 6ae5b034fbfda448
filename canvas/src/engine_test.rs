#![allow(clippy::float_cmp)]

use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::input::{CaptureGuard, MouseBackend, NoCapture, TouchBackend};

// =============================================================
// Helpers
// =============================================================

const SURFACE: Rect = Rect { x: 100.0, y: 50.0, width: 800.0, height: 600.0 };

#[derive(Clone, Default)]
struct CountingCapture {
    live: Rc<Cell<usize>>,
    acquired: Rc<Cell<usize>>,
}

impl CaptureTarget for CountingCapture {
    fn capture(&self) -> CaptureGuard {
        self.live.set(self.live.get() + 1);
        self.acquired.set(self.acquired.get() + 1);
        let live = Rc::clone(&self.live);
        CaptureGuard::new(move || live.set(live.get() - 1))
    }
}

fn laid_out(mut core: EngineCore) -> EngineCore {
    core.set_surface_bounds(SURFACE);
    core.set_overlay_display(SURFACE);
    core
}

fn mouse_core() -> EngineCore {
    laid_out(EngineCore::with_backend(&CanvasConfig::default(), Box::new(MouseBackend), Box::new(NoCapture)).unwrap())
}

fn touch_core() -> EngineCore {
    let backend = TouchBackend { enable_mouse_events: false };
    laid_out(EngineCore::with_backend(&CanvasConfig::default(), Box::new(backend), Box::new(NoCapture)).unwrap())
}

fn counting_core() -> (EngineCore, CountingCapture) {
    let capture = CountingCapture::default();
    let core =
        EngineCore::with_backend(&CanvasConfig::default(), Box::new(MouseBackend), Box::new(capture.clone())).unwrap();
    (laid_out(core), capture)
}

fn mouse(x: f64, y: f64) -> PointerInput {
    PointerInput::mouse(x, y)
}

/// Client point for a surface-local point.
fn client(x: f64, y: f64) -> PointerInput {
    mouse(SURFACE.x + x, SURFACE.y + y)
}

fn drop_template(core: &mut EngineCore, template: &str, x: f64, y: f64) -> PlacedItem {
    core.begin_palette_drag(template, &mouse(10.0, 10.0));
    let actions = core.on_pointer_up(&client(x, y));
    actions
        .into_iter()
        .find_map(|a| match a {
            Action::ItemPlaced(item) => Some(item),
            _ => None,
        })
        .unwrap()
}

fn with_image(mut core: EngineCore) -> EngineCore {
    core.set_image(UploadedImage::from_bytes("image/png", b"png"));
    core
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_core_is_idle_with_default_palette() {
    let core = mouse_core();
    assert_eq!(core.input, InputState::Idle);
    assert!(core.placed().is_empty());
    assert_eq!(core.templates().len(), 2);
    assert!(core.image().is_none());
    assert!(core.overlay.is_blank());
    assert!(!core.is_over());
}

#[test]
fn backend_follows_device_caps() {
    let config = CanvasConfig::default();
    let desktop = EngineCore::new(&config, DeviceCaps::default(), Box::new(NoCapture)).unwrap();
    assert_eq!(desktop.backend_kind(), DeviceKind::Mouse);

    let caps = DeviceCaps { touch_events: true, max_touch_points: 5 };
    let tablet = EngineCore::new(&config, caps, Box::new(NoCapture)).unwrap();
    assert_eq!(tablet.backend_kind(), DeviceKind::Touch);
}

#[test]
fn zero_sized_overlay_config_is_an_error() {
    let config = CanvasConfig { overlay_width: 0, ..CanvasConfig::default() };
    assert!(EngineCore::new(&config, DeviceCaps::default(), Box::new(NoCapture)).is_err());
}

#[test]
fn configured_floor_below_minimum_is_raised() {
    let config: CanvasConfig = serde_json::from_str(r#"{"min_item_size": 10}"#).unwrap();
    let mut core =
        laid_out(EngineCore::with_backend(&config, Box::new(MouseBackend), Box::new(NoCapture)).unwrap());
    let a = drop_template(&mut core, "1", 0.0, 0.0);
    assert_eq!(core.registry.min_size(), MIN_ITEM_SIZE);

    core.on_pointer_down(&client(100.0, 100.0));
    core.on_pointer_move(&client(0.0, 0.0));
    let item = core.item(&a.id).unwrap();
    assert_eq!((item.width, item.height), (50.0, 50.0));
}

#[test]
fn config_fills_missing_fields_with_defaults() {
    let config: CanvasConfig = serde_json::from_str(r#"{"min_item_size": 20.0}"#).unwrap();
    assert_eq!(config.min_item_size, 20.0);
    assert_eq!(config.default_item_size, DEFAULT_ITEM_SIZE);
    assert_eq!(config.overlay_width, OVERLAY_WIDTH);
    assert!(config.touch_accepts_mouse);
}

// =============================================================
// Palette drags
// =============================================================

#[test]
fn palette_drop_places_item_at_local_point() {
    let mut core = mouse_core();
    let actions = core.begin_palette_drag("1", &client(120.0, 80.0));
    assert!(actions.contains(&Action::DropHighlight(true)));
    assert_eq!(core.input, InputState::Dragging);

    let actions = core.on_pointer_up(&client(120.0, 80.0));
    let placed = &core.placed()[0];
    assert_eq!((placed.x, placed.y, placed.width, placed.height), (120.0, 80.0, 100.0, 100.0));
    assert_eq!(placed.id.template(), "1");
    assert!(actions.contains(&Action::ItemPlaced(placed.clone())));
    assert!(actions.contains(&Action::DropHighlight(false)));
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn repeated_template_drops_yield_distinct_items() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 120.0, 80.0);
    let b = drop_template(&mut core, "1", 10.0, 10.0);
    assert_ne!(a.id, b.id);
    assert_eq!(core.placed().len(), 2);
}

#[test]
fn drop_outside_surface_cancels_without_mutation() {
    let mut core = mouse_core();
    core.begin_palette_drag("2", &mouse(10.0, 10.0));
    let actions = core.on_pointer_up(&mouse(20.0, 20.0));
    assert!(actions.contains(&Action::DragCancelled(CancelReason::OutsideTarget)));
    assert!(core.placed().is_empty());
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn hover_toggles_drop_highlight_on_change_only() {
    let mut core = mouse_core();
    core.begin_palette_drag("1", &mouse(10.0, 10.0));
    assert_eq!(core.on_pointer_move(&client(100.0, 100.0)), vec![Action::DropHighlight(true)]);
    assert!(core.is_over());
    assert!(core.on_pointer_move(&client(150.0, 150.0)).is_empty());
    assert_eq!(core.on_pointer_move(&mouse(10.0, 10.0)), vec![Action::DropHighlight(false)]);
    assert!(!core.is_over());
}

#[test]
fn unknown_template_does_not_start_drag() {
    let mut core = mouse_core();
    assert!(core.begin_palette_drag("9", &mouse(10.0, 10.0)).is_empty());
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn mouse_backend_ignores_touch_press() {
    let mut core = mouse_core();
    assert!(core.begin_palette_drag("1", &PointerInput::touch(10.0, 10.0)).is_empty());
    assert_eq!(core.input, InputState::Idle);
}

// =============================================================
// Placed items
// =============================================================

#[test]
fn redrop_moves_only_that_item() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 0.0, 0.0);
    let b = drop_template(&mut core, "2", 300.0, 300.0);

    core.on_pointer_down(&client(50.0, 50.0));
    assert!(matches!(core.input, InputState::Pressing { ref id, .. } if *id == a.id));
    let actions = core.on_pointer_move(&client(400.0, 100.0));
    assert!(actions.contains(&Action::SetCursor("grabbing".into())));
    assert_eq!(core.input, InputState::Dragging);
    let actions = core.on_pointer_up(&client(400.0, 100.0));

    let moved = core.item(&a.id).unwrap();
    assert_eq!((moved.x, moved.y), (400.0, 100.0));
    assert!(actions.contains(&Action::ItemMoved(moved.clone())));
    assert_eq!(core.item(&b.id).unwrap(), &b);
    assert_eq!(core.placed().len(), 2);
}

#[test]
fn click_on_item_leaves_it_in_place() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 100.0, 100.0);

    assert!(core.on_pointer_down(&client(150.0, 150.0)).is_empty());
    let actions = core.on_pointer_up(&client(150.0, 150.0));

    assert!(actions.is_empty());
    assert_eq!(core.item(&a.id).unwrap(), &a);
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn press_becomes_drag_only_after_pointer_moves() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 100.0, 100.0);

    core.on_pointer_down(&client(150.0, 150.0));
    assert!(core.on_pointer_move(&client(150.0, 150.0)).is_empty());
    assert!(matches!(core.input, InputState::Pressing { .. }));
    assert!(!core.dnd.is_dragging());

    core.on_pointer_move(&client(160.0, 150.0));
    assert!(core.dnd.is_dragging());
    core.on_pointer_up(&client(160.0, 150.0));
    assert_eq!(core.item(&a.id).unwrap().x, 160.0);
}

#[test]
fn escape_during_press_prevents_drag() {
    let (mut core, capture) = counting_core();
    let a = drop_template(&mut core, "1", 100.0, 100.0);

    core.on_pointer_down(&client(150.0, 150.0));
    assert_eq!(capture.live.get(), 1);
    assert!(core.on_key_down(&Key("Escape".into())).is_empty());
    assert_eq!(core.input, InputState::Idle);
    assert_eq!(capture.live.get(), 0);

    assert!(core.on_pointer_move(&client(300.0, 300.0)).is_empty());
    core.on_pointer_up(&client(300.0, 300.0));
    assert_eq!(core.item(&a.id).unwrap(), &a);
}

#[test]
fn drop_onto_another_item_uses_surface_coordinates() {
    let mut core = mouse_core();
    drop_template(&mut core, "1", 200.0, 200.0);
    let b = drop_template(&mut core, "2", 250.0, 250.0);
    assert_eq!((b.x, b.y), (250.0, 250.0));
}

#[test]
fn remove_button_removes_item() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 0.0, 0.0);
    let b = drop_template(&mut core, "2", 300.0, 0.0);

    assert!(core.on_pointer_down(&client(85.0, 12.0)).is_empty());
    assert_eq!(core.input, InputState::Removing { id: a.id.clone() });
    assert!(core.item(&a.id).is_some());

    let actions = core.on_pointer_up(&client(88.0, 10.0));
    assert!(actions.contains(&Action::ItemRemoved { id: a.id.clone() }));
    assert!(core.item(&a.id).is_none());
    assert_eq!(core.placed(), std::slice::from_ref(&b));
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn sliding_off_remove_button_keeps_item() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 0.0, 0.0);

    core.on_pointer_down(&client(85.0, 12.0));
    core.on_pointer_move(&client(40.0, 60.0));
    assert!(core.on_pointer_up(&client(40.0, 60.0)).is_empty());

    assert_eq!(core.item(&a.id).unwrap(), &a);
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn remove_missing_item_is_noop() {
    let mut core = mouse_core();
    assert!(core.remove_item(&InstanceId::new("1", 42)).is_empty());
}

// =============================================================
// Resize
// =============================================================

#[test]
fn corner_handle_resizes_live() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 0.0, 0.0);

    let actions = core.on_pointer_down(&client(100.0, 100.0));
    assert_eq!(actions, vec![Action::SetCursor("nwse-resize".into())]);
    assert_eq!(core.input, InputState::Resizing { id: a.id.clone() });

    let actions = core.on_pointer_move(&client(130.0, 120.0));
    let item = core.item(&a.id).unwrap();
    assert_eq!((item.width, item.height), (130.0, 120.0));
    assert!(actions.contains(&Action::ItemResized(item.clone())));

    core.on_pointer_up(&client(130.0, 120.0));
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn resize_never_goes_below_floor() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 0.0, 0.0);
    core.on_pointer_down(&client(100.0, 100.0));
    for (x, y) in [(60.0, 60.0), (0.0, 0.0), (-300.0, -300.0)] {
        core.on_pointer_move(&client(x, y));
        let item = core.item(&a.id).unwrap();
        assert!(item.width >= 50.0 && item.height >= 50.0);
    }
}

#[test]
fn left_handle_keeps_right_edge() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 200.0, 100.0);
    core.on_pointer_down(&client(200.0, 150.0));
    for x in [150.0, 260.0, 290.0, 0.0] {
        core.on_pointer_move(&client(x, 150.0));
        let item = core.item(&a.id).unwrap();
        assert_eq!(item.x + item.width, 300.0);
    }
}

#[test]
fn removing_item_mid_resize_ends_gesture() {
    let mut core = mouse_core();
    let a = drop_template(&mut core, "1", 0.0, 0.0);
    core.on_pointer_down(&client(100.0, 100.0));
    core.remove_item(&a.id);
    core.on_pointer_move(&client(150.0, 150.0));
    assert_eq!(core.input, InputState::Idle);
    assert!(core.placed().is_empty());
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn drawing_requires_an_image() {
    let mut core = mouse_core();
    core.on_pointer_down(&client(100.0, 100.0));
    assert_eq!(core.input, InputState::Idle);
    core.on_pointer_move(&client(200.0, 100.0));
    assert!(core.overlay.is_blank());
}

#[test]
fn stroke_paints_and_clear_restores_blank() {
    let mut core = with_image(mouse_core());
    let a = drop_template(&mut core, "1", 500.0, 500.0);

    core.on_pointer_down(&client(100.0, 100.0));
    assert_eq!(core.input, InputState::Drawing);
    let actions = core.on_pointer_move(&client(200.0, 100.0));
    assert!(actions.contains(&Action::OverlayPainted));
    core.on_pointer_up(&client(200.0, 100.0));
    assert_eq!(core.input, InputState::Idle);

    assert_eq!(core.overlay.pixel(150, 100).unwrap()[0], 255);
    assert!(core.on_pointer_move(&client(300.0, 300.0)).is_empty());

    let actions = core.clear_drawing();
    assert!(actions.contains(&Action::OverlayCleared));
    assert!(core.overlay.is_blank());
    assert_eq!(core.item(&a.id).unwrap(), &a);
}

#[test]
fn leaving_overlay_ends_stroke() {
    let mut core = with_image(mouse_core());
    core.on_pointer_down(&client(10.0, 10.0));
    core.on_pointer_move(&mouse(5.0, 5.0));
    assert_eq!(core.input, InputState::Idle);
    assert!(!core.overlay.is_stroking());
}

#[test]
fn pointer_leave_ends_stroke() {
    let mut core = with_image(mouse_core());
    core.on_pointer_down(&client(10.0, 10.0));
    core.on_pointer_leave(&client(20.0, 20.0));
    assert_eq!(core.input, InputState::Idle);
    assert!(core.on_pointer_move(&client(60.0, 60.0)).is_empty());
}

#[test]
fn touch_strokes_paint_like_mouse_strokes() {
    let mut core = with_image(touch_core());
    core.on_pointer_down(&PointerInput::touch(200.0, 150.0));
    core.on_pointer_move(&PointerInput::touch(300.0, 150.0));
    core.on_pointer_up(&PointerInput::touch_released());
    assert_eq!(core.overlay.pixel(150, 100).unwrap()[0], 255);
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn press_on_item_does_not_draw() {
    let mut core = with_image(mouse_core());
    drop_template(&mut core, "1", 0.0, 0.0);
    core.on_pointer_down(&client(50.0, 50.0));
    assert!(matches!(core.input, InputState::Pressing { .. }));
    core.on_pointer_move(&client(60.0, 60.0));
    assert_eq!(core.input, InputState::Dragging);
    assert!(core.overlay.is_blank());
}

// =============================================================
// Gesture exclusivity and cancellation
// =============================================================

#[test]
fn presses_ignored_while_gesture_active() {
    let mut core = mouse_core();
    drop_template(&mut core, "1", 0.0, 0.0);
    core.begin_palette_drag("2", &mouse(10.0, 10.0));
    assert!(core.on_pointer_down(&client(85.0, 12.0)).is_empty());
    assert!(core.begin_palette_drag("1", &mouse(10.0, 10.0)).is_empty());
    assert_eq!(core.placed().len(), 1);
}

#[test]
fn escape_cancels_drag() {
    let mut core = mouse_core();
    core.begin_palette_drag("1", &client(10.0, 10.0));
    assert!(core.on_key_down(&Key("a".into())).is_empty());

    let actions = core.on_key_down(&Key("Escape".into()));
    assert!(actions.contains(&Action::DragCancelled(CancelReason::Escape)));
    assert!(actions.contains(&Action::DropHighlight(false)));
    assert_eq!(core.input, InputState::Idle);
    assert!(core.on_pointer_up(&client(10.0, 10.0)).is_empty());
    assert!(core.placed().is_empty());
}

#[test]
fn blur_cancels_drag_only() {
    let mut core = mouse_core();
    core.begin_palette_drag("1", &mouse(10.0, 10.0));
    let actions = core.on_blur();
    assert!(actions.contains(&Action::DragCancelled(CancelReason::Blur)));

    let a = drop_template(&mut core, "1", 0.0, 0.0);
    core.on_pointer_down(&client(100.0, 100.0));
    assert!(core.on_blur().is_empty());
    assert_eq!(core.input, InputState::Resizing { id: a.id });
}

// =============================================================
// Capture
// =============================================================

#[test]
fn capture_spans_exactly_one_gesture() {
    let (mut core, capture) = counting_core();
    core.begin_palette_drag("1", &mouse(10.0, 10.0));
    assert_eq!(capture.live.get(), 1);
    assert!(core.is_capturing());

    core.on_pointer_up(&client(10.0, 10.0));
    assert_eq!(capture.live.get(), 0);
    assert!(!core.is_capturing());
    assert_eq!(capture.acquired.get(), 1);
}

#[test]
fn remove_button_holds_capture_until_release() {
    let (mut core, capture) = counting_core();
    drop_template(&mut core, "1", 0.0, 0.0);
    core.on_pointer_down(&client(85.0, 12.0));
    assert_eq!(capture.live.get(), 1);
    core.on_pointer_up(&client(85.0, 12.0));
    assert_eq!(capture.live.get(), 0);
}

#[test]
fn cancel_and_teardown_release_capture() {
    let (mut core, capture) = counting_core();
    core.begin_palette_drag("1", &mouse(10.0, 10.0));
    core.on_key_down(&Key("Escape".into()));
    assert_eq!(capture.live.get(), 0);

    drop_template(&mut core, "1", 0.0, 0.0);
    core.on_pointer_down(&client(100.0, 100.0));
    assert_eq!(capture.live.get(), 1);
    assert!(core.teardown().is_empty());
    assert_eq!(capture.live.get(), 0);
    assert_eq!(core.input, InputState::Idle);
}

#[test]
fn teardown_mid_drag_reports_teardown() {
    let mut core = mouse_core();
    core.begin_palette_drag("1", &client(10.0, 10.0));
    let actions = core.teardown();
    assert_eq!(
        actions,
        vec![Action::DropHighlight(false), Action::DragCancelled(CancelReason::Teardown)]
    );
    assert!(!core.dnd.is_dragging());
    assert!(core.teardown().is_empty());
}
