use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;
use web_sys::HtmlCanvasElement;

use crate::consts::{
    DEFAULT_ITEM_SIZE, MIN_ITEM_SIZE, OVERLAY_HEIGHT, OVERLAY_WIDTH, STROKE_RGBA, STROKE_WIDTH_PX,
};
use crate::dnd::{CancelReason, DragDropEngine, DragOutcome, DragSource, DropSurface, SurfaceId};
use crate::geometry::{Point, Rect, to_local};
use crate::hit::{Hit, HitPart, ResizeAnchor, hit_test};
use crate::input::{
    CaptureTarget, DeviceCaps, DeviceKind, InputState, Key, PointerBackend, PointerInput, PointerTracker,
    select_backend,
};
use crate::overlay::{DrawingOverlay, OverlayError, StrokeStyle};
use crate::registry::{InstanceId, ItemRegistry, ItemTemplate, PlacedItem, Placement, UploadedImage, default_palette};
use crate::render;
use crate::resize::ResizeController;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// The one drop surface the engine registers: the image area.
pub const MAIN_SURFACE: SurfaceId = SurfaceId(0);

/// Tunables for the engine. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Size floor for placed items, in surface pixels. Values below
    /// [`MIN_ITEM_SIZE`] are raised to it.
    pub min_item_size: f64,
    /// Width and height of a freshly dropped item.
    pub default_item_size: f64,
    /// Overlay raster width.
    pub overlay_width: u32,
    /// Overlay raster height.
    pub overlay_height: u32,
    /// Pen colour.
    pub stroke_rgba: [u8; 4],
    /// Pen width in raster pixels.
    pub stroke_width: f32,
    /// Let the touch backend start drags from mouse presses too.
    pub touch_accepts_mouse: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_item_size: MIN_ITEM_SIZE,
            default_item_size: DEFAULT_ITEM_SIZE,
            overlay_width: OVERLAY_WIDTH,
            overlay_height: OVERLAY_HEIGHT,
            stroke_rgba: STROKE_RGBA,
            stroke_width: STROKE_WIDTH_PX,
            touch_accepts_mouse: true,
        }
    }
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ItemPlaced(PlacedItem),
    ItemMoved(PlacedItem),
    ItemResized(PlacedItem),
    ItemRemoved { id: InstanceId },
    /// The drop surface's "drop here" affordance turned on or off.
    DropHighlight(bool),
    DragCancelled(CancelReason),
    ImageChanged,
    OverlayPainted,
    OverlayCleared,
    SetCursor(String),
    RenderNeeded,
}

fn resize_cursor(anchor: ResizeAnchor) -> &'static str {
    match anchor {
        ResizeAnchor::N | ResizeAnchor::S => "ns-resize",
        ResizeAnchor::E | ResizeAnchor::W => "ew-resize",
        ResizeAnchor::Nw | ResizeAnchor::Se => "nwse-resize",
        ResizeAnchor::Ne | ResizeAnchor::Sw => "nesw-resize",
    }
}

/// Core engine state: all logic that does not depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub registry: ItemRegistry,
    pub dnd: DragDropEngine,
    pub resize: ResizeController,
    pub overlay: DrawingOverlay,
    pub input: InputState,
    image: Option<UploadedImage>,
    surface: Rect,
    tracker: PointerTracker,
    capture: Box<dyn CaptureTarget>,
}

impl EngineCore {
    /// Build an engine for a device with the given capabilities. The drag
    /// backend is chosen here and fixed for the engine's lifetime.
    pub fn new(config: &CanvasConfig, caps: DeviceCaps, capture: Box<dyn CaptureTarget>) -> Result<Self, OverlayError> {
        Self::with_backend(config, select_backend(caps, config.touch_accepts_mouse), capture)
    }

    /// Build an engine with an explicit drag backend.
    pub fn with_backend(
        config: &CanvasConfig,
        backend: Box<dyn PointerBackend>,
        capture: Box<dyn CaptureTarget>,
    ) -> Result<Self, OverlayError> {
        let style = StrokeStyle { rgba: config.stroke_rgba, width: config.stroke_width };
        let overlay = DrawingOverlay::new(config.overlay_width, config.overlay_height, style)?;
        if config.min_item_size.is_nan() || config.min_item_size < MIN_ITEM_SIZE {
            tracing::warn!(configured = config.min_item_size, floor = MIN_ITEM_SIZE, "item size floor raised");
        }
        let min_size = config.min_item_size.max(MIN_ITEM_SIZE);
        let registry = ItemRegistry::new(default_palette()).with_sizes(min_size, config.default_item_size);
        Ok(Self {
            registry,
            dnd: DragDropEngine::new(backend),
            resize: ResizeController::new(min_size),
            overlay,
            input: InputState::Idle,
            image: None,
            surface: Rect::default(),
            tracker: PointerTracker::new(),
            capture,
        })
    }

    // --- Layout inputs ---

    /// Set the drop surface's client-space bounds (after layout or scroll).
    pub fn set_surface_bounds(&mut self, bounds: Rect) {
        self.surface = bounds;
        self.dnd.register_surface(DropSurface { id: MAIN_SURFACE, bounds });
    }

    /// Set where the overlay raster is displayed, in client space.
    pub fn set_overlay_display(&mut self, display: Rect) {
        self.overlay.set_display(display);
    }

    // --- Data inputs ---

    /// Replace the background image. Drawing is only armed while one is set.
    pub fn set_image(&mut self, image: UploadedImage) -> Vec<Action> {
        tracing::info!(bytes = image.data_uri.len(), "background image replaced");
        self.image = Some(image);
        vec![Action::ImageChanged, Action::RenderNeeded]
    }

    // --- Commands ---

    /// Remove a placed item. Absent ids produce no actions.
    pub fn remove_item(&mut self, id: &InstanceId) -> Vec<Action> {
        match self.registry.remove(id) {
            Some(removed) => vec![Action::ItemRemoved { id: removed.id }, Action::RenderNeeded],
            None => Vec::new(),
        }
    }

    /// Wipe the drawing overlay. Placed items are unaffected.
    pub fn clear_drawing(&mut self) -> Vec<Action> {
        self.overlay.clear();
        tracing::info!("drawing cleared");
        vec![Action::OverlayCleared, Action::RenderNeeded]
    }

    /// Release any live gesture and its input capture.
    pub fn teardown(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.dnd.is_over(MAIN_SURFACE) {
            actions.push(Action::DropHighlight(false));
        }
        if self.dnd.cancel(CancelReason::Teardown).is_some() {
            actions.push(Action::DragCancelled(CancelReason::Teardown));
        }
        self.resize.end();
        self.overlay.end();
        self.tracker.release();
        self.input = InputState::Idle;
        actions
    }

    // --- Input events ---

    /// Press on a palette entry.
    pub fn begin_palette_drag(&mut self, template: &str, input: &PointerInput) -> Vec<Action> {
        if self.input != InputState::Idle {
            return Vec::new();
        }
        if self.registry.template(template).is_none() {
            tracing::warn!(%template, "drag of unknown template ignored");
            return Vec::new();
        }
        self.start_drag(DragSource::Palette { template: template.to_string() }, input)
    }

    /// Press on the drop surface: items and their handles take the press
    /// first; otherwise it arms a pen stroke on the overlay.
    ///
    /// A press on an item's body only becomes a drag once the pointer moves,
    /// and the remove button acts on release.
    pub fn on_pointer_down(&mut self, input: &PointerInput) -> Vec<Action> {
        if self.input != InputState::Idle {
            return Vec::new();
        }
        let pt = self.peek(input);
        let local = to_local(pt, self.surface);

        match hit_test(local, self.registry.list_placed()) {
            Some(Hit { id, part: HitPart::ResizeHandle(anchor) }) => {
                let Some(item) = self.registry.get(&id).cloned() else {
                    return Vec::new();
                };
                let pt = self.tracker.begin(input, self.capture.as_ref());
                self.resize.begin(&item, anchor, pt);
                self.input = InputState::Resizing { id };
                vec![Action::SetCursor(resize_cursor(anchor).into())]
            }
            Some(Hit { id, part: HitPart::RemoveButton }) => {
                self.tracker.begin(input, self.capture.as_ref());
                self.input = InputState::Removing { id };
                Vec::new()
            }
            Some(Hit { id, part: HitPart::Body }) => {
                if !self.dnd.accepts(input) {
                    tracing::debug!(device = ?input.device(), "press on item ignored by drag backend");
                    return Vec::new();
                }
                let origin = self.tracker.begin(input, self.capture.as_ref());
                self.input = InputState::Pressing { id, origin };
                Vec::new()
            }
            None => {
                if self.image.is_none() || !self.overlay.covers(pt) {
                    return Vec::new();
                }
                let pt = self.tracker.begin(input, self.capture.as_ref());
                self.overlay.begin(pt);
                self.input = InputState::Drawing;
                Vec::new()
            }
        }
    }

    pub fn on_pointer_move(&mut self, input: &PointerInput) -> Vec<Action> {
        match &self.input {
            InputState::Idle => Vec::new(),
            InputState::Pressing { id, origin } => {
                let (id, origin) = (id.clone(), *origin);
                let pt = self.tracker.track(input);
                if pt == origin {
                    return Vec::new();
                }
                self.promote_press(id, input, pt)
            }
            InputState::Removing { .. } => {
                self.tracker.track(input);
                Vec::new()
            }
            InputState::Dragging => {
                let pt = self.tracker.track(input);
                if self.dnd.hover(pt) {
                    vec![Action::DropHighlight(self.dnd.is_over(MAIN_SURFACE))]
                } else {
                    Vec::new()
                }
            }
            InputState::Resizing { .. } => {
                let pt = self.tracker.track(input);
                if let Some(item) = self.resize.update(pt, &mut self.registry) {
                    vec![Action::ItemResized(item), Action::RenderNeeded]
                } else {
                    self.tracker.release();
                    self.input = InputState::Idle;
                    vec![Action::SetCursor("default".into())]
                }
            }
            InputState::Drawing => {
                let pt = self.tracker.track(input);
                if !self.overlay.covers(pt) {
                    self.finish_stroke();
                    return Vec::new();
                }
                if self.overlay.extend(pt) {
                    vec![Action::OverlayPainted, Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn on_pointer_up(&mut self, input: &PointerInput) -> Vec<Action> {
        match &self.input {
            InputState::Idle => Vec::new(),
            InputState::Pressing { .. } => {
                self.tracker.end(input);
                self.input = InputState::Idle;
                Vec::new()
            }
            InputState::Removing { id } => {
                let id = id.clone();
                let pt = self.tracker.end(input);
                self.input = InputState::Idle;
                let local = to_local(pt, self.surface);
                match hit_test(local, self.registry.list_placed()) {
                    Some(Hit { id: hit, part: HitPart::RemoveButton }) if hit == id => self.remove_item(&id),
                    _ => {
                        tracing::debug!(%id, "remove released off its button; ignored");
                        Vec::new()
                    }
                }
            }
            InputState::Dragging => {
                let was_over = self.dnd.is_over(MAIN_SURFACE);
                let pt = self.tracker.end(input);
                self.input = InputState::Idle;
                let mut actions = Vec::new();
                if was_over {
                    actions.push(Action::DropHighlight(false));
                }
                match self.dnd.drop_at(pt, &mut self.registry) {
                    Some(DragOutcome::Dropped { placement: Some(placement), .. }) => {
                        actions.push(match placement {
                            Placement::Added(item) => Action::ItemPlaced(item),
                            Placement::Moved(item) => Action::ItemMoved(item),
                        });
                        actions.push(Action::RenderNeeded);
                    }
                    Some(DragOutcome::Cancelled { reason, .. }) => actions.push(Action::DragCancelled(reason)),
                    Some(DragOutcome::Dropped { placement: None, .. }) | None => {}
                }
                actions.push(Action::SetCursor("default".into()));
                actions
            }
            InputState::Resizing { .. } => {
                self.tracker.end(input);
                self.resize.end();
                self.input = InputState::Idle;
                vec![Action::SetCursor("default".into())]
            }
            InputState::Drawing => {
                self.tracker.end(input);
                self.finish_stroke();
                Vec::new()
            }
        }
    }

    /// The pointer left the overlay element: ends a pen stroke, nothing else.
    pub fn on_pointer_leave(&mut self, input: &PointerInput) -> Vec<Action> {
        if self.input == InputState::Drawing {
            self.tracker.end(input);
            self.finish_stroke();
        }
        Vec::new()
    }

    /// Escape cancels a drag, or a press on an item that has not become one.
    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if key.is_escape() {
            self.cancel_drag(CancelReason::Escape)
        } else {
            Vec::new()
        }
    }

    /// Losing window focus cancels a drag.
    pub fn on_blur(&mut self) -> Vec<Action> {
        self.cancel_drag(CancelReason::Blur)
    }

    fn start_drag(&mut self, source: DragSource, input: &PointerInput) -> Vec<Action> {
        let pt = self.peek(input);
        if !self.dnd.begin(source, input, pt) {
            return Vec::new();
        }
        self.tracker.begin(input, self.capture.as_ref());
        self.drag_started()
    }

    /// First move after a press on an item's body: the press becomes a drag
    /// of that item. Capture is already held from the press.
    fn promote_press(&mut self, id: InstanceId, input: &PointerInput, pt: Point) -> Vec<Action> {
        let Some(bounds) = self.registry.get(&id).map(PlacedItem::bounds) else {
            self.tracker.release();
            self.input = InputState::Idle;
            return Vec::new();
        };
        if !self.dnd.begin(DragSource::Placed { id, bounds }, input, pt) {
            self.tracker.release();
            self.input = InputState::Idle;
            return Vec::new();
        }
        self.drag_started()
    }

    fn drag_started(&mut self) -> Vec<Action> {
        self.input = InputState::Dragging;
        let mut actions = vec![Action::SetCursor("grabbing".into())];
        if self.dnd.is_over(MAIN_SURFACE) {
            actions.push(Action::DropHighlight(true));
        }
        actions
    }

    fn cancel_drag(&mut self, reason: CancelReason) -> Vec<Action> {
        if matches!(self.input, InputState::Pressing { .. }) {
            self.tracker.release();
            self.input = InputState::Idle;
            return Vec::new();
        }
        if self.input != InputState::Dragging {
            return Vec::new();
        }
        let was_over = self.dnd.is_over(MAIN_SURFACE);
        self.tracker.release();
        self.input = InputState::Idle;
        let mut actions = Vec::new();
        if was_over {
            actions.push(Action::DropHighlight(false));
        }
        if self.dnd.cancel(reason).is_some() {
            actions.push(Action::DragCancelled(reason));
        }
        actions.push(Action::SetCursor("default".into()));
        actions
    }

    fn finish_stroke(&mut self) {
        self.overlay.end();
        self.tracker.release();
        self.input = InputState::Idle;
    }

    /// Position of a press without starting capture, falling back to the last
    /// known pointer position for touch events with no active touches.
    fn peek(&self, input: &PointerInput) -> Point {
        input
            .client_point()
            .or_else(|| self.tracker.last())
            .unwrap_or_default()
    }

    // --- Queries ---

    #[must_use]
    pub fn templates(&self) -> &[ItemTemplate] {
        self.registry.list_templates()
    }

    #[must_use]
    pub fn placed(&self) -> &[PlacedItem] {
        self.registry.list_placed()
    }

    /// Look up a placed item by id.
    #[must_use]
    pub fn item(&self, id: &InstanceId) -> Option<&PlacedItem> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn surface_bounds(&self) -> Rect {
        self.surface
    }

    /// Whether the drop surface should show its "drop here" affordance.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.dnd.is_over(MAIN_SURFACE)
    }

    #[must_use]
    pub fn backend_kind(&self) -> DeviceKind {
        self.dnd.backend_kind()
    }

    /// Whether a gesture currently holds document-level input capture.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.tracker.is_capturing()
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the overlay's `<canvas>` element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Bind an engine to the overlay canvas, sizing the element's backing
    /// store to the overlay raster.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, core: EngineCore) -> Self {
        canvas.set_width(core.overlay.width());
        canvas.set_height(core.overlay.height());
        Self { canvas, core }
    }

    /// Copy the overlay raster into the canvas element.
    pub fn render(&self) -> Result<(), JsValue> {
        render::paint_overlay(&self.canvas, &self.core.overlay)
    }

    // --- Delegated input events ---

    pub fn begin_palette_drag(&mut self, template: &str, input: &PointerInput) -> Vec<Action> {
        self.core.begin_palette_drag(template, input)
    }

    pub fn on_pointer_down(&mut self, input: &PointerInput) -> Vec<Action> {
        self.core.on_pointer_down(input)
    }

    pub fn on_pointer_move(&mut self, input: &PointerInput) -> Vec<Action> {
        self.core.on_pointer_move(input)
    }

    pub fn on_pointer_up(&mut self, input: &PointerInput) -> Vec<Action> {
        self.core.on_pointer_up(input)
    }

    pub fn on_pointer_leave(&mut self, input: &PointerInput) -> Vec<Action> {
        self.core.on_pointer_leave(input)
    }

    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        self.core.on_key_down(key)
    }

    pub fn on_blur(&mut self) -> Vec<Action> {
        self.core.on_blur()
    }

    // --- Delegated commands ---

    pub fn set_surface_bounds(&mut self, bounds: Rect) {
        self.core.set_surface_bounds(bounds);
    }

    pub fn set_overlay_display(&mut self, display: Rect) {
        self.core.set_overlay_display(display);
    }

    pub fn set_image(&mut self, image: UploadedImage) -> Vec<Action> {
        self.core.set_image(image)
    }

    pub fn remove_item(&mut self, id: &InstanceId) -> Vec<Action> {
        self.core.remove_item(id)
    }

    pub fn clear_drawing(&mut self) -> Vec<Action> {
        self.core.clear_drawing()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let actions = self.core.teardown();
        if !actions.is_empty() {
            tracing::debug!(?actions, "engine dropped mid-drag");
        }
    }
}
