//! Browser glue: device probing, DOM event conversion, and listener wiring.
//!
//! Nothing here holds layout state. Every DOM event is converted to a
//! [`PointerInput`] or [`Key`] and handed to the shared [`Engine`]; the
//! resulting actions go to the host's sink after the overlay is repainted.
//!
//! Move and release events are only observed at document level while a
//! gesture holds a [`CaptureGuard`] from [`DocumentCapture`], so drags and
//! strokes keep tracking when the pointer leaves the element they started on.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{
    AddEventListenerOptions, Element, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent,
    Window,
};

use crate::engine::{Action, CanvasConfig, Engine, EngineCore};
use crate::geometry::{Point, Rect};
use crate::input::{CaptureGuard, CaptureTarget, DeviceCaps, InputState, Key, PointerInput};

pub type SharedEngine = Rc<RefCell<Option<Engine>>>;

/// Host callback receiving every non-empty batch of engine actions.
pub type ActionSink = Rc<dyn Fn(&[Action])>;

// =============================================================
// Probing and conversion
// =============================================================

/// Detect touch support once, at startup.
#[must_use]
pub fn probe_capabilities(window: &Window) -> DeviceCaps {
    let touch_events = js_sys::Reflect::has(window, &JsValue::from_str("ontouchstart")).unwrap_or(false);
    let max_touch_points = u32::try_from(window.navigator().max_touch_points()).unwrap_or(0);
    DeviceCaps { touch_events, max_touch_points }
}

/// Convert a DOM mouse or touch event. Other event types yield `None`.
#[must_use]
pub fn pointer_input(event: &Event) -> Option<PointerInput> {
    if let Some(touch) = event.dyn_ref::<TouchEvent>() {
        let list = touch.touches();
        let touches = (0..list.length())
            .filter_map(|i| list.get(i))
            .map(|t| Point::new(f64::from(t.client_x()), f64::from(t.client_y())))
            .collect();
        return Some(PointerInput::Touch { touches });
    }
    event
        .dyn_ref::<MouseEvent>()
        .map(|m| PointerInput::mouse(f64::from(m.client_x()), f64::from(m.client_y())))
}

/// Client-space bounds of an element.
#[must_use]
pub fn client_bounds(element: &Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.width(), r.height())
}

// =============================================================
// Listeners
// =============================================================

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(target: &EventTarget, kind: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self { target: target.clone(), kind, closure })
    }

    fn detach(&self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
        {
            tracing::warn!(kind = self.kind, ?err, "failed to remove listener");
        }
    }
}

/// Which engine entry point a captured event feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Move,
    Release,
}

const CAPTURED_EVENTS: [(&str, CapturePhase); 5] = [
    ("mousemove", CapturePhase::Move),
    ("mouseup", CapturePhase::Release),
    ("touchmove", CapturePhase::Move),
    ("touchend", CapturePhase::Release),
    ("touchcancel", CapturePhase::Release),
];

/// Gesture-scoped document listeners.
///
/// A release is usually triggered from inside one of the captured closures,
/// so detached closures are parked in `retired` and only freed when the next
/// capture starts.
pub struct DocumentCapture {
    document: EventTarget,
    handler: Rc<dyn Fn(CapturePhase, PointerInput)>,
    retired: Rc<RefCell<Vec<Listener>>>,
}

impl DocumentCapture {
    #[must_use]
    pub fn new(document: EventTarget, handler: Rc<dyn Fn(CapturePhase, PointerInput)>) -> Self {
        Self { document, handler, retired: Rc::new(RefCell::new(Vec::new())) }
    }
}

impl CaptureTarget for DocumentCapture {
    fn capture(&self) -> CaptureGuard {
        self.retired.borrow_mut().clear();

        let mut live = Vec::with_capacity(CAPTURED_EVENTS.len());
        for (kind, phase) in CAPTURED_EVENTS {
            let handler = Rc::clone(&self.handler);
            let listener = Listener::attach(&self.document, kind, move |event: Event| {
                let Some(input) = pointer_input(&event) else {
                    return;
                };
                if matches!(input, PointerInput::Touch { .. }) {
                    event.prevent_default();
                }
                handler(phase, input);
            });
            match listener {
                Ok(listener) => live.push(listener),
                Err(err) => tracing::warn!(kind, ?err, "failed to capture document events"),
            }
        }

        let retired = Rc::clone(&self.retired);
        CaptureGuard::new(move || {
            for listener in &live {
                listener.detach();
            }
            retired.borrow_mut().extend(live);
        })
    }
}

// =============================================================
// Mounting
// =============================================================

/// Run one engine entry point, repaint if asked, and forward the actions.
///
/// Returns whether a gesture is live afterwards. Events arriving while the
/// engine is already borrowed (re-entrant dispatch) are dropped.
fn dispatch(engine: &SharedEngine, sink: &ActionSink, f: impl FnOnce(&mut Engine) -> Vec<Action>) -> bool {
    let (actions, live) = {
        let Ok(mut slot) = engine.try_borrow_mut() else {
            tracing::debug!("engine busy; event dropped");
            return false;
        };
        let Some(engine) = slot.as_mut() else {
            return false;
        };
        let actions = f(engine);
        if actions.contains(&Action::RenderNeeded) {
            if let Err(err) = engine.render() {
                tracing::warn!(?err, "overlay render failed");
            }
        }
        (actions, engine.core.input != InputState::Idle)
    };
    if !actions.is_empty() {
        sink(&actions);
    }
    live
}

/// An engine bound to live DOM elements. Dropping it detaches every listener
/// and tears the engine down.
pub struct CanvasMount {
    engine: SharedEngine,
    sink: ActionSink,
    surface: Element,
    canvas: HtmlCanvasElement,
    listeners: Vec<Listener>,
}

impl CanvasMount {
    /// Build an engine over `surface` (the drop target containing the image,
    /// the overlay `canvas` and the placed items) and wire its listeners.
    pub fn attach(
        surface: Element,
        canvas: HtmlCanvasElement,
        config: &CanvasConfig,
        sink: ActionSink,
    ) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let caps = probe_capabilities(&window);
        tracing::info!(?caps, "mounting canvas engine");

        let engine: SharedEngine = Rc::new(RefCell::new(None));
        let weak = Rc::downgrade(&engine);
        let capture_sink = Rc::clone(&sink);
        let handler: Rc<dyn Fn(CapturePhase, PointerInput)> = Rc::new(move |phase, input| {
            let Some(engine) = weak.upgrade() else {
                return;
            };
            dispatch(&engine, &capture_sink, |e| match phase {
                CapturePhase::Move => e.on_pointer_move(&input),
                CapturePhase::Release => e.on_pointer_up(&input),
            });
        });
        let capture = DocumentCapture::new(document.clone().into(), handler);
        let core = EngineCore::new(config, caps, Box::new(capture)).map_err(|err| JsValue::from_str(&err.to_string()))?;
        *engine.borrow_mut() = Some(Engine::new(canvas.clone(), core));

        let mut mount = Self { engine, sink, surface, canvas, listeners: Vec::new() };
        mount.relayout();
        mount.wire(&window, &document)?;
        Ok(mount)
    }

    fn wire(&mut self, window: &Window, document: &web_sys::Document) -> Result<(), JsValue> {
        for kind in ["mousedown", "touchstart"] {
            let (engine, sink) = (Rc::clone(&self.engine), Rc::clone(&self.sink));
            self.listeners.push(Listener::attach(&self.surface, kind, move |event: Event| {
                let Some(input) = pointer_input(&event) else {
                    return;
                };
                if dispatch(&engine, &sink, |e| e.on_pointer_down(&input)) {
                    event.prevent_default();
                }
            })?);
        }

        let (engine, sink) = (Rc::clone(&self.engine), Rc::clone(&self.sink));
        self.listeners.push(Listener::attach(&self.canvas, "mouseleave", move |event: Event| {
            if let Some(input) = pointer_input(&event) {
                dispatch(&engine, &sink, |e| e.on_pointer_leave(&input));
            }
        })?);

        let (engine, sink) = (Rc::clone(&self.engine), Rc::clone(&self.sink));
        self.listeners.push(Listener::attach(document, "keydown", move |event: Event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>().map(|k| Key(k.key())) {
                dispatch(&engine, &sink, |e| e.on_key_down(&key));
            }
        })?);

        let (engine, sink) = (Rc::clone(&self.engine), Rc::clone(&self.sink));
        self.listeners.push(Listener::attach(window, "blur", move |_event: Event| {
            dispatch(&engine, &sink, Engine::on_blur);
        })?);
        Ok(())
    }

    #[must_use]
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Re-read the surface and overlay positions. Call after layout, resize
    /// or scroll.
    pub fn relayout(&self) {
        let surface = client_bounds(&self.surface);
        let overlay = client_bounds(&self.canvas);
        let Ok(mut slot) = self.engine.try_borrow_mut() else {
            return;
        };
        if let Some(engine) = slot.as_mut() {
            engine.set_surface_bounds(surface);
            engine.set_overlay_display(overlay);
        }
    }

    /// Forward a press on a palette entry.
    pub fn palette_press(&self, template: &str, event: &Event) {
        if let Some(input) = pointer_input(event) {
            if dispatch(&self.engine, &self.sink, |e| e.begin_palette_drag(template, &input)) {
                event.prevent_default();
            }
        }
    }

    /// Apply a host command (image upload, clear, remove) through the same
    /// repaint and sink path as input events.
    pub fn command(&self, f: impl FnOnce(&mut Engine) -> Vec<Action>) {
        dispatch(&self.engine, &self.sink, f);
    }
}

impl Drop for CanvasMount {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.detach();
        }
        if let Ok(mut slot) = self.engine.try_borrow_mut() {
            slot.take();
        }
    }
}
