//! Input model: normalized pointer events, device backends, gesture-scoped
//! input capture, and the gesture state machine.
//!
//! Platform events arrive as [`PointerInput`], either a mouse sample or the
//! list of currently active touch points. [`PointerTracker`] reduces both to a
//! single client-space [`Point`] and remembers the last good position so a
//! touch event with no active touches (as on `touchend`) never leaves a
//! gesture without coordinates.
//!
//! While a gesture is live the tracker holds a [`CaptureGuard`] obtained from
//! a [`CaptureTarget`]. Dropping the guard releases the document-level
//! listeners, so ending a gesture, starting a new one, or tearing down the
//! engine all release capture without explicit bookkeeping.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::registry::InstanceId;

/// Which kind of device produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Mouse,
    Touch,
}

/// A raw pointer event in client (viewport) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    /// Mouse press, move, or release at `client`.
    Mouse { client: Point },
    /// Touch event carrying the currently active touch points, primary first.
    Touch { touches: Vec<Point> },
}

impl PointerInput {
    #[must_use]
    pub fn mouse(x: f64, y: f64) -> Self {
        Self::Mouse { client: Point::new(x, y) }
    }

    /// A touch event with a single active touch point.
    #[must_use]
    pub fn touch(x: f64, y: f64) -> Self {
        Self::Touch { touches: vec![Point::new(x, y)] }
    }

    /// A touch event with no active touch points (e.g. `touchend`).
    #[must_use]
    pub fn touch_released() -> Self {
        Self::Touch { touches: Vec::new() }
    }

    #[must_use]
    pub fn device(&self) -> DeviceKind {
        match self {
            Self::Mouse { .. } => DeviceKind::Mouse,
            Self::Touch { .. } => DeviceKind::Touch,
        }
    }

    /// The event's own position: the mouse location or the first active touch.
    #[must_use]
    pub fn client_point(&self) -> Option<Point> {
        match self {
            Self::Mouse { client } => Some(*client),
            Self::Touch { touches } => touches.first().copied(),
        }
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

// =============================================================
// Device backends
// =============================================================

/// Result of probing the platform for touch support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCaps {
    /// The window exposes `ontouchstart`.
    pub touch_events: bool,
    /// `navigator.maxTouchPoints`.
    pub max_touch_points: u32,
}

impl DeviceCaps {
    #[must_use]
    pub fn supports_touch(&self) -> bool {
        self.touch_events || self.max_touch_points > 0
    }
}

/// A drag backend decides which raw event streams may start a drag.
///
/// Exactly one backend is chosen when the engine is built and it is never
/// swapped afterwards.
pub trait PointerBackend: fmt::Debug {
    fn kind(&self) -> DeviceKind;

    /// Whether a press described by `input` may begin a drag.
    fn accepts(&self, input: &PointerInput) -> bool;
}

/// Desktop backend: drags start from mouse presses only.
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseBackend;

impl PointerBackend for MouseBackend {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Mouse
    }

    fn accepts(&self, input: &PointerInput) -> bool {
        input.device() == DeviceKind::Mouse
    }
}

/// Touch backend: drags start from touches, and optionally from the mouse
/// on hybrid devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchBackend {
    pub enable_mouse_events: bool,
}

impl PointerBackend for TouchBackend {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Touch
    }

    fn accepts(&self, input: &PointerInput) -> bool {
        match input.device() {
            DeviceKind::Touch => true,
            DeviceKind::Mouse => self.enable_mouse_events,
        }
    }
}

/// Pick the drag backend for a device once, from its probed capabilities.
#[must_use]
pub fn select_backend(caps: DeviceCaps, touch_accepts_mouse: bool) -> Box<dyn PointerBackend> {
    if caps.supports_touch() {
        tracing::debug!(?caps, "touch backend selected");
        Box::new(TouchBackend { enable_mouse_events: touch_accepts_mouse })
    } else {
        tracing::debug!(?caps, "mouse backend selected");
        Box::new(MouseBackend)
    }
}

// =============================================================
// Gesture-scoped capture
// =============================================================

/// Something that can route document-wide move and release events to the
/// engine for the duration of one gesture.
pub trait CaptureTarget {
    /// Start capturing. Capture lasts until the returned guard is dropped.
    fn capture(&self) -> CaptureGuard;
}

/// Live input capture. Dropping it runs the release hook exactly once.
pub struct CaptureGuard {
    release: Option<Box<dyn FnOnce()>>,
}

impl CaptureGuard {
    #[must_use]
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    /// A guard with nothing to release.
    #[must_use]
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Capture target for hosts that already deliver every pointer event to the
/// engine (tests, script replay).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl CaptureTarget for NoCapture {
    fn capture(&self) -> CaptureGuard {
        CaptureGuard::detached()
    }
}

// =============================================================
// Pointer tracker
// =============================================================

/// Normalizes pointer events for one gesture at a time.
#[derive(Debug, Default)]
pub struct PointerTracker {
    last: Option<Point>,
    guard: Option<CaptureGuard>,
}

impl PointerTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture: resolve the press position and acquire capture.
    ///
    /// Capture left over from an unfinished gesture is released first.
    pub fn begin(&mut self, input: &PointerInput, target: &dyn CaptureTarget) -> Point {
        self.guard = None;
        let pt = self.resolve(input);
        self.guard = Some(target.capture());
        pt
    }

    /// Resolve the position of a move event.
    pub fn track(&mut self, input: &PointerInput) -> Point {
        self.resolve(input)
    }

    /// Finish the gesture: resolve the release position and release capture.
    pub fn end(&mut self, input: &PointerInput) -> Point {
        let pt = self.resolve(input);
        self.guard = None;
        pt
    }

    /// Release capture without a final event (teardown).
    pub fn release(&mut self) {
        self.guard = None;
    }

    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.guard.is_some()
    }

    /// The last position successfully read from an event.
    #[must_use]
    pub fn last(&self) -> Option<Point> {
        self.last
    }

    fn resolve(&mut self, input: &PointerInput) -> Point {
        if let Some(pt) = input.client_point() {
            self.last = Some(pt);
            return pt;
        }
        let fallback = self.last.unwrap_or_default();
        tracing::debug!(?fallback, "touch event without active touches; using last known position");
        fallback
    }
}

// =============================================================
// Gesture state
// =============================================================

/// The gesture currently owning the pointer.
///
/// Only one gesture is live at a time; presses that arrive while a gesture is
/// active are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// Waiting for the next press.
    #[default]
    Idle,
    /// A placed item's body is held down. It turns into a drag on the first
    /// move away from `origin`; a release before that is a plain click.
    Pressing {
        id: InstanceId,
        origin: Point,
    },
    /// A palette template or placed item is being dragged.
    Dragging,
    /// A placed item is being resized from one of its handles.
    Resizing {
        /// Item being resized.
        id: InstanceId,
    },
    /// A pen stroke is being drawn on the overlay.
    Drawing,
    /// An item's remove button is held down; the item goes on release over
    /// the same button.
    Removing {
        id: InstanceId,
    },
}
