//! Freehand drawing overlay.
//!
//! A fixed-size raster laid over the uploaded image. Pointer positions arrive
//! in client coordinates and are mapped through the overlay's displayed
//! bounds, so the raster can be shown at a different size than it is
//! allocated. A stroke runs `idle → active → idle`; every move while active
//! paints one segment from the previous point in the fixed pen style.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::consts::{OVERLAY_HEIGHT, OVERLAY_WIDTH, STROKE_RGBA, STROKE_WIDTH_PX};
use crate::geometry::{Point, Rect, to_raster};

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("cannot allocate a {width}x{height} overlay raster")]
    Allocation { width: u32, height: u32 },
}

/// Pen colour and width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub rgba: [u8; 4],
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { rgba: STROKE_RGBA, width: STROKE_WIDTH_PX }
    }
}

/// Whether a stroke is in progress, and where it last reached (raster space).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum StrokeState {
    #[default]
    Idle,
    Active { last: Point },
}

pub struct DrawingOverlay {
    pixmap: Pixmap,
    style: StrokeStyle,
    state: StrokeState,
    display: Rect,
}

impl std::fmt::Debug for DrawingOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingOverlay")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("style", &self.style)
            .field("state", &self.state)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

impl DrawingOverlay {
    /// Allocate a blank raster. Until [`Self::set_display`] is called the
    /// raster is assumed to be shown at its own size at the client origin.
    pub fn new(width: u32, height: u32, style: StrokeStyle) -> Result<Self, OverlayError> {
        let pixmap = Pixmap::new(width, height).ok_or(OverlayError::Allocation { width, height })?;
        Ok(Self {
            pixmap,
            style,
            state: StrokeState::Idle,
            display: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
        })
    }

    /// An 800×600 overlay with the default red pen.
    pub fn with_defaults() -> Result<Self, OverlayError> {
        Self::new(OVERLAY_WIDTH, OVERLAY_HEIGHT, StrokeStyle::default())
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    #[must_use]
    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    #[must_use]
    pub fn state(&self) -> StrokeState {
        self.state
    }

    #[must_use]
    pub fn is_stroking(&self) -> bool {
        matches!(self.state, StrokeState::Active { .. })
    }

    /// Client-space bounds the raster is displayed at.
    #[must_use]
    pub fn display(&self) -> Rect {
        self.display
    }

    pub fn set_display(&mut self, display: Rect) {
        self.display = display;
    }

    /// Whether the client point falls on the displayed overlay.
    #[must_use]
    pub fn covers(&self, client: Point) -> bool {
        self.display.contains(client)
    }

    fn to_raster(&self, client: Point) -> Point {
        to_raster(client, self.display, self.pixmap.width(), self.pixmap.height())
    }

    /// Start a stroke at `client`.
    pub fn begin(&mut self, client: Point) {
        let last = self.to_raster(client);
        self.state = StrokeState::Active { last };
    }

    /// Continue the stroke to `client`. Returns `true` if a segment was painted.
    pub fn extend(&mut self, client: Point) -> bool {
        let StrokeState::Active { last } = self.state else {
            return false;
        };
        let next = self.to_raster(client);
        self.state = StrokeState::Active { last: next };
        if next == last {
            return false;
        }
        self.paint_segment(last, next)
    }

    /// End the stroke (pointer released or left the overlay).
    pub fn end(&mut self) {
        self.state = StrokeState::Idle;
    }

    /// Wipe every pixel back to transparent. Does not touch stroke state.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn paint_segment(&mut self, from: Point, to: Point) -> bool {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return false;
        };

        let [r, g, b, a] = self.style.rgba;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: self.style.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        self.pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        true
    }

    // --- Raster access ---

    /// Whether every pixel is fully transparent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixmap.data().iter().all(|b| *b == 0)
    }

    /// Straight (non-premultiplied) RGBA of one pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Premultiplied RGBA bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Straight RGBA bytes, row-major, as expected by `ImageData`.
    #[must_use]
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }
}
