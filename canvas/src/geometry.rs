//! Pure coordinate math: points, rectangles, client-to-local transforms and
//! the per-edge resize rules.
//!
//! Three coordinate spaces are in play:
//!
//! - **client**: viewport CSS pixels, as reported by pointer events;
//! - **surface**: pixels relative to the drop surface's top-left corner,
//!   where placed items live;
//! - **raster**: pixels of the drawing overlay's backing store, which may be
//!   displayed at a different size than it is allocated.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in client, surface, or raster space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - origin`.
    #[must_use]
    pub fn delta_from(self, origin: Point) -> Point {
        Point { x: self.x - origin.x, y: self.y - origin.y }
    }
}

/// Axis-aligned rectangle described by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `pt` lies inside the rectangle. Edges are inclusive.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.right() && pt.y >= self.y && pt.y <= self.bottom()
    }
}

/// Convert a client-space point into coordinates local to `frame`, whose
/// bounds are themselves given in client space.
#[must_use]
pub fn to_local(client: Point, frame: Rect) -> Point {
    client.delta_from(frame.top_left())
}

/// Convert a client-space point into raster pixels of a backing store of
/// `raster_width` × `raster_height` displayed at `display` bounds.
///
/// A display rectangle with zero extent maps one-to-one.
#[must_use]
pub fn to_raster(client: Point, display: Rect, raster_width: u32, raster_height: u32) -> Point {
    let local = to_local(client, display);
    let sx = if display.width > 0.0 { f64::from(raster_width) / display.width } else { 1.0 };
    let sy = if display.height > 0.0 { f64::from(raster_height) / display.height } else { 1.0 };
    Point::new(local.x * sx, local.y * sy)
}

/// Which vertical edge of a rectangle a resize gesture drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalEdge {
    Left,
    Right,
}

/// Which horizontal edge of a rectangle a resize gesture drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalEdge {
    Top,
    Bottom,
}

/// The pair of independent axes a resize gesture acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeEdges {
    pub horizontal: Option<HorizontalEdge>,
    pub vertical: Option<VerticalEdge>,
}

/// Compute the rectangle produced by dragging `edges` of `initial` by
/// `delta`, never letting either dimension drop below `min_size`.
///
/// Dragging the left (top) edge keeps the right (bottom) edge fixed by
/// shifting the origin by whatever the width (height) lost or gained.
#[must_use]
pub fn resize_rect(initial: Rect, edges: ResizeEdges, delta: Point, min_size: f64) -> Rect {
    let mut next = initial;

    match edges.horizontal {
        Some(HorizontalEdge::Right) => {
            next.width = (initial.width + delta.x).max(min_size);
        }
        Some(HorizontalEdge::Left) => {
            next.width = (initial.width - delta.x).max(min_size);
            next.x = initial.x + (initial.width - next.width);
        }
        None => {}
    }

    match edges.vertical {
        Some(VerticalEdge::Bottom) => {
            next.height = (initial.height + delta.y).max(min_size);
        }
        Some(VerticalEdge::Top) => {
            next.height = (initial.height - delta.y).max(min_size);
            next.y = initial.y + (initial.height - next.height);
        }
        None => {}
    }

    next
}
