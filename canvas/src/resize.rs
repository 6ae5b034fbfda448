//! Handle-driven resizing of placed items.
//!
//! A gesture snapshots the item's geometry and the pointer position when a
//! handle is pressed. Every later move recomputes the full geometry from that
//! snapshot and the total pointer delta, so intermediate states never depend
//! on how many move events arrived. Each result is committed immediately;
//! there is no separate confirm step.

#[cfg(test)]
#[path = "resize_test.rs"]
mod resize_test;

use crate::consts::MIN_ITEM_SIZE;
use crate::geometry::{Point, Rect, resize_rect};
use crate::hit::ResizeAnchor;
use crate::registry::{InstanceId, ItemRegistry, PlacedItem};

/// Snapshot taken when a handle is pressed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeGesture {
    pub id: InstanceId,
    pub anchor: ResizeAnchor,
    /// Client-space pointer position at press.
    pub start_pointer: Point,
    /// Item geometry at press.
    pub initial: Rect,
}

impl ResizeGesture {
    /// Geometry for the pointer now at `pointer`.
    #[must_use]
    pub fn bounds_at(&self, pointer: Point, min_size: f64) -> Rect {
        let delta = pointer.delta_from(self.start_pointer);
        resize_rect(self.initial, self.anchor.edges(), delta, min_size)
    }
}

/// Owns at most one live resize gesture.
#[derive(Debug, Clone)]
pub struct ResizeController {
    active: Option<ResizeGesture>,
    min_size: f64,
}

impl Default for ResizeController {
    fn default() -> Self {
        Self::new(MIN_ITEM_SIZE)
    }
}

impl ResizeController {
    /// A controller whose size floor is `min_size`, never lower than
    /// [`MIN_ITEM_SIZE`].
    #[must_use]
    pub fn new(min_size: f64) -> Self {
        Self { active: None, min_size: min_size.max(MIN_ITEM_SIZE) }
    }

    #[must_use]
    pub fn active(&self) -> Option<&ResizeGesture> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start resizing `item` from `anchor`.
    pub fn begin(&mut self, item: &PlacedItem, anchor: ResizeAnchor, pointer: Point) {
        tracing::debug!(id = %item.id, ?anchor, "resize started");
        self.active = Some(ResizeGesture {
            id: item.id.clone(),
            anchor,
            start_pointer: pointer,
            initial: item.bounds(),
        });
    }

    /// Apply the pointer at `pointer` to the registry.
    ///
    /// Returns the committed item, or `None` when no gesture is live or the
    /// item has since been removed.
    pub fn update(&mut self, pointer: Point, registry: &mut ItemRegistry) -> Option<PlacedItem> {
        let gesture = self.active.as_ref()?;
        let bounds = gesture.bounds_at(pointer, self.min_size);
        let committed = registry.commit_bounds(&gesture.id, bounds);
        if committed.is_none() {
            tracing::debug!(id = %gesture.id, "resized item no longer exists; gesture abandoned");
            self.active = None;
        }
        committed
    }

    /// End the gesture, returning the id that was being resized.
    pub fn end(&mut self) -> Option<InstanceId> {
        self.active.take().map(|g| g.id)
    }
}
