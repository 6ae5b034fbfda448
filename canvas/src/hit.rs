#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{HANDLE_SIZE_PX, REMOVE_BUTTON_SIZE_PX};
use crate::geometry::{HorizontalEdge, Point, Rect, ResizeEdges, VerticalEdge};
use crate::registry::{InstanceId, PlacedItem};

/// Which part of a placed item was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeAnchor),
    RemoveButton,
}

/// Anchor position for resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeAnchor {
    /// Every handle, in the order they are tested (corners before sides).
    pub const ALL: [ResizeAnchor; 8] = [
        ResizeAnchor::Nw,
        ResizeAnchor::Ne,
        ResizeAnchor::Se,
        ResizeAnchor::Sw,
        ResizeAnchor::N,
        ResizeAnchor::E,
        ResizeAnchor::S,
        ResizeAnchor::W,
    ];

    /// The edges this handle drags.
    #[must_use]
    pub fn edges(self) -> ResizeEdges {
        let horizontal = match self {
            Self::Ne | Self::E | Self::Se => Some(HorizontalEdge::Right),
            Self::Nw | Self::W | Self::Sw => Some(HorizontalEdge::Left),
            Self::N | Self::S => None,
        };
        let vertical = match self {
            Self::Nw | Self::N | Self::Ne => Some(VerticalEdge::Top),
            Self::Sw | Self::S | Self::Se => Some(VerticalEdge::Bottom),
            Self::E | Self::W => None,
        };
        ResizeEdges { horizontal, vertical }
    }

    /// Centre of this handle on `bounds`.
    #[must_use]
    pub fn position(self, bounds: Rect) -> Point {
        let cx = bounds.x + bounds.width / 2.0;
        let cy = bounds.y + bounds.height / 2.0;
        match self {
            Self::N => Point::new(cx, bounds.y),
            Self::Ne => Point::new(bounds.right(), bounds.y),
            Self::E => Point::new(bounds.right(), cy),
            Self::Se => Point::new(bounds.right(), bounds.bottom()),
            Self::S => Point::new(cx, bounds.bottom()),
            Self::Sw => Point::new(bounds.x, bounds.bottom()),
            Self::W => Point::new(bounds.x, cy),
            Self::Nw => Point::new(bounds.x, bounds.y),
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: InstanceId,
    pub part: HitPart,
}

/// Square hit zone for a handle centred on its anchor point.
#[must_use]
pub fn handle_rect(anchor: ResizeAnchor, bounds: Rect) -> Rect {
    let c = anchor.position(bounds);
    let half = HANDLE_SIZE_PX / 2.0;
    Rect::new(c.x - half, c.y - half, HANDLE_SIZE_PX, HANDLE_SIZE_PX)
}

/// Hit zone of the remove button, inside the item's top-right corner.
#[must_use]
pub fn remove_button_rect(bounds: Rect) -> Rect {
    Rect::new(bounds.right() - REMOVE_BUTTON_SIZE_PX, bounds.y, REMOVE_BUTTON_SIZE_PX, REMOVE_BUTTON_SIZE_PX)
}

fn hit_item(pt: Point, item: &PlacedItem) -> Option<HitPart> {
    let bounds = item.bounds();
    if let Some(anchor) = ResizeAnchor::ALL
        .into_iter()
        .find(|a| handle_rect(*a, bounds).contains(pt))
    {
        return Some(HitPart::ResizeHandle(anchor));
    }
    if remove_button_rect(bounds).contains(pt) {
        return Some(HitPart::RemoveButton);
    }
    bounds.contains(pt).then_some(HitPart::Body)
}

/// Find the topmost placed item under the surface-local point `pt`.
///
/// Items are tested from the top of the draw order down; within an item,
/// handles win over the remove button, which wins over the body.
#[must_use]
pub fn hit_test(pt: Point, items: &[PlacedItem]) -> Option<Hit> {
    items
        .iter()
        .rev()
        .find_map(|item| hit_item(pt, item).map(|part| Hit { id: item.id.clone(), part }))
}
