//! Drag-and-drop between the palette, placed items, and drop surfaces.
//!
//! Each gesture runs `idle → dragging → (dropped | cancelled)`. While
//! dragging, the surface under the pointer is recomputed on every move and
//! exposed as the transient `is_over` flag. A drop over a surface converts the
//! pointer position to surface-local coordinates and hands the drag payload to
//! [`ItemRegistry::place`]; anything else ends the gesture with the registry
//! untouched.

#[cfg(test)]
#[path = "dnd_test.rs"]
mod dnd_test;

use crate::geometry::{Point, Rect, to_local};
use crate::input::{DeviceKind, PointerBackend, PointerInput};
use crate::registry::{InstanceId, ItemRef, ItemRegistry, Placement};

/// Identifier of a registered drop surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// A region that accepts drops. `bounds` are in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropSurface {
    pub id: SurfaceId,
    pub bounds: Rect,
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    /// A palette entry; carries only the template identity.
    Palette { template: String },
    /// An already placed item, with its geometry at drag start.
    Placed { id: InstanceId, bounds: Rect },
}

impl DragSource {
    /// The registry reference this payload resolves to on drop.
    #[must_use]
    pub fn item_ref(&self) -> ItemRef {
        match self {
            Self::Palette { template } => ItemRef::Template(template.clone()),
            Self::Placed { id, .. } => ItemRef::Instance(id.clone()),
        }
    }
}

/// Why a drag ended without a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Released over no registered surface.
    OutsideTarget,
    /// Escape key pressed.
    Escape,
    /// Window lost focus.
    Blur,
    /// The engine was torn down mid-drag.
    Teardown,
}

/// Gesture phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        source: DragSource,
        /// Last client-space pointer position.
        pointer: Point,
        /// Surface currently under the pointer.
        over: Option<SurfaceId>,
    },
}

/// How a drag ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Dropped {
        source: DragSource,
        surface: SurfaceId,
        /// Drop point relative to the surface's top-left corner.
        local: Point,
        /// What the registry did; `None` if the payload no longer resolves.
        placement: Option<Placement>,
    },
    Cancelled {
        source: DragSource,
        reason: CancelReason,
    },
}

/// Mediates drags between sources and registered drop surfaces.
#[derive(Debug)]
pub struct DragDropEngine {
    backend: Box<dyn PointerBackend>,
    surfaces: Vec<DropSurface>,
    phase: DragPhase,
}

impl DragDropEngine {
    /// Build an engine bound to one backend for its whole lifetime.
    #[must_use]
    pub fn new(backend: Box<dyn PointerBackend>) -> Self {
        Self { backend, surfaces: Vec::new(), phase: DragPhase::Idle }
    }

    #[must_use]
    pub fn backend_kind(&self) -> DeviceKind {
        self.backend.kind()
    }

    /// Whether the backend lets a press described by `input` start a drag.
    #[must_use]
    pub fn accepts(&self, input: &PointerInput) -> bool {
        self.backend.accepts(input)
    }

    // --- Surfaces ---

    /// Register a surface, or update its bounds if already registered.
    pub fn register_surface(&mut self, surface: DropSurface) {
        if let Some(existing) = self.surfaces.iter_mut().find(|s| s.id == surface.id) {
            existing.bounds = surface.bounds;
        } else {
            self.surfaces.push(surface);
        }
    }

    pub fn unregister_surface(&mut self, id: SurfaceId) {
        self.surfaces.retain(|s| s.id != id);
        if let DragPhase::Dragging { over, .. } = &mut self.phase {
            if *over == Some(id) {
                *over = None;
            }
        }
    }

    #[must_use]
    pub fn surface(&self, id: SurfaceId) -> Option<&DropSurface> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    /// Topmost (last registered) surface containing `pointer`.
    fn surface_at(&self, pointer: Point) -> Option<&DropSurface> {
        self.surfaces.iter().rev().find(|s| s.bounds.contains(pointer))
    }

    // --- Queries ---

    #[must_use]
    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// The surface under the pointer during a drag.
    #[must_use]
    pub fn over(&self) -> Option<SurfaceId> {
        match &self.phase {
            DragPhase::Dragging { over, .. } => *over,
            DragPhase::Idle => None,
        }
    }

    /// Whether `id` should show its drop affordance.
    #[must_use]
    pub fn is_over(&self, id: SurfaceId) -> bool {
        self.over() == Some(id)
    }

    // --- Gesture ---

    /// Enter `dragging`. Refused while another drag is live or when the
    /// backend does not accept this kind of press.
    pub fn begin(&mut self, source: DragSource, input: &PointerInput, pointer: Point) -> bool {
        if self.is_dragging() {
            return false;
        }
        if !self.accepts(input) {
            tracing::debug!(device = ?input.device(), backend = ?self.backend.kind(), "press ignored by drag backend");
            return false;
        }
        let over = self.surface_at(pointer).map(|s| s.id);
        tracing::debug!(?source, "drag started");
        self.phase = DragPhase::Dragging { source, pointer, over };
        true
    }

    /// Track the pointer. Returns `true` when the hovered surface changed.
    pub fn hover(&mut self, pointer: Point) -> bool {
        let next = self.surface_at(pointer).map(|s| s.id);
        let DragPhase::Dragging { pointer: last, over, .. } = &mut self.phase else {
            return false;
        };
        *last = pointer;
        let changed = *over != next;
        *over = next;
        changed
    }

    /// Release at `pointer`. A drop over a surface is delegated to the
    /// registry; a release elsewhere cancels. Returns `None` if idle.
    pub fn drop_at(&mut self, pointer: Point, registry: &mut ItemRegistry) -> Option<DragOutcome> {
        let DragPhase::Dragging { source, .. } = std::mem::take(&mut self.phase) else {
            return None;
        };
        let Some(surface) = self.surface_at(pointer).copied() else {
            tracing::debug!(?pointer, "drop outside any surface; cancelled");
            return Some(DragOutcome::Cancelled { source, reason: CancelReason::OutsideTarget });
        };
        let local = to_local(pointer, surface.bounds);
        let placement = registry.place(&source.item_ref(), local.x, local.y);
        Some(DragOutcome::Dropped { source, surface: surface.id, local, placement })
    }

    /// Abandon the current drag. Returns `None` if idle.
    pub fn cancel(&mut self, reason: CancelReason) -> Option<DragOutcome> {
        let DragPhase::Dragging { source, .. } = std::mem::take(&mut self.phase) else {
            return None;
        };
        tracing::debug!(?reason, "drag cancelled");
        Some(DragOutcome::Cancelled { source, reason })
    }
}
