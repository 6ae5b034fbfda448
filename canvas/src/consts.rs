//! Shared numeric constants for the canvas crate.

// ── Item geometry ───────────────────────────────────────────────

/// Smallest width or height a placed item may have, in surface pixels.
pub const MIN_ITEM_SIZE: f64 = 50.0;

/// Width and height given to an item freshly dropped from the palette.
pub const DEFAULT_ITEM_SIZE: f64 = 100.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Side length of the square hit zone centred on each resize handle.
pub const HANDLE_SIZE_PX: f64 = 12.0;

/// Side length of the remove button anchored inside the top-right corner.
pub const REMOVE_BUTTON_SIZE_PX: f64 = 20.0;

// ── Drawing overlay ─────────────────────────────────────────────

/// Default overlay raster width in pixels.
pub const OVERLAY_WIDTH: u32 = 800;

/// Default overlay raster height in pixels.
pub const OVERLAY_HEIGHT: u32 = 600;

/// Pen colour as RGBA (opaque red).
pub const STROKE_RGBA: [u8; 4] = [0xff, 0x00, 0x00, 0xff];

/// Pen width in raster pixels.
pub const STROKE_WIDTH_PX: f32 = 2.0;
