//! Layout editor engine: drag items onto an uploaded image, resize them, and
//! sketch over the image.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! interaction lifecycle: normalizing mouse and touch input, mediating drags
//! from the palette onto the drop surface, resizing placed items from their
//! handles, and painting freehand strokes into an overlay raster. The host
//! page only lays out elements for the [`engine::Action`]s it receives.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`registry`] | Item templates, placed items, and the uploaded image |
//! | [`dnd`] | Drag-and-drop between the palette and drop surfaces |
//! | [`resize`] | Handle-driven resize gestures |
//! | [`overlay`] | Freehand drawing raster |
//! | [`input`] | Pointer normalization, device backends, gesture state |
//! | [`hit`] | Hit-testing against placed items and their handles |
//! | [`geometry`] | Points, rectangles, and coordinate conversions |
//! | [`render`] | Copies the overlay raster to its canvas element |
//! | [`dom`] | Browser event wiring and device probing |
//! | [`consts`] | Shared numeric constants (sizes, pen style) |

pub mod consts;
pub mod dnd;
pub mod dom;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod overlay;
pub mod registry;
pub mod render;
pub mod resize;
