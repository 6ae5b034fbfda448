//! Rendering: copies the drawing overlay onto its `<canvas>` element.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the overlay raster and produces pixels; it does not mutate any
//! application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::overlay::DrawingOverlay;

/// Replace the canvas contents with the overlay raster.
pub fn paint_overlay(canvas: &HtmlCanvasElement, overlay: &DrawingOverlay) -> Result<(), JsValue> {
    let ctx = context_2d(canvas)?;
    let rgba = overlay.to_rgba();
    let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(rgba.as_slice()), overlay.width(), overlay.height())?;
    ctx.put_image_data(&image, 0.0, 0.0)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}
