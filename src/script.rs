//! Gesture scripts: recorded input replayed through a headless engine.
//!
//! A script is a JSON array of steps applied in order. Pointer steps carry a
//! device kind so the same session can be replayed as mouse or touch input.
//!
//! ```json
//! [
//!   {"op": "surface", "x": 0, "y": 0, "width": 800, "height": 600},
//!   {"op": "palette_drag", "template": "1", "x": -20, "y": 40},
//!   {"op": "up", "x": 120, "y": 80},
//!   {"op": "down", "device": "touch", "x": 220, "y": 180},
//!   {"op": "move", "device": "touch", "x": 260, "y": 200},
//!   {"op": "up", "device": "touch"}
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use canvas::engine::{Action, CanvasConfig, EngineCore};
use canvas::geometry::Rect;
use canvas::input::{DeviceCaps, DeviceKind, Key, NoCapture, PointerInput};
use canvas::overlay::OverlayError;
use canvas::registry::{InstanceId, PlacedItem, UploadedImage};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("invalid gesture script: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("step {index}: mouse events need both x and y")]
    MissingPoint { index: usize },
    #[error("engine setup failed: {0}")]
    Engine(#[from] OverlayError),
}

fn mouse() -> DeviceKind {
    DeviceKind::Mouse
}

/// Position and device of one pointer sample. Touch samples without a
/// position stand for a release with no active touches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointerStep {
    #[serde(default = "mouse")]
    pub device: DeviceKind,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl PointerStep {
    fn input(&self, index: usize) -> Result<PointerInput, ScriptError> {
        match (self.device, self.x.zip(self.y)) {
            (DeviceKind::Mouse, Some((x, y))) => Ok(PointerInput::mouse(x, y)),
            (DeviceKind::Mouse, None) => Err(ScriptError::MissingPoint { index }),
            (DeviceKind::Touch, Some((x, y))) => Ok(PointerInput::touch(x, y)),
            (DeviceKind::Touch, None) => Ok(PointerInput::touch_released()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Lay out the drop surface; the overlay is shown over the same area.
    Surface { x: f64, y: f64, width: f64, height: f64 },
    /// Show the overlay somewhere other than the surface bounds.
    Overlay { x: f64, y: f64, width: f64, height: f64 },
    Image { data_uri: String },
    PaletteDrag {
        template: String,
        #[serde(flatten)]
        pointer: PointerStep,
    },
    Down(PointerStep),
    Move(PointerStep),
    Up(PointerStep),
    Leave(PointerStep),
    Key { key: String },
    Blur,
    Remove { id: InstanceId },
    Clear,
}

/// Final state after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub has_image: bool,
    pub drawing: bool,
    pub items: Vec<PlacedItem>,
}

impl Layout {
    #[must_use]
    pub fn of(core: &EngineCore) -> Self {
        Self { has_image: core.image().is_some(), drawing: !core.overlay.is_blank(), items: core.placed().to_vec() }
    }
}

pub fn parse_script(raw: &str) -> Result<Vec<Step>, ScriptError> {
    Ok(serde_json::from_str(raw)?)
}

/// A headless engine. Pointer events all arrive through the script, so no
/// document capture is needed.
pub fn build_engine(config: &CanvasConfig, touch: bool) -> Result<EngineCore, ScriptError> {
    let caps = DeviceCaps { touch_events: touch, max_touch_points: u32::from(touch) };
    Ok(EngineCore::new(config, caps, Box::new(NoCapture))?)
}

/// Apply `steps` in order, returning every action the engine emitted.
pub fn replay(core: &mut EngineCore, steps: &[Step]) -> Result<Vec<Action>, ScriptError> {
    let mut actions = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        tracing::debug!(index, ?step, "replaying step");
        let emitted = match step {
            Step::Surface { x, y, width, height } => {
                let bounds = Rect::new(*x, *y, *width, *height);
                core.set_surface_bounds(bounds);
                core.set_overlay_display(bounds);
                Vec::new()
            }
            Step::Overlay { x, y, width, height } => {
                core.set_overlay_display(Rect::new(*x, *y, *width, *height));
                Vec::new()
            }
            Step::Image { data_uri } => core.set_image(UploadedImage { data_uri: data_uri.clone() }),
            Step::PaletteDrag { template, pointer } => core.begin_palette_drag(template, &pointer.input(index)?),
            Step::Down(p) => core.on_pointer_down(&p.input(index)?),
            Step::Move(p) => core.on_pointer_move(&p.input(index)?),
            Step::Up(p) => core.on_pointer_up(&p.input(index)?),
            Step::Leave(p) => core.on_pointer_leave(&p.input(index)?),
            Step::Key { key } => core.on_key_down(&Key(key.clone())),
            Step::Blur => core.on_blur(),
            Step::Remove { id } => core.remove_item(id),
            Step::Clear => core.clear_drawing(),
        };
        actions.extend(emitted);
    }
    actions.extend(core.teardown());
    Ok(actions)
}

/// MIME type for an image file, from its extension. Unknown extensions are
/// passed through as opaque bytes.
#[must_use]
pub fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
