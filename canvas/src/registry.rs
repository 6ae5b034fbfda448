//! Item model: palette templates, placed instances, the uploaded background,
//! and the registry that owns them.
//!
//! The registry is the single owner of placed-item geometry. Gesture
//! controllers hold only an [`InstanceId`] and a copied [`Rect`] snapshot;
//! every change comes back here as one whole-geometry commit addressed by
//! identity, never by position in the list.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ITEM_SIZE, MIN_ITEM_SIZE};
use crate::geometry::Rect;

/// A draggable palette entry. Defined at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTemplate {
    /// Palette identity (e.g. `"1"`).
    pub id: String,
    /// Human-readable name, used as image alt text.
    pub label: String,
    /// Icon image reference.
    pub icon_url: String,
}

impl ItemTemplate {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, icon_url: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into(), icon_url: icon_url.into() }
    }
}

/// The built-in palette: an inverter and a battery.
#[must_use]
pub fn default_palette() -> Vec<ItemTemplate> {
    vec![
        ItemTemplate::new(
            "1",
            "Inverter",
            "https://powerwalker.com/wp-content/uploads/2022/05/10120224_thumbnail.jpg",
        ),
        ItemTemplate::new("2", "Battery", "https://via.placeholder.com/50x50?text=Battery"),
    ]
}

/// Identity of a placed instance: the template it came from plus a serial
/// drawn from the registry's monotonic counter.
///
/// Renders as `"<template>-<serial>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceId {
    template: String,
    serial: u64,
}

impl InstanceId {
    #[must_use]
    pub fn new(template: impl Into<String>, serial: u64) -> Self {
        Self { template: template.into(), serial }
    }

    /// Id of the palette template this instance was created from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.template, self.serial)
    }
}

/// Failure to parse an [`InstanceId`] from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid instance id `{0}`: expected `<template>-<serial>`")]
pub struct ParseInstanceIdError(pub String);

impl FromStr for InstanceId {
    type Err = ParseInstanceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((template, serial)) = s.rsplit_once('-') else {
            return Err(ParseInstanceIdError(s.to_string()));
        };
        if template.is_empty() {
            return Err(ParseInstanceIdError(s.to_string()));
        }
        let serial = serial
            .parse::<u64>()
            .map_err(|_| ParseInstanceIdError(s.to_string()))?;
        Ok(Self::new(template, serial))
    }
}

impl TryFrom<String> for InstanceId {
    type Error = ParseInstanceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstanceId> for String {
    fn from(id: InstanceId) -> Self {
        id.to_string()
    }
}

/// A template instance positioned on the drop surface.
///
/// `x`/`y` are the top-left corner in surface-local pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: InstanceId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlacedItem {
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// What a drag carries into the registry: a palette template or an existing
/// instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRef {
    Template(String),
    Instance(InstanceId),
}

/// Outcome of [`ItemRegistry::place`].
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// A new instance was appended.
    Added(PlacedItem),
    /// An existing instance was repositioned.
    Moved(PlacedItem),
}

impl Placement {
    #[must_use]
    pub fn item(&self) -> &PlacedItem {
        match self {
            Self::Added(item) | Self::Moved(item) => item,
        }
    }
}

/// The background image the user uploaded, as an embeddable data URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub data_uri: String,
}

impl UploadedImage {
    /// Encode raw file bytes as a base64 `data:` URI. The content is not
    /// validated.
    #[must_use]
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self { data_uri: format!("data:{mime};base64,{}", STANDARD.encode(bytes)) }
    }
}

/// Owner of the palette and of every placed instance.
///
/// `placed` is kept in insertion order, which is also draw order: the last
/// entry is topmost.
#[derive(Debug, Clone)]
pub struct ItemRegistry {
    templates: Vec<ItemTemplate>,
    placed: Vec<PlacedItem>,
    next_serial: u64,
    min_size: f64,
    default_size: f64,
}

impl ItemRegistry {
    /// Create a registry over a fixed palette.
    #[must_use]
    pub fn new(templates: Vec<ItemTemplate>) -> Self {
        Self {
            templates,
            placed: Vec::new(),
            next_serial: 0,
            min_size: MIN_ITEM_SIZE,
            default_size: DEFAULT_ITEM_SIZE,
        }
    }

    /// Override the size floor and the size of freshly placed items. The
    /// floor can be raised above [`MIN_ITEM_SIZE`] but never lowered.
    #[must_use]
    pub fn with_sizes(mut self, min_size: f64, default_size: f64) -> Self {
        self.min_size = min_size.max(MIN_ITEM_SIZE);
        self.default_size = default_size.max(self.min_size);
        self
    }

    #[must_use]
    pub fn list_templates(&self) -> &[ItemTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn template(&self, id: &str) -> Option<&ItemTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Placed items in draw order (last is topmost).
    #[must_use]
    pub fn list_placed(&self) -> &[PlacedItem] {
        &self.placed
    }

    #[must_use]
    pub fn get(&self, id: &InstanceId) -> Option<&PlacedItem> {
        self.placed.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.placed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Drop `item` at surface-local `(x, y)`.
    ///
    /// A template always yields a new instance at the default size; an
    /// existing instance only has its position updated. Returns `None` for an
    /// unknown template or an instance that no longer exists.
    pub fn place(&mut self, item: &ItemRef, x: f64, y: f64) -> Option<Placement> {
        match item {
            ItemRef::Template(template_id) => {
                if self.template(template_id).is_none() {
                    tracing::warn!(%template_id, "drop of unknown template ignored");
                    return None;
                }
                let id = InstanceId::new(template_id.clone(), self.next_serial);
                self.next_serial += 1;
                let placed = PlacedItem { id, x, y, width: self.default_size, height: self.default_size };
                tracing::info!(id = %placed.id, x, y, "item placed");
                self.placed.push(placed.clone());
                Some(Placement::Added(placed))
            }
            ItemRef::Instance(id) => {
                let Some(existing) = self.find_mut(id) else {
                    tracing::warn!(%id, "move of missing item ignored");
                    return None;
                };
                existing.x = x;
                existing.y = y;
                Some(Placement::Moved(existing.clone()))
            }
        }
    }

    /// Delete an item. Absent ids are a no-op.
    pub fn remove(&mut self, id: &InstanceId) -> Option<PlacedItem> {
        let index = self.placed.iter().position(|item| &item.id == id)?;
        let removed = self.placed.remove(index);
        tracing::info!(%id, "item removed");
        Some(removed)
    }

    /// Set an item's size, and optionally its origin, in one step.
    ///
    /// Dimensions below the size floor are clamped. Absent ids are a no-op.
    pub fn resize(
        &mut self,
        id: &InstanceId,
        width: f64,
        height: f64,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Option<PlacedItem> {
        let min = self.min_size;
        let item = self.find_mut(id)?;
        if width < min || height < min {
            tracing::debug!(%id, width, height, min, "resize clamped to size floor");
        }
        item.width = width.max(min);
        item.height = height.max(min);
        if let Some(x) = x {
            item.x = x;
        }
        if let Some(y) = y {
            item.y = y;
        }
        Some(item.clone())
    }

    /// Replace an item's whole geometry with `bounds`.
    pub fn commit_bounds(&mut self, id: &InstanceId, bounds: Rect) -> Option<PlacedItem> {
        self.resize(id, bounds.width, bounds.height, Some(bounds.x), Some(bounds.y))
    }

    fn find_mut(&mut self, id: &InstanceId) -> Option<&mut PlacedItem> {
        self.placed.iter_mut().find(|item| &item.id == id)
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new(default_palette())
    }
}
