//! Document model: layers, their content variants, and the project document.
//!
//! This module defines the serializable data that describes a composition
//! (`Document`, `Layer`, `LayerContent`), the effect sub-objects every layer
//! carries (`Effects`, `Effect`), and a sparse-update type for incremental
//! edits (`LayerPatch`).
//!
//! All geometry is stored as percentages of the canvas so a document stays
//! valid when the background is replaced by a higher-resolution version.
//! The wire format is camelCase JSON and must round-trip losslessly.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{
    DEFAULT_FILL, DEFAULT_LAYER_SIZE_PCT, DEFAULT_LINE_HEIGHT_EM, DEFAULT_STROKE, DEFAULT_TEXT_COLOR,
    DOCUMENT_VERSION,
};

/// Unique identifier for a layer.
pub type LayerId = Uuid;

fn one() -> f64 {
    1.0
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

// =============================================================
// Effects
// =============================================================

/// One soft effect (glow or drop shadow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub enabled: bool,
    /// CSS color; alpha is honored.
    pub color: String,
    /// Blur radius in reference-viewport pixels.
    pub blur: f64,
    /// Extra spread in reference-viewport pixels (glow only).
    pub size: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Effect {
    /// Default glow: disabled white halo.
    #[must_use]
    pub fn glow() -> Self {
        Self { enabled: false, color: "#FFFFFF".into(), blur: 10.0, size: 0.0, offset_x: 0.0, offset_y: 0.0 }
    }

    /// Default drop shadow: disabled, soft, down-right.
    #[must_use]
    pub fn shadow() -> Self {
        Self {
            enabled: false,
            color: "rgba(0, 0, 0, 0.5)".into(),
            blur: 8.0,
            size: 0.0,
            offset_x: 4.0,
            offset_y: 4.0,
        }
    }
}

/// Effects attached to a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub glow: Effect,
    pub shadow: Effect,
}

impl Default for Effects {
    fn default() -> Self {
        Self { glow: Effect::glow(), shadow: Effect::shadow() }
    }
}

// =============================================================
// Content variants
// =============================================================

/// Horizontal text alignment within the layer box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
    Justify,
}

/// One styled run of rich text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichSpan {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Minimal rich text. Export draws only its plain-text projection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichText {
    pub spans: Vec<RichSpan>,
}

impl RichText {
    /// Concatenation of every span's text.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<RichText>,
    pub color: String,
    pub font_family: String,
    pub font_weight: u16,
    /// Font size relative to a 16-unit base.
    pub font_size_em: f64,
    pub letter_spacing_em: f64,
    pub line_height_em: f64,
    pub text_align: TextAlign,
}

impl TextProps {
    /// The text export draws: the rich-text projection when present, else `text`.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.rich_text {
            Some(rich) => rich.plain_text(),
            None => self.text.clone(),
        }
    }
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            rich_text: None,
            color: DEFAULT_TEXT_COLOR.into(),
            font_family: "sans-serif".into(),
            font_weight: 400,
            font_size_em: 2.0,
            letter_spacing_em: 0.0,
            line_height_em: DEFAULT_LINE_HEIGHT_EM,
            text_align: TextAlign::Center,
        }
    }
}

/// Geometric primitive drawn by a shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Rectangle with optional rounded corners.
    Rectangle,
    /// Ellipse inscribed within the box.
    Ellipse,
    /// Isosceles triangle: apex at top-center, base along the bottom edge.
    Triangle,
    /// Horizontal line through the box center, stroke only.
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    pub shape: ShapeKind,
    pub fill: String,
    pub stroke: String,
    /// Stroke width in reference-viewport pixels.
    pub stroke_width: f64,
    /// Corner radius as a percentage of `min(width, height)`.
    pub radius_pct: f64,
}

impl ShapeProps {
    #[must_use]
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            fill: DEFAULT_FILL.into(),
            stroke: DEFAULT_STROKE.into(),
            stroke_width: if shape == ShapeKind::Line { 4.0 } else { 0.0 },
            radius_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<u32>,
}

/// Kind-specific layer content, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayerContent {
    Text(TextProps),
    Shape(ShapeProps),
    Image(ImageProps),
}

// =============================================================
// Layer
// =============================================================

/// One addressable visual element with its own pose and effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    /// Center x as a percentage of canvas width.
    pub x_pct: f64,
    /// Center y as a percentage of canvas height.
    pub y_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
    /// In-plane rotation in degrees, applied after tilt.
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub tilt_x_deg: f64,
    #[serde(default)]
    pub tilt_y_deg: f64,
    /// Excluded from pointer interaction, still rendered.
    #[serde(default)]
    pub locked: bool,
    /// Excluded from interaction and rendering.
    #[serde(default)]
    pub hidden: bool,
    /// Paints after the cutout when true.
    #[serde(default)]
    pub above_mask: bool,
    #[serde(default)]
    pub effects: Effects,
    #[serde(flatten)]
    pub content: LayerContent,
}

impl Layer {
    /// A centered layer with default pose around `content`.
    #[must_use]
    pub fn new(content: LayerContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            x_pct: 50.0,
            y_pct: 50.0,
            width_pct: DEFAULT_LAYER_SIZE_PCT,
            height_pct: DEFAULT_LAYER_SIZE_PCT,
            rotation_deg: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            tilt_x_deg: 0.0,
            tilt_y_deg: 0.0,
            locked: false,
            hidden: false,
            above_mask: false,
            effects: Effects::default(),
            content,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(LayerContent::Text(TextProps { text: text.into(), ..TextProps::default() }))
    }

    #[must_use]
    pub fn shape(shape: ShapeKind) -> Self {
        Self::new(LayerContent::Shape(ShapeProps::new(shape)))
    }

    #[must_use]
    pub fn image(src: impl Into<String>) -> Self {
        Self::new(LayerContent::Image(ImageProps { src: src.into(), natural_width: None, natural_height: None }))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.content {
            LayerContent::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Whether the layer takes part in pointer interaction.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        !self.locked && !self.hidden
    }
}

// =============================================================
// Patch
// =============================================================

/// Sparse update for a layer. Only present fields are applied; fields that
/// belong to a different content kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt_x_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt_y_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub above_mask: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow: Option<Effect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Effect>,

    // Text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// `Some(None)` (JSON `null`) clears the rich text.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_or_null")]
    pub rich_text: Option<Option<RichText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_em: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing_em: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height_em: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,

    // Shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_pct: Option<f64>,

    // Image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<u32>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<RichText>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<RichText>::deserialize(deserializer).map(Some)
}

fn set<T: Clone>(slot: &mut T, value: Option<&T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

fn is_valid_extent(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

impl LayerPatch {
    /// Move-only patch.
    #[must_use]
    pub fn position(x_pct: f64, y_pct: f64) -> Self {
        Self { x_pct: Some(x_pct), y_pct: Some(y_pct), ..Self::default() }
    }

    /// Apply to `layer`. Sizes that are not finite and positive are ignored.
    pub fn apply_to(&self, layer: &mut Layer) {
        set(&mut layer.x_pct, self.x_pct.as_ref());
        set(&mut layer.y_pct, self.y_pct.as_ref());
        if let Some(w) = self.width_pct.filter(|w| is_valid_extent(*w)) {
            layer.width_pct = w;
        }
        if let Some(h) = self.height_pct.filter(|h| is_valid_extent(*h)) {
            layer.height_pct = h;
        }
        set(&mut layer.rotation_deg, self.rotation_deg.as_ref());
        set(&mut layer.scale_x, self.scale_x.as_ref());
        set(&mut layer.scale_y, self.scale_y.as_ref());
        set(&mut layer.tilt_x_deg, self.tilt_x_deg.as_ref());
        set(&mut layer.tilt_y_deg, self.tilt_y_deg.as_ref());
        set(&mut layer.locked, self.locked.as_ref());
        set(&mut layer.hidden, self.hidden.as_ref());
        set(&mut layer.above_mask, self.above_mask.as_ref());
        set(&mut layer.effects.glow, self.glow.as_ref());
        set(&mut layer.effects.shadow, self.shadow.as_ref());

        match &mut layer.content {
            LayerContent::Text(t) => {
                set(&mut t.text, self.text.as_ref());
                set(&mut t.rich_text, self.rich_text.as_ref());
                set(&mut t.color, self.color.as_ref());
                set(&mut t.font_family, self.font_family.as_ref());
                set(&mut t.font_weight, self.font_weight.as_ref());
                set(&mut t.font_size_em, self.font_size_em.as_ref());
                set(&mut t.letter_spacing_em, self.letter_spacing_em.as_ref());
                set(&mut t.line_height_em, self.line_height_em.as_ref());
                set(&mut t.text_align, self.text_align.as_ref());
            }
            LayerContent::Shape(s) => {
                set(&mut s.shape, self.shape.as_ref());
                set(&mut s.fill, self.fill.as_ref());
                set(&mut s.stroke, self.stroke.as_ref());
                set(&mut s.stroke_width, self.stroke_width.as_ref());
                set(&mut s.radius_pct, self.radius_pct.as_ref());
            }
            LayerContent::Image(i) => {
                set(&mut i.src, self.src.as_ref());
                if self.natural_width.is_some() {
                    i.natural_width = self.natural_width;
                }
                if self.natural_height.is_some() {
                    i.natural_height = self.natural_height;
                }
            }
        }
    }
}

// =============================================================
// Document
// =============================================================

/// The project document: background, optional cutout, and the layer stack.
///
/// Layer order is paint order within each `aboveMask` bucket (earlier = further back).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: u32,
    pub background_url: String,
    /// Storage key of the background, when the host tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_key: Option<String>,
    /// Full-canvas extracted-foreground image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutout_url: Option<String>,
    #[serde(default)]
    pub mask_translate_x_pct: f64,
    #[serde(default)]
    pub mask_translate_y_pct: f64,
    /// Excludes the cutout from pointer interaction.
    #[serde(default)]
    pub mask_locked: bool,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Document {
    #[must_use]
    pub fn new(background_url: impl Into<String>) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            background_url: background_url.into(),
            background_key: None,
            cutout_url: None,
            mask_translate_x_pct: 0.0,
            mask_translate_y_pct: 0.0,
            mask_locked: false,
            layers: Vec::new(),
        }
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == *id)
    }

    pub fn layer_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == *id)
    }

    #[must_use]
    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == *id)
    }

    /// Visible layers of one bucket, in paint order.
    pub fn visible_bucket(&self, above_mask: bool) -> impl Iterator<Item = &Layer> {
        self.layers
            .iter()
            .filter(move |l| l.above_mask == above_mask && !l.hidden)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error (only possible for non-finite floats).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a project document.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error for malformed JSON or missing fields.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
