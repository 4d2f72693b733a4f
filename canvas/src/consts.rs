//! Shared numeric constants for the canvas crate.

// ── Document ────────────────────────────────────────────────────

/// Project document format version written on save.
pub const DOCUMENT_VERSION: u32 = 1;

// ── Text ────────────────────────────────────────────────────────

/// Base font size in CSS pixels that `fontSizeEm` is relative to.
pub const BASE_FONT_PX: f64 = 16.0;

/// Default line height multiplier for new text layers.
pub const DEFAULT_LINE_HEIGHT_EM: f64 = 1.2;

// ── Tilt ────────────────────────────────────────────────────────

/// Perspective distance in reference-viewport pixels for the tilt shear.
pub const PERSPECTIVE_PX: f64 = 1000.0;

/// Depth of the tilted plane. Always zero, which makes the perspective scale 1.
pub const TILT_DEPTH_PX: f64 = 0.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Minimum cutout alpha (0–255) that counts as a pointer hit.
pub const CUTOUT_HIT_ALPHA: u8 = 16;

/// Marquee rectangles smaller than this (screen px, both axes) are treated as clicks.
pub const MARQUEE_CLICK_SLOP_PX: f64 = 3.0;

/// Longest edge of the downsampled cutout hit mask.
pub const HIT_MASK_MAX_EDGE: u32 = 256;

// ── Layers ──────────────────────────────────────────────────────

/// Default size of a newly added layer, as a percentage of the canvas.
pub const DEFAULT_LAYER_SIZE_PCT: f64 = 30.0;

/// Default fill color for new shape layers.
pub const DEFAULT_FILL: &str = "#D94B4B";

/// Default stroke color for new shape layers.
pub const DEFAULT_STROKE: &str = "#1F1A17";

/// Default text color for new text layers.
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";
