//! Geometry: percentage poses to pixel-space transforms.
//!
//! Layers store their pose as percentages of the canvas so they survive any
//! change of output resolution. This module turns that pose into a concrete
//! [`Affine`] for rasterization (translate, tilt shear, rotate, scale, in that
//! fixed order) and into an untransformed [`Rect`] for marquee hit-testing.
//!
//! Everything here is pure and infallible. [`validate_geometry`] is the one
//! check callers use to skip layers whose numbers cannot be drawn.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::consts::{PERSPECTIVE_PX, TILT_DEPTH_PX};
use crate::doc::Layer;

/// A point in screen, container or surface space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of a surface or container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and positive.
    #[must_use]
    pub fn is_drawable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized rectangle spanning two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Edge-inclusive overlap test. Touching edges count as intersecting.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.x || self.bottom() < other.y || self.x > other.right() || self.y > other.bottom())
    }

    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.right() && pt.y >= self.y && pt.y <= self.bottom()
    }
}

/// 2D affine transform in canvas `setTransform(a, b, c, d, e, f)` order:
/// `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self { e: tx, f: ty, ..Self::IDENTITY }
    }

    #[must_use]
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Clockwise rotation (y axis points down) by `deg` degrees.
    #[must_use]
    pub fn rotate_deg(deg: f64) -> Self {
        let (sin, cos) = deg.to_radians().sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    /// Pseudo-3D tilt as a 2D shear. `perspective` scales the x column.
    #[must_use]
    pub fn tilt(tilt_x_deg: f64, tilt_y_deg: f64, perspective: f64) -> Self {
        let (sin_x, cos_x) = tilt_x_deg.to_radians().sin_cos();
        let (sin_y, cos_y) = tilt_y_deg.to_radians().sin_cos();
        Self {
            a: cos_y * perspective,
            b: sin_x * sin_y * perspective,
            c: -sin_y,
            d: cos_x,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self · inner`: `inner` is applied to points first.
    #[must_use]
    pub fn then(&self, inner: &Affine) -> Self {
        Self {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    #[must_use]
    pub fn apply(&self, pt: Point) -> Point {
        Point {
            x: self.a * pt.x + self.c * pt.y + self.e,
            y: self.b * pt.x + self.d * pt.y + self.f,
        }
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform, or `None` when the matrix is singular (e.g. a 90° tilt or zero scale).
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Convert to a `tiny_skia` transform (single precision).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.a as f32,
            self.b as f32,
            self.c as f32,
            self.d as f32,
            self.e as f32,
            self.f as f32,
        )
    }
}

/// Why a layer cannot be drawn.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("layer field `{0}` is not finite")]
    NonFiniteField(&'static str),
    #[error("layer size must be positive (width {width}%, height {height}%)")]
    NonPositiveSize { width: f64, height: f64 },
}

/// Check that every pose field of a layer is drawable.
///
/// # Errors
///
/// Returns [`GeometryError::NonFiniteField`] for NaN/infinite fields and
/// [`GeometryError::NonPositiveSize`] for zero or negative boxes.
pub fn validate_geometry(layer: &Layer) -> Result<(), GeometryError> {
    let fields = [
        ("xPct", layer.x_pct),
        ("yPct", layer.y_pct),
        ("widthPct", layer.width_pct),
        ("heightPct", layer.height_pct),
        ("rotationDeg", layer.rotation_deg),
        ("scaleX", layer.scale_x),
        ("scaleY", layer.scale_y),
        ("tiltXDeg", layer.tilt_x_deg),
        ("tiltYDeg", layer.tilt_y_deg),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(GeometryError::NonFiniteField(name));
        }
    }
    if layer.width_pct <= 0.0 || layer.height_pct <= 0.0 {
        return Err(GeometryError::NonPositiveSize { width: layer.width_pct, height: layer.height_pct });
    }
    Ok(())
}

/// Ratio between the output surface height and the on-screen editing height.
///
/// Fonts, strokes, effect magnitudes and the tilt perspective are multiplied
/// by this factor. Falls back to `1.0` for a non-finite or non-positive reference.
#[must_use]
pub fn render_scale(target_height: f64, reference_viewport_height: f64) -> f64 {
    if !reference_viewport_height.is_finite() || reference_viewport_height <= 0.0 || !target_height.is_finite() {
        return 1.0;
    }
    target_height / reference_viewport_height
}

/// Perspective scale for the tilt shear: `p / (p − z)` with the fixed depth `z`.
#[must_use]
pub fn perspective_scale(scale: f64) -> f64 {
    let distance = PERSPECTIVE_PX * scale;
    let denom = distance - TILT_DEPTH_PX;
    if denom.abs() < f64::EPSILON || !denom.is_finite() {
        return 1.0;
    }
    distance / denom
}

/// Convert a percentage of `extent` to pixels.
#[must_use]
pub fn pct_to_px(pct: f64, extent: f64) -> f64 {
    pct / 100.0 * extent
}

/// Convert a pixel distance within `extent` to a percentage. Zero extent yields zero.
#[must_use]
pub fn px_to_pct(px: f64, extent: f64) -> f64 {
    if extent <= 0.0 || !extent.is_finite() {
        return 0.0;
    }
    px / extent * 100.0
}

/// Layer box size in pixels (before rotation, tilt and scale).
#[must_use]
pub fn layer_box(layer: &Layer, surface: Size) -> Size {
    Size::new(pct_to_px(layer.width_pct, surface.width), pct_to_px(layer.height_pct, surface.height))
}

/// Layer center in pixels.
#[must_use]
pub fn layer_center(layer: &Layer, surface: Size) -> Point {
    Point::new(pct_to_px(layer.x_pct, surface.width), pct_to_px(layer.y_pct, surface.height))
}

/// Untransformed pixel bounding box. Ignores rotation, tilt and scale.
#[must_use]
pub fn layer_rect(layer: &Layer, surface: Size) -> Rect {
    let center = layer_center(layer, surface);
    let size = layer_box(layer, surface);
    Rect::new(center.x - size.width / 2.0, center.y - size.height / 2.0, size.width, size.height)
}

/// Full layer-local to surface transform: translate → tilt → rotate → scale.
///
/// `scale` is the [`render_scale`] of the target surface; it only affects the
/// tilt perspective term.
#[must_use]
pub fn layer_transform(layer: &Layer, surface: Size, scale: f64) -> Affine {
    let center = layer_center(layer, surface);
    let mut m = Affine::translate(center.x, center.y);
    if layer.tilt_x_deg != 0.0 || layer.tilt_y_deg != 0.0 {
        m = m.then(&Affine::tilt(layer.tilt_x_deg, layer.tilt_y_deg, perspective_scale(scale)));
    }
    m.then(&Affine::rotate_deg(layer.rotation_deg))
        .then(&Affine::scale(layer.scale_x, layer.scale_y))
}
