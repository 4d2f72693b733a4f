//! Hit-testing against layers and the cutout.
//!
//! Two tests live here. Pointer hits use the exact inverse of a layer's
//! transform, so a rotated or tilted layer is hit only inside its drawn box.
//! Marquee selection uses the untransformed percentage box of each layer,
//! which ignores rotation, tilt and scale.
//!
//! All coordinates are container-relative pixels (origin at the container's
//! top-left corner).

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{CUTOUT_HIT_ALPHA, HIT_MASK_MAX_EDGE};
use crate::doc::{Document, Layer, LayerId};
use crate::geometry::{Point, Rect, Size, layer_box, layer_rect, layer_transform, pct_to_px};

/// What the pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Layer(LayerId),
    Cutout,
}

/// Downsampled alpha grid of the cutout image, used for pointer hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl HitMask {
    /// Build from a raw alpha grid. Returns `None` when the buffer does not match.
    #[must_use]
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(usize::MAX);
        if width == 0 || height == 0 || alpha.len() != expected {
            return None;
        }
        Some(Self { width, height, alpha })
    }

    /// Downsample straight RGBA pixels so the longest edge is at most
    /// [`HIT_MASK_MAX_EDGE`], keeping the alpha channel.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        let src_len = usize::try_from(u64::from(width) * u64::from(height) * 4).unwrap_or(usize::MAX);
        if width == 0 || height == 0 || rgba.len() != src_len {
            return None;
        }
        let step = width.max(height).div_ceil(HIT_MASK_MAX_EDGE).max(1);
        let out_w = width.div_ceil(step);
        let out_h = height.div_ceil(step);
        let mut alpha = Vec::with_capacity((out_w * out_h) as usize);
        for oy in 0..out_h {
            for ox in 0..out_w {
                let sx = (ox * step).min(width - 1);
                let sy = (oy * step).min(height - 1);
                let idx = ((sy * width + sx) * 4 + 3) as usize;
                alpha.push(rgba[idx]);
            }
        }
        Self::new(out_w, out_h, alpha)
    }

    /// Alpha at normalized coordinates in `[0, 1)`. Outside the mask is transparent.
    #[must_use]
    pub fn alpha_at(&self, u: f64, v: f64) -> u8 {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let x = ((u * f64::from(self.width)) as u32).min(self.width - 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let y = ((v * f64::from(self.height)) as u32).min(self.height - 1);
        self.alpha[(y * self.width + x) as usize]
    }
}

/// Untransformed pixel box of a layer inside a container.
#[must_use]
pub fn layer_aabb(layer: &Layer, container: Size) -> Rect {
    layer_rect(layer, container)
}

/// Whether `pt` falls inside the layer's drawn (transformed) box.
#[must_use]
pub fn point_in_layer(layer: &Layer, pt: Point, container: Size) -> bool {
    let Some(inverse) = layer_transform(layer, container, 1.0).invert() else {
        return false;
    };
    let local = inverse.apply(pt);
    let size = layer_box(layer, container);
    local.x.abs() <= size.width / 2.0 && local.y.abs() <= size.height / 2.0
}

/// Whether `pt` lands on an opaque cutout pixel, given the mask offset.
#[must_use]
pub fn point_on_cutout(doc: &Document, mask: &HitMask, pt: Point, container: Size) -> bool {
    if doc.cutout_url.is_none() || !container.is_drawable() {
        return false;
    }
    let ox = pct_to_px(doc.mask_translate_x_pct, container.width);
    let oy = pct_to_px(doc.mask_translate_y_pct, container.height);
    let u = (pt.x - ox) / container.width;
    let v = (pt.y - oy) / container.height;
    mask.alpha_at(u, v) >= CUTOUT_HIT_ALPHA
}

/// Topmost interactive target under `pt`, in reverse paint order:
/// above-mask layers, then the cutout, then below-mask layers.
#[must_use]
pub fn hit_test(doc: &Document, mask: Option<&HitMask>, pt: Point, container: Size) -> Option<HitTarget> {
    let topmost = |above: bool| {
        doc.layers
            .iter()
            .rev()
            .filter(|l| l.above_mask == above && l.is_interactive())
            .find(|l| point_in_layer(l, pt, container))
            .map(|l| HitTarget::Layer(l.id))
    };

    if let Some(hit) = topmost(true) {
        return Some(hit);
    }
    if !doc.mask_locked {
        if let Some(mask) = mask {
            if point_on_cutout(doc, mask, pt, container) {
                return Some(HitTarget::Cutout);
            }
        }
    }
    topmost(false)
}

/// Ids of interactive layers whose untransformed box intersects `selection`.
#[must_use]
pub fn marquee_hits(doc: &Document, selection: &Rect, container: Size) -> Vec<LayerId> {
    doc.layers
        .iter()
        .filter(|l| l.is_interactive())
        .filter(|l| layer_aabb(l, container).intersects(selection))
        .map(|l| l.id)
        .collect()
}
