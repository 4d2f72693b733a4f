//! Glow and drop-shadow as ordered draw passes.
//!
//! A raster draw carries at most one shadow configuration, so a layer with
//! both effects is painted several times: shadow pass, glow pass, then a
//! final pass with no shadow so the foreground stays crisp on top. Passes are
//! cumulative. Magnitudes are stored in reference-viewport pixels and scaled
//! by the same factor as fonts.
//!
//! Blurred passes spread the content's alpha coverage with a gaussian of
//! σ = blur / 2.

#[cfg(test)]
#[path = "effects_test.rs"]
mod effects_test;

use image::{GrayImage, imageops};

use crate::color::{Rgba, parse_color};
use crate::doc::{Effect, Effects};

/// Shadow state for one pass, in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    pub color: Rgba,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ShadowStyle {
    /// A shadow paints only with a visible color and some blur or offset.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.color.is_transparent() && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

/// Which effect produced a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Shadow,
    Glow,
    Crisp,
}

/// One draw of the layer content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectPass {
    pub kind: PassKind,
    /// `None` means the content is drawn with shadow state cleared.
    pub shadow: Option<ShadowStyle>,
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn shadow_style(effect: &Effect, blur: f64, scale: f64) -> Option<ShadowStyle> {
    let color = parse_color(&effect.color)?;
    Some(ShadowStyle {
        color,
        blur: finite_or_zero(blur * scale).max(0.0),
        offset_x: finite_or_zero(effect.offset_x * scale),
        offset_y: finite_or_zero(effect.offset_y * scale),
    })
}

/// Ordered passes for a layer: shadow (if enabled), glow (if enabled), crisp.
///
/// Glow blur is `blur + size`; an unparseable effect color drops that pass.
#[must_use]
pub fn plan_passes(effects: &Effects, scale: f64) -> Vec<EffectPass> {
    let mut passes = Vec::with_capacity(3);
    if effects.shadow.enabled {
        if let Some(style) = shadow_style(&effects.shadow, effects.shadow.blur, scale) {
            passes.push(EffectPass { kind: PassKind::Shadow, shadow: Some(style) });
        }
    }
    if effects.glow.enabled {
        let blur = effects.glow.blur + effects.glow.size.max(0.0);
        if let Some(style) = shadow_style(&effects.glow, blur, scale) {
            passes.push(EffectPass { kind: PassKind::Glow, shadow: Some(style) });
        }
    }
    passes.push(EffectPass { kind: PassKind::Crisp, shadow: None });
    passes
}

/// Gaussian-blur an alpha coverage plane with standard deviation `sigma`.
/// A non-positive or non-finite `sigma` leaves the plane untouched.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn blur_alpha(coverage: GrayImage, sigma: f64) -> GrayImage {
    if !(sigma.is_finite() && sigma > 0.0) {
        return coverage;
    }
    imageops::blur(&coverage, sigma as f32)
}
