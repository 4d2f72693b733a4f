#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::Effects;

fn enabled(mut effects: Effects, glow: bool, shadow: bool) -> Effects {
    effects.glow.enabled = glow;
    effects.shadow.enabled = shadow;
    effects
}

#[test]
fn no_effects_is_one_crisp_pass() {
    let passes = plan_passes(&Effects::default(), 1.0);
    assert_eq!(passes, vec![EffectPass { kind: PassKind::Crisp, shadow: None }]);
}

#[test]
fn both_effects_paint_shadow_then_glow_then_crisp() {
    let passes = plan_passes(&enabled(Effects::default(), true, true), 1.0);
    let kinds: Vec<PassKind> = passes.iter().map(|p| p.kind).collect();
    assert_eq!(kinds, vec![PassKind::Shadow, PassKind::Glow, PassKind::Crisp]);
    assert!(passes[2].shadow.is_none());
}

#[test]
fn shadow_magnitudes_scale() {
    let mut effects = enabled(Effects::default(), false, true);
    effects.shadow.blur = 8.0;
    effects.shadow.offset_x = 4.0;
    effects.shadow.offset_y = -2.0;
    let pass = plan_passes(&effects, 2.5)[0];
    let style = pass.shadow.unwrap();
    assert_eq!(style.blur, 20.0);
    assert_eq!(style.offset_x, 10.0);
    assert_eq!(style.offset_y, -5.0);
}

#[test]
fn glow_blur_includes_size() {
    let mut effects = enabled(Effects::default(), true, false);
    effects.glow.blur = 10.0;
    effects.glow.size = 6.0;
    let style = plan_passes(&effects, 2.0)[0].shadow.unwrap();
    assert_eq!(style.blur, 32.0);
    assert_eq!((style.offset_x, style.offset_y), (0.0, 0.0));
}

#[test]
fn unparseable_color_drops_the_pass() {
    let mut effects = enabled(Effects::default(), false, true);
    effects.shadow.color = "not a color".into();
    let passes = plan_passes(&effects, 1.0);
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].kind, PassKind::Crisp);
}

#[test]
fn visibility_needs_alpha_and_extent() {
    let base = ShadowStyle { color: Rgba::BLACK, blur: 0.0, offset_x: 0.0, offset_y: 0.0 };
    assert!(!base.is_visible());
    assert!(ShadowStyle { blur: 2.0, ..base }.is_visible());
    assert!(ShadowStyle { offset_y: 1.0, ..base }.is_visible());
    assert!(!ShadowStyle { color: Rgba::TRANSPARENT, blur: 5.0, ..base }.is_visible());
}

fn dot(size: u32) -> GrayImage {
    let mut plane = GrayImage::new(size, size);
    plane.put_pixel(size / 2, size / 2, image::Luma([255]));
    plane
}

#[test]
fn blur_spreads_a_dot_symmetrically() {
    let blurred = blur_alpha(dot(21), 2.0);
    let at = |x, y| blurred.get_pixel(x, y).0[0];
    assert!(at(10, 10) < 255);
    assert!(at(12, 10) > 0);
    assert_eq!(at(8, 10), at(12, 10));
    assert_eq!(at(10, 8), at(10, 12));
    assert_eq!(at(0, 0), 0);
}

#[test]
fn wider_sigma_spreads_further() {
    let narrow = blur_alpha(dot(41), 1.0);
    let wide = blur_alpha(dot(41), 5.0);
    assert!(wide.get_pixel(28, 20).0[0] > narrow.get_pixel(28, 20).0[0]);
}

#[test]
fn blur_with_zero_or_invalid_sigma_is_noop() {
    assert_eq!(blur_alpha(dot(5), 0.0), dot(5));
    assert_eq!(blur_alpha(dot(5), -1.0), dot(5));
    assert_eq!(blur_alpha(dot(5), f64::NAN), dot(5));
}
