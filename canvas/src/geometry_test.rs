#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{Layer, ShapeKind};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn approx_pt(p: Point, x: f64, y: f64) -> bool {
    approx(p.x, x) && approx(p.y, y)
}

fn layer_at(x_pct: f64, y_pct: f64, w_pct: f64, h_pct: f64) -> Layer {
    let mut layer = Layer::shape(ShapeKind::Rectangle);
    layer.x_pct = x_pct;
    layer.y_pct = y_pct;
    layer.width_pct = w_pct;
    layer.height_pct = h_pct;
    layer
}

// =============================================================
// Rect
// =============================================================

#[test]
fn rect_from_corners_normalizes() {
    let r = Rect::from_corners(Point::new(30.0, 40.0), Point::new(10.0, 5.0));
    assert_eq!(r, Rect::new(10.0, 5.0, 20.0, 35.0));
}

#[test]
fn rect_intersects_overlap_and_disjoint() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
    assert!(!a.intersects(&Rect::new(11.0, 0.0, 5.0, 5.0)));
    assert!(!a.intersects(&Rect::new(0.0, 20.0, 5.0, 5.0)));
}

#[test]
fn rect_touching_edges_intersect() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
}

#[test]
fn rect_contains_is_inclusive() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(!r.contains(Point::new(10.1, 5.0)));
}

// =============================================================
// Affine
// =============================================================

#[test]
fn affine_then_applies_inner_first() {
    let m = Affine::translate(10.0, 0.0).then(&Affine::scale(2.0, 2.0));
    assert!(approx_pt(m.apply(Point::new(1.0, 1.0)), 12.0, 2.0));
}

#[test]
fn affine_rotate_quarter_turn_is_clockwise_on_screen() {
    let m = Affine::rotate_deg(90.0);
    assert!(approx_pt(m.apply(Point::new(1.0, 0.0)), 0.0, 1.0));
}

#[test]
fn affine_invert_round_trips() {
    let m = Affine::translate(40.0, -7.0)
        .then(&Affine::tilt(20.0, 35.0, 1.0))
        .then(&Affine::rotate_deg(33.0))
        .then(&Affine::scale(1.5, 0.5));
    let inv = m.invert().unwrap();
    let p = Point::new(12.5, -3.25);
    let back = inv.apply(m.apply(p));
    assert!(approx_pt(back, p.x, p.y));
}

#[test]
fn affine_invert_singular_is_none() {
    assert!(Affine::scale(0.0, 1.0).invert().is_none());
    assert!(Affine::tilt(90.0, 0.0, 1.0).invert().is_none());
}

#[test]
fn tilt_matches_shear_formula() {
    let m = Affine::tilt(30.0, 60.0, 1.0);
    let (sx, cx) = 30_f64.to_radians().sin_cos();
    let (sy, cy) = 60_f64.to_radians().sin_cos();
    assert!(approx(m.a, cy));
    assert!(approx(m.b, sx * sy));
    assert!(approx(m.c, -sy));
    assert!(approx(m.d, cx));
    assert_eq!((m.e, m.f), (0.0, 0.0));
}

// =============================================================
// Scale helpers
// =============================================================

#[test]
fn render_scale_ratio() {
    assert!(approx(render_scale(2000.0, 800.0), 2.5));
}

#[test]
fn render_scale_falls_back_to_one() {
    assert_eq!(render_scale(2000.0, 0.0), 1.0);
    assert_eq!(render_scale(2000.0, -5.0), 1.0);
    assert_eq!(render_scale(2000.0, f64::NAN), 1.0);
}

#[test]
fn perspective_scale_is_one_at_zero_depth() {
    assert!(approx(perspective_scale(1.0), 1.0));
    assert!(approx(perspective_scale(3.7), 1.0));
}

#[test]
fn pct_px_conversions() {
    assert!(approx(pct_to_px(25.0, 800.0), 200.0));
    assert!(approx(px_to_pct(200.0, 800.0), 25.0));
    assert_eq!(px_to_pct(10.0, 0.0), 0.0);
}

// =============================================================
// Layer geometry
// =============================================================

#[test]
fn layer_rect_is_untransformed_box() {
    let mut layer = layer_at(50.0, 50.0, 20.0, 10.0);
    layer.rotation_deg = 45.0;
    layer.scale_x = 3.0;
    let r = layer_rect(&layer, Size::new(1000.0, 500.0));
    assert_eq!(r, Rect::new(400.0, 225.0, 200.0, 50.0));
}

#[test]
fn zero_tilt_transform_is_translate_rotate_scale() {
    let mut layer = layer_at(50.0, 50.0, 20.0, 20.0);
    layer.rotation_deg = 30.0;
    layer.scale_x = 2.0;
    layer.scale_y = 0.5;
    let size = Size::new(400.0, 200.0);
    let expected = Affine::translate(200.0, 100.0)
        .then(&Affine::rotate_deg(30.0))
        .then(&Affine::scale(2.0, 0.5));
    let got = layer_transform(&layer, size, 4.0);
    for (a, b) in [
        (got.a, expected.a),
        (got.b, expected.b),
        (got.c, expected.c),
        (got.d, expected.d),
        (got.e, expected.e),
        (got.f, expected.f),
    ] {
        assert!(approx(a, b));
    }
}

#[test]
fn transform_maps_origin_to_center() {
    let mut layer = layer_at(25.0, 75.0, 10.0, 10.0);
    layer.tilt_x_deg = 15.0;
    layer.tilt_y_deg = -20.0;
    layer.rotation_deg = 10.0;
    let m = layer_transform(&layer, Size::new(800.0, 600.0), 1.0);
    assert!(approx_pt(m.apply(Point::new(0.0, 0.0)), 200.0, 450.0));
}

#[test]
fn tilt_applies_before_rotation() {
    let mut layer = layer_at(0.0, 0.0, 10.0, 10.0);
    layer.tilt_y_deg = 60.0;
    layer.rotation_deg = 90.0;
    let m = layer_transform(&layer, Size::new(100.0, 100.0), 1.0);
    // rotate (1,0) -> (0,1), then tilt maps (0,1) -> (c, d) = (-sin 60°, 1).
    let p = m.apply(Point::new(1.0, 0.0));
    assert!(approx_pt(p, -(60_f64.to_radians().sin()), 1.0));
}

// =============================================================
// validate_geometry
// =============================================================

#[test]
fn validate_accepts_default_layer() {
    assert!(validate_geometry(&Layer::text("hi")).is_ok());
}

#[test]
fn validate_rejects_non_finite() {
    let mut layer = layer_at(50.0, 50.0, 10.0, 10.0);
    layer.rotation_deg = f64::NAN;
    assert_eq!(validate_geometry(&layer), Err(GeometryError::NonFiniteField("rotationDeg")));
}

#[test]
fn validate_rejects_non_positive_size() {
    let layer = layer_at(50.0, 50.0, 0.0, 10.0);
    assert!(matches!(validate_geometry(&layer), Err(GeometryError::NonPositiveSize { .. })));
}
