//! Rasterization: draws one layer onto a `tiny_skia` surface.
//!
//! This module is the only place that touches `tiny_skia` paths and paints.
//! It receives a read-only layer plus a [`RenderContext`] and produces pixels;
//! it never mutates document state.
//!
//! A layer is drawn in three steps. Its content is prepared in layer-local
//! pixels (origin at the box center), the effect passes from
//! [`crate::effects::plan_passes`] are walked in order, and each pass paints
//! the content through the layer transform. Shadow and glow passes first
//! composite a blurred, tinted copy of the content's coverage at their offset.
//!
//! Layers that cannot be drawn (bad geometry, no usable font, missing image
//! pixels) are skipped with a warning; the surface is left untouched.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use image::GrayImage;
use tiny_skia::{
    FillRule, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, PixmapRef, PremultipliedColorU8, Stroke,
    Transform,
};
use tracing::warn;

use crate::color::{Rgba, parse_color, parse_color_or};
use crate::doc::{Layer, LayerContent, ShapeKind, ShapeProps, TextProps};
use crate::effects::{ShadowStyle, blur_alpha, plan_passes};
use crate::fonts::FontBook;
use crate::geometry::{Affine, Size, layer_box, layer_transform, validate_geometry};
use crate::text::{TextStyle, layout_text};

/// Bezier handle length for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

/// Everything a layer needs from its surroundings to be drawn.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Output surface size in pixels.
    pub size: Size,
    /// Output height over reference viewport height.
    pub scale: f64,
    pub fonts: &'a FontBook,
}

/// Content ready to paint, in layer-local pixels.
enum Prepared<'a> {
    Shape { fill: Option<(Path, Rgba)>, stroke: Option<(Path, Rgba, f32)> },
    Text { path: Path, color: Rgba },
    Image { pixmap: PixmapRef<'a>, placement: Affine },
}

/// Draw `layer` onto `surface`. `image` carries the decoded pixels of an
/// image layer. Returns whether anything was painted.
pub fn draw_layer(surface: &mut Pixmap, layer: &Layer, ctx: &RenderContext<'_>, image: Option<PixmapRef<'_>>) -> bool {
    if layer.hidden {
        return false;
    }
    if let Err(err) = validate_geometry(layer) {
        warn!(id = %layer.id, error = %err, "skipping layer with invalid geometry");
        return false;
    }
    let Some(prepared) = prepare(layer, ctx, image) else {
        return false;
    };

    let transform = layer_transform(layer, ctx.size, ctx.scale);
    for pass in plan_passes(&layer.effects, ctx.scale) {
        if let Some(shadow) = pass.shadow.filter(ShadowStyle::is_visible) {
            draw_shadow(surface, &prepared, &transform, &shadow);
        }
        paint(surface, &prepared, &transform);
    }
    true
}

/// Draw a full-canvas image (the cutout) stretched to the surface and
/// translated by `offset_px`.
pub fn draw_full_canvas(surface: &mut Pixmap, image: PixmapRef<'_>, offset_x: f64, offset_y: f64) {
    let placement = Affine::translate(offset_x, offset_y).then(&Affine::scale(
        f64::from(surface.width()) / f64::from(image.width()),
        f64::from(surface.height()) / f64::from(image.height()),
    ));
    surface.draw_pixmap(0, 0, image, &image_paint(), placement.to_skia(), None);
}

// =============================================================
// Preparation
// =============================================================

fn prepare<'a>(layer: &Layer, ctx: &RenderContext<'_>, image: Option<PixmapRef<'a>>) -> Option<Prepared<'a>> {
    let size = layer_box(layer, ctx.size);
    match &layer.content {
        LayerContent::Shape(shape) => Some(prepare_shape(shape, size, ctx.scale)),
        LayerContent::Text(text) => prepare_text(layer, text, size, ctx),
        LayerContent::Image(props) => {
            let Some(pixmap) = image else {
                warn!(id = %layer.id, src = %props.src, "skipping image layer without pixels");
                return None;
            };
            let placement = Affine::translate(-size.width / 2.0, -size.height / 2.0).then(&Affine::scale(
                size.width / f64::from(pixmap.width()),
                size.height / f64::from(pixmap.height()),
            ));
            Some(Prepared::Image { pixmap, placement })
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn prepare_shape(shape: &ShapeProps, size: Size, scale: f64) -> Prepared<'static> {
    let (w, h) = (size.width as f32, size.height as f32);
    let path = match shape.shape {
        ShapeKind::Rectangle => {
            let radius = (shape.radius_pct.max(0.0) / 100.0 * size.width.min(size.height)) as f32;
            rounded_rect(w, h, radius.min(w.min(h) / 2.0))
        }
        ShapeKind::Ellipse => tiny_skia::Rect::from_xywh(-w / 2.0, -h / 2.0, w, h).and_then(PathBuilder::from_oval),
        ShapeKind::Triangle => {
            let mut pb = PathBuilder::new();
            pb.move_to(0.0, -h / 2.0);
            pb.line_to(w / 2.0, h / 2.0);
            pb.line_to(-w / 2.0, h / 2.0);
            pb.close();
            pb.finish()
        }
        ShapeKind::Line => {
            let mut pb = PathBuilder::new();
            pb.move_to(-w / 2.0, 0.0);
            pb.line_to(w / 2.0, 0.0);
            pb.finish()
        }
    };

    let fill = match shape.shape {
        ShapeKind::Line => None,
        _ => parse_color(&shape.fill)
            .filter(|c| !c.is_transparent())
            .and_then(|color| path.clone().map(|p| (p, color))),
    };
    let stroke_width = (shape.stroke_width * scale) as f32;
    let stroke = parse_color(&shape.stroke)
        .filter(|c| !c.is_transparent() && stroke_width > 0.0)
        .and_then(|color| path.map(|p| (p, color, stroke_width)));
    Prepared::Shape { fill, stroke }
}

/// Rectangle centered on the origin with circular corners of `r`.
fn rounded_rect(w: f32, h: f32, r: f32) -> Option<Path> {
    let (l, t, rt, b) = (-w / 2.0, -h / 2.0, w / 2.0, h / 2.0);
    if r <= 0.0 {
        return tiny_skia::Rect::from_ltrb(l, t, rt, b).map(PathBuilder::from_rect);
    }
    let k = r * KAPPA;
    let mut pb = PathBuilder::new();
    pb.move_to(l + r, t);
    pb.line_to(rt - r, t);
    pb.cubic_to(rt - r + k, t, rt, t + r - k, rt, t + r);
    pb.line_to(rt, b - r);
    pb.cubic_to(rt, b - r + k, rt - r + k, b, rt - r, b);
    pb.line_to(l + r, b);
    pb.cubic_to(l + r - k, b, l, b - r + k, l, b - r);
    pb.line_to(l, t + r);
    pb.cubic_to(l, t + r - k, l + r - k, t, l + r, t);
    pb.close();
    pb.finish()
}

fn prepare_text(layer: &Layer, props: &TextProps, size: Size, ctx: &RenderContext<'_>) -> Option<Prepared<'static>> {
    let Some(face) = ctx.fonts.resolve(&props.font_family, props.font_weight) else {
        warn!(id = %layer.id, family = %props.font_family, "skipping text layer: no font available");
        return None;
    };
    let style = TextStyle::resolve(props, ctx.scale);
    let text = props.display_text();
    let layout = layout_text(&text, &style, size.width, face);
    if layout.is_empty() {
        return None;
    }

    let to_alphabetic = face.middle_to_alphabetic(style.font_px);
    let mut pb = PathBuilder::new();
    for line in &layout.lines {
        let baseline = line.y + to_alphabetic;
        for glyph in &line.glyphs {
            face.append_glyph(&mut pb, glyph.ch, glyph.x, baseline, style.font_px);
        }
    }
    let path = pb.finish()?;
    let color = parse_color_or(&props.color, Rgba::rgb(255, 255, 255));
    Some(Prepared::Text { path, color })
}

// =============================================================
// Painting
// =============================================================

fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn image_paint() -> PixmapPaint {
    PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() }
}

fn paint(target: &mut Pixmap, prepared: &Prepared<'_>, transform: &Affine) {
    let ts = transform.to_skia();
    match prepared {
        Prepared::Shape { fill, stroke } => {
            if let Some((path, color)) = fill {
                target.fill_path(path, &solid_paint(*color), FillRule::Winding, ts, None);
            }
            if let Some((path, color, width)) = stroke {
                let stroke = Stroke { width: *width, ..Stroke::default() };
                target.stroke_path(path, &solid_paint(*color), &stroke, ts, None);
            }
        }
        Prepared::Text { path, color } => {
            target.fill_path(path, &solid_paint(*color), FillRule::Winding, ts, None);
        }
        Prepared::Image { pixmap, placement } => {
            let full = transform.then(placement);
            target.draw_pixmap(0, 0, *pixmap, &image_paint(), full.to_skia(), None);
        }
    }
}

/// Composite a blurred, tinted copy of the content's coverage at the shadow offset.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_shadow(surface: &mut Pixmap, prepared: &Prepared<'_>, transform: &Affine, shadow: &ShadowStyle) {
    let (width, height) = (surface.width(), surface.height());
    let Some(mut scratch) = Pixmap::new(width, height) else {
        return;
    };
    paint(&mut scratch, prepared, transform);

    let alpha: Vec<u8> = scratch.pixels().iter().map(|p| p.alpha()).collect();
    let Some(plane) = GrayImage::from_raw(width, height, alpha) else {
        return;
    };
    let coverage = blur_alpha(plane, shadow.blur / 2.0);

    let tint_alpha = f32::from(shadow.color.a) / 255.0;
    for (px, cov) in scratch.pixels_mut().iter_mut().zip(coverage.as_raw()) {
        let a = (f32::from(*cov) / 255.0 * tint_alpha).clamp(0.0, 1.0);
        let premul = |c: u8| (f32::from(c) * a).round() as u8;
        let alpha = (a * 255.0).round() as u8;
        *px = PremultipliedColorU8::from_rgba(
            premul(shadow.color.r).min(alpha),
            premul(shadow.color.g).min(alpha),
            premul(shadow.color.b).min(alpha),
            alpha,
        )
        .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }

    #[allow(clippy::cast_possible_truncation)]
    let offset = Transform::from_translate(shadow.offset_x as f32, shadow.offset_y as f32);
    surface.draw_pixmap(0, 0, scratch.as_ref(), &PixmapPaint::default(), offset, None);
}

// =============================================================
// Pixel conversion
// =============================================================

/// Build a surface from straight (non-premultiplied) RGBA bytes.
#[must_use]
pub fn pixmap_from_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> Option<Pixmap> {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = u8::try_from((u16::from(*c) * a + 127) / 255).unwrap_or(u8::MAX);
        }
    }
    let size = tiny_skia::IntSize::from_wh(width, height)?;
    Pixmap::from_vec(rgba, size)
}

/// Straight RGBA bytes of a surface.
#[must_use]
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
