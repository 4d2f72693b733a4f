//! Font faces used for text measurement and rasterization.
//!
//! A [`FontBook`] holds every loaded face keyed by lowercase family name and
//! weight. Text layers name a CSS-like family list (`"Inter, sans-serif"`);
//! [`FontBook::resolve`] walks that list, picks the closest weight of the
//! first family it knows, and otherwise falls back to the first face loaded.

#[cfg(test)]
#[path = "fonts_test.rs"]
mod fonts_test;

use ab_glyph::{Font, FontArc, OutlineCurve};
use tiny_skia::PathBuilder;

use crate::text::GlyphMeasure;

/// Error returned when font bytes cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("invalid font data for family `{0}`")]
    Invalid(String),
}

/// One loaded face.
#[derive(Clone)]
pub struct FontFace {
    family: String,
    weight: u16,
    font: FontArc,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

impl FontFace {
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    #[must_use]
    pub fn weight(&self) -> u16 {
        self.weight
    }

    fn units_per_em(&self) -> f64 {
        f64::from(self.font.units_per_em().unwrap_or(1000.0))
    }

    /// Font units to pixels at `font_px`.
    #[must_use]
    pub fn em_scale(&self, font_px: f64) -> f64 {
        font_px / self.units_per_em()
    }

    /// Ascent above the alphabetic baseline, in pixels (positive).
    #[must_use]
    pub fn ascent(&self, font_px: f64) -> f64 {
        f64::from(self.font.ascent_unscaled()) * self.em_scale(font_px)
    }

    /// Descent below the alphabetic baseline, in pixels (negative).
    #[must_use]
    pub fn descent(&self, font_px: f64) -> f64 {
        f64::from(self.font.descent_unscaled()) * self.em_scale(font_px)
    }

    /// Offset from a middle baseline to the alphabetic baseline.
    #[must_use]
    pub fn middle_to_alphabetic(&self, font_px: f64) -> f64 {
        (self.ascent(font_px) + self.descent(font_px)) / 2.0
    }

    /// Append the outline of `ch` to `builder`, with its origin at
    /// (`x`, `baseline`) in layer-local pixels. Returns false for glyphs
    /// without an outline (e.g. spaces).
    #[allow(clippy::cast_possible_truncation)]
    pub fn append_glyph(&self, builder: &mut PathBuilder, ch: char, x: f64, baseline: f64, font_px: f64) -> bool {
        let id = self.font.glyph_id(ch);
        let Some(outline) = self.font.outline(id) else {
            return false;
        };
        let k = self.em_scale(font_px);
        let map = |p: ab_glyph::Point| ((x + f64::from(p.x) * k) as f32, (baseline - f64::from(p.y) * k) as f32);

        let mut cursor: Option<(f32, f32)> = None;
        for curve in &outline.curves {
            let (start, end) = match curve {
                OutlineCurve::Line(a, b) | OutlineCurve::Quad(a, _, b) | OutlineCurve::Cubic(a, _, _, b) => {
                    (map(*a), map(*b))
                }
            };
            if cursor != Some(start) {
                if cursor.is_some() {
                    builder.close();
                }
                builder.move_to(start.0, start.1);
            }
            match curve {
                OutlineCurve::Line(..) => builder.line_to(end.0, end.1),
                OutlineCurve::Quad(_, c, _) => {
                    let c = map(*c);
                    builder.quad_to(c.0, c.1, end.0, end.1);
                }
                OutlineCurve::Cubic(_, c1, c2, _) => {
                    let c1 = map(*c1);
                    let c2 = map(*c2);
                    builder.cubic_to(c1.0, c1.1, c2.0, c2.1, end.0, end.1);
                }
            }
            cursor = Some(end);
        }
        if cursor.is_some() {
            builder.close();
        }
        true
    }
}

impl GlyphMeasure for FontFace {
    fn advance(&self, ch: char, font_px: f64) -> f64 {
        let id = self.font.glyph_id(ch);
        f64::from(self.font.h_advance_unscaled(id)) * self.em_scale(font_px)
    }
}

/// All faces available to the renderer.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

impl FontBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-parsed font.
    pub fn add(&mut self, family: &str, weight: u16, font: FontArc) {
        self.faces.push(FontFace { family: normalize_family(family), weight, font });
    }

    /// Parse and register raw TTF/OTF bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Invalid`] when the bytes are not a font.
    pub fn add_bytes(&mut self, family: &str, weight: u16, bytes: Vec<u8>) -> Result<(), FontError> {
        let font = FontArc::try_from_vec(bytes).map_err(|_| FontError::Invalid(family.to_owned()))?;
        self.add(family, weight, font);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Pick a face for a CSS-like family list and weight.
    ///
    /// The first listed family that has any face wins, choosing the face with
    /// the nearest weight. Without a match the first registered face is used.
    #[must_use]
    pub fn resolve(&self, family_list: &str, weight: u16) -> Option<&FontFace> {
        for family in family_list.split(',').map(normalize_family) {
            let best = self
                .faces
                .iter()
                .filter(|f| f.family == family)
                .min_by_key(|f| f.weight.abs_diff(weight));
            if best.is_some() {
                return best;
            }
        }
        self.faces.first()
    }
}

/// Lowercase, trimmed, unquoted family name.
#[must_use]
pub fn normalize_family(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}

/// CSS weight implied by a face style name such as `Bold` or `SemiBold`.
#[must_use]
pub fn weight_from_style(style: &str) -> u16 {
    let key: String = style
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase();
    match key.as_str() {
        "thin" | "hairline" => 100,
        "extralight" | "ultralight" => 200,
        "light" => 300,
        "medium" => 500,
        "semibold" | "demibold" => 600,
        "bold" => 700,
        "extrabold" | "ultrabold" => 800,
        "black" | "heavy" => 900,
        _ => 400,
    }
}
