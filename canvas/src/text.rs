//! Multi-line text layout.
//!
//! The raster surface has no rich multi-line text primitive, so text layers
//! are laid out here: split on newlines, place each glyph with letter spacing,
//! align each line inside the layer box (with justify spreading leftover width
//! across interior whitespace runs), and center the block vertically.
//!
//! Coordinates are layer-local: the box is centered on the origin, so its left
//! edge is `-box_width / 2`. Each line carries the y of its middle baseline.
//!
//! Font size is `fontSizeEm · 16 · scale`, where `scale` is the ratio of the
//! output height to the reference viewport height. That one factor keeps
//! exported text identical to the interactive preview.

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use crate::consts::BASE_FONT_PX;
use crate::doc::{TextAlign, TextProps};

/// Per-character advance widths at a given pixel size.
pub trait GlyphMeasure {
    /// Horizontal advance of `ch` in pixels at `font_px`.
    fn advance(&self, ch: char, font_px: f64) -> f64;
}

/// Pixel-space text style for one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_px: f64,
    pub letter_spacing_px: f64,
    pub line_height_px: f64,
    pub align: TextAlign,
}

impl TextStyle {
    /// Resolve em-relative text props at a render scale.
    #[must_use]
    pub fn resolve(props: &TextProps, scale: f64) -> Self {
        let font_px = props.font_size_em * BASE_FONT_PX * scale;
        Self {
            font_px,
            letter_spacing_px: props.letter_spacing_em * font_px,
            line_height_px: props.line_height_em * font_px,
            align: props.text_align,
        }
    }
}

/// One glyph placed on a line. `x` is the left edge of its advance box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub x: f64,
}

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidLine {
    /// Middle-baseline y, layer-local.
    pub y: f64,
    /// Natural width: advances plus letter spacing, before justify.
    pub width: f64,
    pub glyphs: Vec<PlacedGlyph>,
}

/// Result of laying out a text block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    pub lines: Vec<LaidLine>,
}

impl TextLayout {
    /// True when nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.glyphs.is_empty())
    }
}

/// Natural width of a line: sum of advances plus `letter_spacing · (chars − 1)`.
#[must_use]
pub fn line_width(line: &str, style: &TextStyle, measure: &dyn GlyphMeasure) -> f64 {
    let mut count = 0_usize;
    let mut sum = 0.0;
    for ch in line.chars() {
        sum += measure.advance(ch, style.font_px);
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let gaps = (count - 1) as f64;
    sum + style.letter_spacing_px * gaps
}

/// Number of whitespace runs that sit between two non-whitespace characters.
fn interior_whitespace_runs(chars: &[char]) -> usize {
    let mut runs = 0;
    let mut seen_word = false;
    let mut in_gap = false;
    for ch in chars {
        if ch.is_whitespace() {
            if seen_word {
                in_gap = true;
            }
        } else {
            if in_gap {
                runs += 1;
                in_gap = false;
            }
            seen_word = true;
        }
    }
    runs
}

fn line_start(width: f64, box_width: f64, align: TextAlign) -> f64 {
    let left = -box_width / 2.0;
    match align {
        TextAlign::Left | TextAlign::Justify => left,
        TextAlign::Right => box_width / 2.0 - width,
        TextAlign::Center => -width / 2.0,
    }
}

/// Lay out `text` inside a box `box_width` pixels wide.
///
/// Empty text produces no lines. Empty lines keep their vertical slot but
/// carry no glyphs.
#[must_use]
pub fn layout_text(text: &str, style: &TextStyle, box_width: f64, measure: &dyn GlyphMeasure) -> TextLayout {
    if text.is_empty() {
        return TextLayout::default();
    }

    let raw_lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    #[allow(clippy::cast_precision_loss)]
    let count = raw_lines.len() as f64;
    let top = -(count - 1.0) * style.line_height_px / 2.0;
    let last = raw_lines.len() - 1;

    let mut lines = Vec::with_capacity(raw_lines.len());
    for (idx, raw) in raw_lines.iter().enumerate() {
        let chars: Vec<char> = raw.chars().collect();
        let width = line_width(raw, style, measure);
        let mut x = line_start(width, box_width, style.align);

        let runs = interior_whitespace_runs(&chars);
        let leftover = box_width - width;
        #[allow(clippy::cast_precision_loss)]
        let gap_extra = if style.align == TextAlign::Justify && idx != last && runs > 0 && leftover > 0.0 {
            leftover / runs as f64
        } else {
            0.0
        };

        let mut glyphs = Vec::with_capacity(chars.len());
        let mut seen_word = false;
        let mut in_gap = false;
        for ch in &chars {
            if ch.is_whitespace() {
                if seen_word {
                    in_gap = true;
                }
            } else {
                if in_gap {
                    x += gap_extra;
                    in_gap = false;
                }
                seen_word = true;
            }
            glyphs.push(PlacedGlyph { ch: *ch, x });
            x += measure.advance(*ch, style.font_px) + style.letter_spacing_px;
        }

        #[allow(clippy::cast_precision_loss)]
        let y = top + idx as f64 * style.line_height_px;
        lines.push(LaidLine { y, width, glyphs });
    }

    TextLayout { lines }
}
