//! CSS color parsing for layer fills, strokes, text and effects.
//!
//! Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
//! `rgba(r, g, b, a)`, `transparent` and a handful of named colors. Anything
//! else is `None` and callers pick a fallback.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

/// Straight (non-premultiplied) 8-bit RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
}

fn hex_byte(raw: &str) -> Option<u8> {
    match u8::from_str_radix(raw, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

fn hex_nibble(raw: &str) -> Option<u8> {
    hex_byte(&raw.repeat(2))
}

/// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
#[must_use]
pub fn parse_hex(raw: &str) -> Option<Rgba> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let r = hex_nibble(&hex[0..1])?;
            let g = hex_nibble(&hex[1..2])?;
            let b = hex_nibble(&hex[2..3])?;
            let a = if hex.len() == 4 { hex_nibble(&hex[3..4])? } else { 255 };
            Some(Rgba { r, g, b, a })
        }
        6 | 8 => {
            let r = hex_byte(&hex[0..2])?;
            let g = hex_byte(&hex[2..4])?;
            let b = hex_byte(&hex[4..6])?;
            let a = if hex.len() == 8 { hex_byte(&hex[6..8])? } else { 255 };
            Some(Rgba { r, g, b, a })
        }
        _ => None,
    }
}

fn channel(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.trim().parse::<f64>().map_or(f64::NAN, |p| p / 100.0 * 255.0)
    } else {
        raw.parse::<f64>().unwrap_or(f64::NAN)
    };
    if !value.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn alpha(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.trim().parse::<f64>().map_or(f64::NAN, |p| p / 100.0)
    } else {
        raw.parse::<f64>().unwrap_or(f64::NAN)
    };
    if !value.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((value.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Parse `rgb(...)` / `rgba(...)` with comma or space separators and an optional `/ alpha`.
#[must_use]
pub fn parse_rgb_function(raw: &str) -> Option<Rgba> {
    let lower = raw.trim().to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [r, g, b] => Some(Rgba::rgb(channel(r)?, channel(g)?, channel(b)?)),
        [r, g, b, a] => Some(Rgba { r: channel(r)?, g: channel(g)?, b: channel(b)?, a: alpha(a)? }),
        _ => None,
    }
}

fn named(raw: &str) -> Option<Rgba> {
    let color = match raw.trim().to_ascii_lowercase().as_str() {
        "transparent" => Rgba::TRANSPARENT,
        "black" => Rgba::BLACK,
        "white" => Rgba::rgb(255, 255, 255),
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        _ => return None,
    };
    Some(color)
}

/// Parse any supported CSS color.
#[must_use]
pub fn parse_color(raw: &str) -> Option<Rgba> {
    parse_hex(raw)
        .or_else(|| parse_rgb_function(raw))
        .or_else(|| named(raw))
}

/// Parse a CSS color, falling back when the value is not understood.
#[must_use]
pub fn parse_color_or(raw: &str, fallback: Rgba) -> Rgba {
    parse_color(raw).unwrap_or(fallback)
}
