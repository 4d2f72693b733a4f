//! Input model: modifier keys, mouse buttons, keys, and the gesture state machine.
//!
//! `InputState` is the gesture tracked between pointer-down and pointer-up.
//! Each active variant carries the context captured at pointer-down (the
//! container rect and the starting percentages) so every pointer-move can be
//! computed from the start of the gesture rather than accumulated.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::LayerId;
use crate::geometry::{Point, Rect};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key, named as the browser reports it (`"Enter"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }

    /// Delete or Backspace.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.is("Delete") || self.is("Backspace")
    }
}

/// The gesture in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Moving a layer. `container` is frozen at pointer-down.
    DraggingLayer {
        id: LayerId,
        start: Point,
        orig_x_pct: f64,
        orig_y_pct: f64,
        container: Rect,
    },
    /// Moving the cutout. Only the mask offset changes.
    DraggingMask {
        start: Point,
        orig_x_pct: f64,
        orig_y_pct: f64,
        container: Rect,
    },
    /// Rubber-band selection in container-relative pixels.
    Marquee {
        anchor: Point,
        current: Point,
        /// Selection to extend (shift held at pointer-down).
        base: Vec<LayerId>,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Current marquee rectangle, if a marquee is active.
    #[must_use]
    pub fn marquee_rect(&self) -> Option<Rect> {
        match self {
            Self::Marquee { anchor, current, .. } => Some(Rect::from_corners(*anchor, *current)),
            _ => None,
        }
    }
}

/// Percentage reached by dragging `delta_px` across a container `extent_px`
/// wide, clamped to the canvas.
#[must_use]
pub fn drag_pct(orig_pct: f64, delta_px: f64, extent_px: f64) -> f64 {
    if extent_px <= 0.0 || !extent_px.is_finite() {
        return orig_pct;
    }
    (orig_pct + delta_px / extent_px * 100.0).clamp(0.0, 100.0)
}
