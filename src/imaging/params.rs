//! Parameter types for drawing operations.
//!
//! These structs describe *what* to draw, not *how*. They are the interface
//! between the high-level [`operations`](super::operations) module (which
//! decides sizes, angles, and colours) and the [`backend`](super::backend)
//! (which does the pixel work). Keeping them plain data is what lets the
//! compositor run against a recording mock in tests.
//!
//! ## Types
//!
//! - [`Opacity`]: layer opacity in `0.0..=1.0`. Clamped on construction.
//! - [`Color`]: RGB colour parsed from `#RGB` / `#RRGGBB`.
//! - [`TextParams`]: a text layer: string, font, size, colour with alpha, angle, footprint.
//! - [`ScaleParams`]: resample a bitmap to an exact size and scale its alpha.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Layer opacity (0.0 = invisible, 1.0 = opaque).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Opacity(f64);

impl Opacity {
    pub const OPAQUE: Opacity = Opacity(1.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Opacity as an 8-bit alpha value, truncated.
    pub fn alpha(self) -> u8 {
        (self.0 * 255.0) as u8
    }

    /// Scale an existing alpha value by this opacity.
    pub fn apply(self, alpha: u8) -> u8 {
        (alpha as f64 * self.0) as u8
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// An RGB colour.
///
/// Serialized as a `#rrggbb` string; `#rgb` shorthand is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {input:?}: {reason}")]
pub struct ColorParseError {
    input: String,
    reason: &'static str,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn red() -> Self {
        Self::new(255, 0, 0)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| ColorParseError {
            input: s.to_string(),
            reason,
        };
        let hex = s.strip_prefix('#').ok_or_else(|| fail("must start with '#'"))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(fail("not a hex digit"));
        }
        let digit = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| fail("not a hex digit"))
        };

        match hex.len() {
            // #RGB: each digit doubled, 0xA -> 0xAA
            3 => Ok(Color::new(digit(0..1)? * 17, digit(1..2)? * 17, digit(2..3)? * 17)),
            6 => Ok(Color::new(digit(0..2)?, digit(2..4)?, digit(4..6)?)),
            _ => Err(fail("expected #RGB or #RRGGBB")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parameters for rendering a text layer.
///
/// The backend rasterises `text` unrotated at `font_size`, then rotates it by
/// `angle` about the centre of a transparent layer exactly `footprint` in size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub text: String,
    /// Font file used for metrics and glyph outlines.
    pub font: PathBuf,
    pub font_size: u32,
    pub color: Color,
    /// Alpha applied to every glyph, already derived from the layer opacity.
    pub alpha: u8,
    /// Clockwise rotation in degrees.
    pub angle: f64,
    /// Size of the output layer; the rotated bounds of the measured text.
    pub footprint: crate::types::Size,
}

/// Parameters for resampling a watermark bitmap onto its own layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub width: u32,
    pub height: u32,
    pub opacity: Opacity,
}
