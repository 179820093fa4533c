//! Geometric value types shared by the calculation, backend, and compositor layers.
//!
//! All of them are plain `Copy` values. Nothing here is ever mutated after
//! construction; functions take them by value and return new ones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a bounding box or rendered extent, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when `self` exceeds `other` in either dimension.
    pub fn exceeds(self, other: Size) -> bool {
        self.width > other.width || self.height > other.height
    }

    /// Scale both dimensions by a percentage, truncating toward zero.
    ///
    /// Used to turn a layer's `size_percent` into a size budget.
    pub fn percent(self, percent: f64) -> Size {
        let factor = percent / 100.0;
        Size {
            width: (self.width as f64 * factor) as u32,
            height: (self.height as f64 * factor) as u32,
        }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Top-left offset on a canvas. May be negative when content overhangs the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Named placement of a layer relative to the canvas.
///
/// Written in kebab-case in config files: `"top-left"`, `"center"`,
/// `"bottom-right"`, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_truncates_toward_zero() {
        assert_eq!(Size::new(1000, 800).percent(60.0), Size::new(600, 480));
        assert_eq!(Size::new(333, 101).percent(50.0), Size::new(166, 50));
    }

    #[test]
    fn exceeds_checks_either_axis() {
        let budget = Size::new(100, 50);
        assert!(!Size::new(100, 50).exceeds(budget));
        assert!(Size::new(101, 10).exceeds(budget));
        assert!(Size::new(10, 51).exceeds(budget));
    }

    #[test]
    fn anchor_names_round_trip_through_serde() {
        for anchor in Anchor::ALL {
            let json = serde_json::to_string(&anchor).unwrap();
            assert_eq!(json, format!("\"{}\"", anchor.as_str()));
        }
        let parsed: Anchor = serde_json::from_str("\"bottom-left\"").unwrap();
        assert_eq!(parsed, Anchor::BottomLeft);
    }
}
