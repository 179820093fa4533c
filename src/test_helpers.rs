//! Shared test utilities for the watermarker test suite.
//!
//! Synthetic source images and settings builders, so compositor tests read
//! as "this source, these settings, expect these pixels".
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = gradient_image(1000, 800);
//! let settings = text_only("WM", 0.4, vec![Anchor::Center]);
//! ```

use crate::config::{ImageLayerSettings, LayerSettings, TextLayerSettings, WatermarkSettings};
use crate::imaging::Color;
use crate::types::Anchor;
use image::{Rgba, RgbaImage};

// =========================================================================
// Images
// =========================================================================

/// Opaque image whose red and green channels follow x and y, so every
/// pixel is distinguishable from its neighbours and from white.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            255,
        ])
    })
}

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

// =========================================================================
// Settings builders
// =========================================================================

fn placement(size_percent: f64, opacity: f64, anchors: Vec<Anchor>) -> LayerSettings {
    LayerSettings {
        size_percent,
        opacity,
        anchors,
    }
}

/// Settings with only a white text layer at 60% of the canvas.
///
/// The font path is a placeholder; it only resolves against the mock backend.
pub fn text_only(content: &str, opacity: f64, anchors: Vec<Anchor>) -> WatermarkSettings {
    WatermarkSettings {
        text: TextLayerSettings {
            enabled: true,
            content: content.to_string(),
            color: Color::white(),
            font: "mock.ttf".to_string(),
            placement: placement(60.0, opacity, anchors),
            ..TextLayerSettings::default()
        },
        ..WatermarkSettings::default()
    }
}

/// Settings with only the image layer, reading `marker.png`.
pub fn image_only(size_percent: f64, opacity: f64, anchors: Vec<Anchor>) -> WatermarkSettings {
    WatermarkSettings {
        image: ImageLayerSettings {
            enabled: true,
            placement: placement(size_percent, opacity, anchors),
            ..ImageLayerSettings::default()
        },
        ..WatermarkSettings::default()
    }
}
