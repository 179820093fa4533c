//! Rendering backend trait and shared drawing primitives.
//!
//! The [`RenderBackend`] trait is the drawing surface the compositor talks
//! to: decode a watermark bitmap, measure and rasterise text, rotate and
//! resample bitmaps, and composite a layer onto the canvas.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, fonts loaded
//! from files with `ab_glyph`, warps from `imageproc`.

use super::params::{ScaleParams, TextParams};
use crate::types::{Point, Size};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to load font {path}: {message}")]
    Font { path: PathBuf, message: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for drawing backends.
///
/// Everything the compositor needs from a 2D graphics library, and nothing
/// more. Geometry decisions (sizes, angles, offsets) are made by the caller;
/// the backend only executes them.
pub trait RenderBackend {
    /// Decode an image file into an RGBA bitmap.
    fn load(&self, path: &Path) -> Result<RgbaImage, BackendError>;

    /// Unrotated extent of `text` set in `font` at `font_size` pixels.
    fn measure_text(&self, text: &str, font: &Path, font_size: u32)
    -> Result<Size, BackendError>;

    /// Rasterise a text layer as described by `params`.
    ///
    /// The result is exactly `params.footprint` in size, transparent except
    /// for the glyphs, which are centred and rotated about the layer centre.
    fn render_text(&self, params: &TextParams) -> Result<RgbaImage, BackendError>;

    /// Rotate a bitmap about its centre onto a new transparent canvas sized
    /// to the rotated bounds.
    fn rotate(&self, image: &RgbaImage, angle: f64) -> Result<RgbaImage, BackendError>;

    /// Resample a bitmap to an exact size and scale its alpha by the opacity.
    fn scale(&self, image: &RgbaImage, params: &ScaleParams) -> Result<RgbaImage, BackendError>;

    /// Draw `layer` onto `canvas` with its top-left corner at `at`.
    fn composite(&self, canvas: &mut RgbaImage, layer: &RgbaImage, at: Point) {
        composite_over(canvas, layer, at);
    }
}

/// Alpha-composite `layer` over `canvas` at `at` using the Porter-Duff "over" operator.
///
/// Parts of the layer outside the canvas are clipped, so `at` may be
/// negative. Fully transparent layer pixels leave the canvas untouched.
pub fn composite_over(canvas: &mut RgbaImage, layer: &RgbaImage, at: Point) {
    let canvas_w = canvas.width() as i64;
    let canvas_h = canvas.height() as i64;
    let (x0, y0) = (at.x as i64, at.y as i64);

    let x_start = x0.max(0);
    let y_start = y0.max(0);
    let x_end = (x0 + layer.width() as i64).min(canvas_w);
    let y_end = (y0 + layer.height() as i64).min(canvas_h);

    for cy in y_start..y_end {
        for cx in x_start..x_end {
            let src = *layer.get_pixel((cx - x0) as u32, (cy - y0) as u32);
            if src[3] == 0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
            *dst = blend_over(*dst, src);
        }
    }
}

fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    if foreground[3] == 255 {
        return foreground;
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let channel = |fg: u8, bg: u8| -> u8 {
        let fg = fg as f32 / 255.0;
        let bg = bg as f32 / 255.0;
        let result = (fg * fg_alpha + bg * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(foreground[0], background[0]),
        channel(foreground[1], background[1]),
        channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
