//! Pure Rust rendering backend: no system graphics libraries.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Font loading, metrics, glyph coverage | `ab_glyph` (`FontArc`, `ScaleFont`, `outline_glyph`) |
//! | Rotation | `imageproc::geometric_transformations::warp_into` with a composed `Projection` |
//! | Resample | `image::imageops::resize` with `Lanczos3` filter |
//! | Composite | [`composite_over`](super::backend::composite_over) |
//!
//! ## Rotation order
//!
//! A bitmap is rotated onto a canvas sized to its rotated bounds by the
//! projection `translate(canvas / 2) · rotate(θ) · translate(−source / 2)`:
//! move the source centre to the origin, rotate, then move the origin to the
//! centre of the *rotated* canvas. The last translation uses the source's
//! half-size, not the canvas's, otherwise the result drifts off-centre.

use super::backend::{BackendError, RenderBackend};
use super::calculations::rotated_bounds;
use super::params::{ScaleParams, TextParams};
use crate::types::Size;
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Luma, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pure Rust backend using `image`, `imageproc`, and `ab_glyph`.
///
/// Fonts are read from disk on first use and cached by path for the lifetime
/// of the backend, so the font-size search does not re-parse the file for
/// every candidate size.
#[derive(Default)]
pub struct RustBackend {
    fonts: RefCell<HashMap<PathBuf, FontArc>>,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn font(&self, path: &Path) -> Result<FontArc, BackendError> {
        if let Some(font) = self.fonts.borrow().get(path) {
            return Ok(font.clone());
        }

        let bytes = std::fs::read(path).map_err(|e| BackendError::Font {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| BackendError::Font {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(font = %path.display(), "loaded font");

        self.fonts
            .borrow_mut()
            .insert(path.to_path_buf(), font.clone());
        Ok(font)
    }
}

/// Load and decode an image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Save an image, inferring the format from the path's extension.
///
/// JPEG has no alpha channel, so RGBA input is flattened to RGB first.
pub fn save_image(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format for {}: {}",
            path.display(),
            e
        ))
    })?;

    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).save_with_format(path, format),
        other => img.save_with_format(path, other),
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
    })
}

/// Advance width (with kerning) and line height of `text`, unrounded.
fn text_extent<F: Font>(font: &F, scale: PxScale, text: &str) -> (f32, f32) {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }

    (width, scaled.height())
}

/// Rasterise glyph coverage for `text` into a mask of exactly `size`.
fn coverage_mask<F: Font>(font: &F, scale: PxScale, text: &str, size: Size) -> GrayImage {
    let scaled = font.as_scaled(scale);
    let mut mask = GrayImage::new(size.width, size.height);
    let baseline = scaled.ascent();
    let mut cursor = 0.0f32;
    let mut prev: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, ab_glyph::point(cursor, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i64 + bounds.min.x as i64;
                let y = py as i64 + bounds.min.y as i64;
                if x < 0 || y < 0 || x >= size.width as i64 || y >= size.height as i64 {
                    return;
                }
                let value = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                let px = mask.get_pixel_mut(x as u32, y as u32);
                // Overlapping glyphs keep the stronger coverage
                if value > px[0] {
                    *px = Luma([value]);
                }
            });
        }
        cursor += scaled.h_advance(id);
        prev = Some(id);
    }

    mask
}

/// Rotate `source` clockwise by `angle` degrees about its centre onto a new
/// transparent canvas of `canvas` size.
fn warp_centered(source: &RgbaImage, angle: f64, canvas: Size) -> RgbaImage {
    let half_src_w = source.width() as f32 / 2.0;
    let half_src_h = source.height() as f32 / 2.0;

    let projection = Projection::translate(canvas.width as f32 / 2.0, canvas.height as f32 / 2.0)
        * Projection::rotate(angle.rem_euclid(360.0).to_radians() as f32)
        * Projection::translate(-half_src_w, -half_src_h);

    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, TRANSPARENT);
    warp_into(
        source,
        &projection,
        Interpolation::Bilinear,
        TRANSPARENT,
        &mut out,
    );
    out
}

impl RenderBackend for RustBackend {
    fn load(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        Ok(load_image(path)?.to_rgba8())
    }

    fn measure_text(
        &self,
        text: &str,
        font: &Path,
        font_size: u32,
    ) -> Result<Size, BackendError> {
        let font = self.font(font)?;
        let (width, height) = text_extent(&font, PxScale::from(font_size as f32), text);
        Ok(Size::new(width.ceil() as u32, height.ceil() as u32))
    }

    fn render_text(&self, params: &TextParams) -> Result<RgbaImage, BackendError> {
        let font = self.font(&params.font)?;
        let scale = PxScale::from(params.font_size as f32);
        let (width, height) = text_extent(&font, scale, &params.text);
        let extent = Size::new(width.ceil() as u32, height.ceil() as u32);
        if extent.is_empty() || params.footprint.is_empty() {
            return Err(BackendError::ProcessingFailed(format!(
                "text {:?} has no visible extent at {}px",
                params.text, params.font_size
            )));
        }

        let mask = coverage_mask(&font, scale, &params.text, extent);
        let color = params.color;
        let text_layer = RgbaImage::from_fn(extent.width, extent.height, |x, y| {
            let coverage = mask.get_pixel(x, y)[0] as u32;
            let alpha = (coverage * params.alpha as u32 / 255) as u8;
            Rgba([color.r, color.g, color.b, alpha])
        });

        if params.angle.rem_euclid(360.0) == 0.0 && params.footprint == extent {
            return Ok(text_layer);
        }
        Ok(warp_centered(&text_layer, params.angle, params.footprint))
    }

    fn rotate(&self, image: &RgbaImage, angle: f64) -> Result<RgbaImage, BackendError> {
        let bounds = rotated_bounds(image.width(), image.height(), angle);
        if bounds.is_empty() {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot rotate a {}x{} bitmap",
                image.width(),
                image.height()
            )));
        }
        Ok(warp_centered(image, angle, bounds))
    }

    fn scale(&self, image: &RgbaImage, params: &ScaleParams) -> Result<RgbaImage, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "cannot scale to {}x{}",
                params.width, params.height
            )));
        }

        let mut scaled = if (params.width, params.height) == image.dimensions() {
            image.clone()
        } else {
            image::imageops::resize(image, params.width, params.height, FilterType::Lanczos3)
        };
        for px in scaled.pixels_mut() {
            px[3] = params.opacity.apply(px[3]);
        }
        Ok(scaled)
    }
}
