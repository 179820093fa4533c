//! High-level watermark operations.
//!
//! These functions combine calculations with backend execution. They take a
//! layer's settings, compute sizes, angles, and anchor offsets, and issue the
//! draw calls. Each intermediate bitmap (rendered text, rotated marker,
//! scaled marker) is owned by the function that created it and dropped as
//! soon as its last draw is done, including on the early-return paths.

use super::backend::{BackendError, RenderBackend};
use super::calculations::{fit_to_bounds, max_font_size, resolve_position, rotated_bounds};
use super::params::{Opacity, ScaleParams, TextParams};
use crate::config::{ImageLayerSettings, TextLayerSettings};
use crate::types::{Anchor, Point, Size};
use image::RgbaImage;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result type for watermark operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Why a layer was not drawn. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The source image is small in both dimensions; nothing was drawn.
    BelowThreshold,
    /// The layer is switched off in the settings.
    Disabled,
    /// Text layer enabled with no text.
    EmptyText,
    /// The marker bitmap is missing or could not be decoded.
    ImageUnavailable,
    /// Even the smallest font size overflows the size budget.
    BudgetTooSmall,
    /// The text measures to zero width or height.
    NoVisibleExtent,
    /// The fitted marker size has a zero dimension.
    ZeroFittedSize,
}

/// What happened to one layer during an apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LayerOutcome {
    Drawn {
        /// Size of the composited layer bitmap.
        size: Size,
        /// One offset per configured anchor, in draw order.
        positions: Vec<Point>,
        /// Chosen font size (text layers only).
        #[serde(skip_serializing_if = "Option::is_none")]
        font_size: Option<u32>,
        /// True when rotation was requested but unavailable and the
        /// unrotated bitmap was used instead.
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        rotation_fallback: bool,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl LayerOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        LayerOutcome::Skipped { reason }
    }

    pub fn is_drawn(&self) -> bool {
        matches!(self, LayerOutcome::Drawn { .. })
    }
}

fn canvas_size(canvas: &RgbaImage) -> Size {
    Size::new(canvas.width(), canvas.height())
}

/// Rotate a bitmap about its centre onto a canvas sized to its rotated bounds.
///
/// Returns `None` when the backend cannot produce a rotated bitmap; callers
/// fall back to the original.
pub fn rotate_image(
    backend: &impl RenderBackend,
    image: &RgbaImage,
    angle: f64,
) -> Option<RgbaImage> {
    match backend.rotate(image, angle) {
        Ok(rotated) => Some(rotated),
        Err(e) => {
            warn!(angle, error = %e, "rotation unavailable, using unrotated bitmap");
            None
        }
    }
}

/// Draw `layer` once per anchor position.
fn draw_at_anchors(
    backend: &impl RenderBackend,
    canvas: &mut RgbaImage,
    layer: &RgbaImage,
    anchors: &[Anchor],
) -> Vec<Point> {
    let bounds = canvas_size(canvas);
    let content = Size::new(layer.width(), layer.height());
    let mut positions = Vec::with_capacity(anchors.len());
    for &anchor in anchors {
        let at = resolve_position(anchor, bounds, content);
        backend.composite(canvas, layer, at);
        positions.push(at);
    }
    debug!(draws = positions.len(), %content, "layer composited");
    positions
}

/// Render the text layer once and composite it at every anchor.
///
/// The font size is the largest whose rotated footprint fits
/// `size_percent` of the canvas. Text alpha is `opacity × 255`.
pub fn place_text_watermark(
    backend: &impl RenderBackend,
    canvas: &mut RgbaImage,
    settings: &TextLayerSettings,
) -> Result<LayerOutcome> {
    if settings.content.is_empty() {
        return Ok(LayerOutcome::skipped(SkipReason::EmptyText));
    }

    let placement = &settings.placement;
    let budget = canvas_size(canvas).percent(placement.size_percent);
    let angle = settings.rotation as f64;

    let font_size = max_font_size(
        &settings.content,
        angle,
        &settings.font,
        budget,
        |text, font, size| backend.measure_text(text, Path::new(font), size),
    )?;
    if font_size <= 1 {
        debug!(%budget, "text does not fit the size budget");
        return Ok(LayerOutcome::skipped(SkipReason::BudgetTooSmall));
    }

    let extent = backend.measure_text(&settings.content, Path::new(&settings.font), font_size)?;
    let footprint = rotated_bounds(extent.width, extent.height, angle);
    if footprint.is_empty() {
        return Ok(LayerOutcome::skipped(SkipReason::NoVisibleExtent));
    }
    debug!(font_size, %extent, %footprint, "text layer sized");

    let params = TextParams {
        text: settings.content.clone(),
        font: PathBuf::from(&settings.font),
        font_size,
        color: settings.color,
        alpha: Opacity::new(placement.opacity).alpha(),
        angle,
        footprint,
    };
    let layer = backend.render_text(&params)?;
    let positions = draw_at_anchors(backend, canvas, &layer, &placement.anchors);

    Ok(LayerOutcome::Drawn {
        size: footprint,
        positions,
        font_size: Some(font_size),
        rotation_fallback: false,
    })
}

/// Rotate (optionally), scale to fit, and composite the marker bitmap at every anchor.
///
/// The marker is never upscaled. A fitted size with a zero dimension skips the
/// layer rather than drawing a degenerate bitmap.
pub fn place_image_watermark(
    backend: &impl RenderBackend,
    canvas: &mut RgbaImage,
    watermark: &RgbaImage,
    settings: &ImageLayerSettings,
) -> Result<LayerOutcome> {
    let angle = settings.rotation.rem_euclid(360);
    let mut rotation_fallback = false;

    let source: Cow<'_, RgbaImage> = if angle != 0 {
        match rotate_image(backend, watermark, angle as f64) {
            Some(rotated) => Cow::Owned(rotated),
            None => {
                rotation_fallback = true;
                Cow::Borrowed(watermark)
            }
        }
    } else {
        Cow::Borrowed(watermark)
    };

    let placement = &settings.placement;
    let budget = canvas_size(canvas).percent(placement.size_percent);
    let natural = Size::new(source.width(), source.height());
    let fitted = fit_to_bounds(budget, natural);
    if fitted.is_empty() {
        debug!(%budget, %natural, "marker fits to zero size");
        return Ok(LayerOutcome::skipped(SkipReason::ZeroFittedSize));
    }
    debug!(%natural, %fitted, "marker layer sized");

    let scaled = backend.scale(
        &source,
        &ScaleParams {
            width: fitted.width,
            height: fitted.height,
            opacity: Opacity::new(placement.opacity),
        },
    )?;
    drop(source);

    let positions = draw_at_anchors(backend, canvas, &scaled, &placement.anchors);

    Ok(LayerOutcome::Drawn {
        size: fitted,
        positions,
        font_size: None,
        rotation_fallback,
    })
}
