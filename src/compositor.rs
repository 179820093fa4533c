//! The watermark compositor: one source image in, one watermarked image out.
//!
//! A [`WatermarkCompositor`] owns a [`RenderBackend`] and a reference to the
//! marker bitmap. The bitmap is decoded lazily on the first apply that needs
//! it and cached for the compositor's lifetime, so a batch of images pays for
//! one decode. A marker that cannot be decoded is cached as absent and the
//! image layer is skipped from then on.
//!
//! ## Apply order
//!
//! ```text
//! validate settings + source size
//!   → below threshold?  return source unchanged
//!   → copy to RGBA canvas, release source
//!   → text layer  (if enabled)
//!   → image layer (if enabled and the marker is available)
//!   → canvas
//! ```
//!
//! Every fallible step runs before anything is returned: a failure yields an
//! error, never a partially watermarked image.

use crate::config::WatermarkSettings;
use crate::imaging::operations::{place_image_watermark, place_text_watermark};
use crate::imaging::{BackendError, LayerOutcome, RenderBackend, SkipReason};
use crate::types::Size;
use image::{DynamicImage, GenericImageView, RgbaImage};
use serde::Serialize;
use std::cell::OnceCell;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Summary of a single apply, one entry per layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub source: Size,
    /// True when the source was returned untouched because it was below the
    /// size thresholds.
    pub passthrough: bool,
    pub text: LayerOutcome,
    pub image: LayerOutcome,
}

pub struct WatermarkCompositor<B: RenderBackend> {
    backend: B,
    watermark_path: Option<PathBuf>,
    watermark: OnceCell<Option<RgbaImage>>,
}

impl<B: RenderBackend> WatermarkCompositor<B> {
    /// Create a compositor whose marker bitmap is read from `watermark_path`
    /// on first use. `None` means there is no marker; the image layer is
    /// always skipped.
    pub fn new(backend: B, watermark_path: Option<PathBuf>) -> Self {
        Self {
            backend,
            watermark_path,
            watermark: OnceCell::new(),
        }
    }

    /// Create a compositor with an already decoded marker bitmap.
    pub fn with_watermark_image(backend: B, watermark: RgbaImage) -> Self {
        Self {
            backend,
            watermark_path: None,
            watermark: OnceCell::from(Some(watermark)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn watermark(&self) -> Option<&RgbaImage> {
        self.watermark
            .get_or_init(|| {
                let path = self.watermark_path.as_deref()?;
                match self.backend.load(path) {
                    Ok(image) if image.width() > 0 && image.height() > 0 => {
                        debug!(
                            path = %path.display(),
                            size = %Size::new(image.width(), image.height()),
                            "marker loaded"
                        );
                        Some(image)
                    }
                    Ok(_) => {
                        warn!(path = %path.display(), "marker image is empty, image layer disabled");
                        None
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "marker image unavailable, image layer disabled"
                        );
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Watermark `source` according to `settings`.
    ///
    /// The result has the source's dimensions. Sources below both size
    /// thresholds are returned as-is.
    pub fn apply(
        &self,
        source: DynamicImage,
        settings: &WatermarkSettings,
    ) -> Result<DynamicImage, WatermarkError> {
        self.apply_with_report(source, settings)
            .map(|(image, _)| image)
    }

    /// Like [`apply`](Self::apply), also returning what happened to each layer.
    pub fn apply_with_report(
        &self,
        source: DynamicImage,
        settings: &WatermarkSettings,
    ) -> Result<(DynamicImage, Report), WatermarkError> {
        settings
            .validate()
            .map_err(|e| WatermarkError::InvalidConfiguration(e.to_string()))?;

        let (width, height) = source.dimensions();
        let size = Size::new(width, height);
        if size.is_empty() {
            return Err(WatermarkError::InvalidConfiguration(format!(
                "source image has zero size ({size})"
            )));
        }

        if !settings.should_watermark(width, height) {
            info!(%size, "below size threshold, image left unchanged");
            let report = Report {
                source: size,
                passthrough: true,
                text: LayerOutcome::skipped(SkipReason::BelowThreshold),
                image: LayerOutcome::skipped(SkipReason::BelowThreshold),
            };
            return Ok((source, report));
        }

        let mut canvas = source.to_rgba8();
        drop(source);

        let text = if settings.text.enabled {
            place_text_watermark(&self.backend, &mut canvas, &settings.text)?
        } else {
            LayerOutcome::skipped(SkipReason::Disabled)
        };
        if let LayerOutcome::Skipped { reason } = &text {
            debug!(?reason, "text layer skipped");
        }

        let image = if !settings.image.enabled {
            LayerOutcome::skipped(SkipReason::Disabled)
        } else if let Some(watermark) = self.watermark() {
            place_image_watermark(&self.backend, &mut canvas, watermark, &settings.image)?
        } else {
            LayerOutcome::skipped(SkipReason::ImageUnavailable)
        };
        if let LayerOutcome::Skipped { reason } = &image {
            debug!(?reason, "image layer skipped");
        }

        let report = Report {
            source: size,
            passthrough: false,
            text,
            image,
        };
        Ok((DynamicImage::ImageRgba8(canvas), report))
    }
}
