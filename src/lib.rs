//! # Watermarker
//!
//! Stamps a text watermark and/or a marker image onto photos, sized relative
//! to each photo and placed at one or more of nine anchor positions.
//!
//! # Architecture: Calculations, Backend, Compositor
//!
//! ```text
//! settings + source  →  calculations  →  backend draw calls  →  canvas
//!                       (pure sizes,     (rasterise, rotate,
//!                        angles, offsets) resample, composite)
//! ```
//!
//! Geometry is decided up front by pure functions in [`imaging`]: rotated
//! bounds, fit-to-budget scaling, the largest font that fits, and anchor
//! offsets. The pixel work sits behind the [`imaging::RenderBackend`] trait,
//! so compositor logic is tested against a recording mock without fonts or
//! real bitmaps.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`compositor`] | [`WatermarkCompositor`](compositor::WatermarkCompositor): validation, threshold, layer order, lazy marker cache |
//! | [`config`] | `watermark.toml` loading, override merging, validation, stock config |
//! | [`imaging`] | Geometry calculations, draw parameters, backend trait, pure-Rust backend |
//! | [`types`] | `Size`, `Point`, and the nine `Anchor` positions |
//! | [`output`] | CLI output formatting of an apply report |
//!
//! # Design Decisions
//!
//! ## Size Budgets, Not Pixel Sizes
//!
//! Layers are configured as a percentage of the photo, never in pixels. The
//! same settings work for a 600px thumbnail and a 6000px original, and a
//! batch of mixed sizes gets visually consistent marks.
//!
//! ## Render Once, Draw Many
//!
//! Each layer is rasterised exactly once per apply, then composited at every
//! configured anchor. Repeating an anchor draws twice; nothing deduplicates.
//!
//! ## Skips Are Not Errors
//!
//! Empty text, a marker that fails to decode, or a budget too small to hold
//! anything skip the layer and are logged. Only caller mistakes (bad
//! percentages, opacities, anchors, or a zero-sized photo) and unreadable
//! fonts are errors, and an error never comes with a half-drawn image.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, glyph rasterisation, rotation, and resampling use `image`,
//! `ab_glyph`, and `imageproc`. No system graphics libraries, no fontconfig:
//! fonts are loaded from explicit file paths.

pub mod compositor;
pub mod config;
pub mod imaging;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
