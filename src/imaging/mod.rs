//! Image compositing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` |
//! | **Text metrics + glyphs** | `ab_glyph` |
//! | **Rotate about centre** | `imageproc` projective warp |
//! | **Resample** | Lanczos3 via `image::imageops::resize` |
//! | **Composite** | Porter-Duff "over", clipped |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for rotated bounds, fitting, font search, placement
//! - **Parameters**: Data structures describing draw operations
//! - **Backend**: [`RenderBackend`] trait + [`RustBackend`]
//! - **Operations**: Per-layer functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, RenderBackend, composite_over};
pub use calculations::{
    MIN_FONT_SIZE, fit_to_bounds, font_size_ceiling, max_font_size, resolve_position,
    rotated_bounds,
};
pub use operations::{LayerOutcome, SkipReason};
pub use params::{Color, ColorParseError, Opacity, ScaleParams, TextParams};
pub use rust_backend::{RustBackend, load_image, save_image};
