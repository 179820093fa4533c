//! Pure calculation functions for watermark geometry.
//!
//! All functions here are pure and testable without any I/O or images:
//! rotated footprints, aspect-preserving fits, the font-size search, and
//! anchor placement.

use crate::types::{Anchor, Point, Size};

/// Smallest font size the search starts from.
pub const MIN_FONT_SIZE: u32 = 2;

/// Largest size the font-size search tries for `budget`.
///
/// A line of text at `n` px is more than `n / 2` px tall in any usable font,
/// and rotation cannot shrink the longer edge of its footprint below that,
/// so no size above twice the budget's longer edge can fit. Real fonts stop
/// the search well before the ceiling; it only ends the walk for a
/// measurement function that reports a constant extent.
pub fn font_size_ceiling(budget: Size) -> u32 {
    budget
        .width
        .max(budget.height)
        .saturating_mul(2)
        .max(MIN_FONT_SIZE)
}

/// Bounding box of a `width × height` rectangle rotated about its centre.
///
/// The angle is in degrees, clockwise in image coordinates, and normalised
/// modulo 360 first. Dimensions are truncated toward zero. A rectangle with a
/// zero dimension has no footprint and yields [`Size::ZERO`].
///
/// # Examples
/// ```
/// # use watermarker::imaging::rotated_bounds;
/// # use watermarker::types::Size;
/// assert_eq!(rotated_bounds(200, 100, 0.0), Size::new(200, 100));
/// assert_eq!(rotated_bounds(200, 100, 90.0), Size::new(100, 200));
/// ```
pub fn rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> Size {
    if width == 0 || height == 0 {
        return Size::ZERO;
    }

    let radians = angle_degrees.rem_euclid(360.0).to_radians();
    let (sin, cos) = radians.sin_cos();
    let w = width as f64;
    let h = height as f64;

    let new_w = (w * cos - h * sin).abs().max((w * cos + h * sin).abs());
    let new_h = (w * sin - h * cos).abs().max((w * sin + h * cos).abs());

    Size::new(new_w as u32, new_h as u32)
}

/// Largest aspect-preserving size of `natural` that fits inside `bounds`.
///
/// Never upscales: content that already fits strictly inside the bounds is
/// returned unchanged. A zero-sized bound returns [`Size::ZERO`], which
/// callers treat as "do not draw".
///
/// # Examples
/// ```
/// # use watermarker::imaging::fit_to_bounds;
/// # use watermarker::types::Size;
/// // 400x100 into 200x100 → halve both edges
/// assert_eq!(fit_to_bounds(Size::new(200, 100), Size::new(400, 100)), Size::new(200, 50));
/// ```
pub fn fit_to_bounds(bounds: Size, natural: Size) -> Size {
    if natural.width < bounds.width && natural.height < bounds.height {
        return natural;
    }

    if bounds.is_empty() {
        return Size::ZERO;
    }

    let scale_w = natural.width as f64 / bounds.width as f64;
    let scale_h = natural.height as f64 / bounds.height as f64;
    let scale = scale_w.max(scale_h);

    Size::new(
        (natural.width as f64 / scale) as u32,
        (natural.height as f64 / scale) as u32,
    )
}

/// Largest font size whose rotated text footprint still fits inside `budget`.
///
/// Walks sizes upward from [`MIN_FONT_SIZE`], measuring the unrotated text with
/// `measure(text, font_family, size)` and rotating the result with
/// [`rotated_bounds`]. Returns one less than the first size that overflows the
/// budget on either axis. A linear walk is used rather than a bisection
/// because measurement is not guaranteed to be strictly monotonic at tiny
/// sizes.
///
/// A degenerate budget returns `1`; callers treat anything `<= 1` as
/// "watermark infeasible". If nothing overflows up to
/// [`font_size_ceiling`], the ceiling itself is returned.
pub fn max_font_size<E, F>(
    text: &str,
    angle_degrees: f64,
    font_family: &str,
    budget: Size,
    mut measure: F,
) -> Result<u32, E>
where
    F: FnMut(&str, &str, u32) -> Result<Size, E>,
{
    let ceiling = font_size_ceiling(budget);
    for size in MIN_FONT_SIZE..=ceiling {
        let extent = measure(text, font_family, size)?;
        let footprint = rotated_bounds(extent.width, extent.height, angle_degrees);
        if footprint.exceeds(budget) {
            return Ok(size - 1);
        }
    }
    Ok(ceiling)
}

/// Top-left offset that places `content` at `anchor` on a `canvas`.
///
/// No clamping: content larger than the canvas produces negative offsets,
/// and the draw stage clips.
pub fn resolve_position(anchor: Anchor, canvas: Size, content: Size) -> Point {
    let free_w = canvas.width as i64 - content.width as i64;
    let free_h = canvas.height as i64 - content.height as i64;

    let left = 0;
    let center_x = free_w / 2;
    let right = free_w;
    let top = 0;
    let center_y = free_h / 2;
    let bottom = free_h;

    let (x, y) = match anchor {
        Anchor::TopLeft => (left, top),
        Anchor::TopCenter => (center_x, top),
        Anchor::TopRight => (right, top),
        Anchor::CenterLeft => (left, center_y),
        Anchor::Center => (center_x, center_y),
        Anchor::CenterRight => (right, center_y),
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomCenter => (center_x, bottom),
        Anchor::BottomRight => (right, bottom),
    };

    Point::new(x as i32, y as i32)
}
