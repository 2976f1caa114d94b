//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::CropBox;

/// Calculate the largest size that fits inside `bounds` while keeping the
/// source aspect ratio. Never upscales: a source that already fits is
/// returned unchanged.
///
/// Each edge is rounded to the nearest pixel and is at least 1px.
///
/// # Examples
/// ```
/// # use image_kitchen::imaging::{Dimensions, fit_within};
/// let src = Dimensions { width: 800, height: 600 };
/// let fit = fit_within(src, Dimensions { width: 200, height: 200 });
/// assert_eq!((fit.width, fit.height), (200, 150));
/// ```
pub fn fit_within(source: Dimensions, bounds: Dimensions) -> Dimensions {
    if source.width <= bounds.width && source.height <= bounds.height {
        return source;
    }

    let scale_w = bounds.width as f64 / source.width as f64;
    let scale_h = bounds.height as f64 / source.height as f64;
    let scale = scale_w.min(scale_h);

    let width = ((source.width as f64 * scale).round() as u32).clamp(1, bounds.width.max(1));
    let height = ((source.height as f64 * scale).round() as u32).clamp(1, bounds.height.max(1));
    Dimensions { width, height }
}

/// Check that a crop box has area and lies fully inside an image.
///
/// Returns the box unchanged when valid, or a human-readable reason.
pub fn validate_crop(region: CropBox, image: Dimensions) -> Result<CropBox, String> {
    if region.is_empty() {
        return Err(format!("crop box {region} is empty or inverted"));
    }
    if region.right > image.width || region.bottom > image.height {
        return Err(format!(
            "crop box {region} exceeds image bounds {}x{}",
            image.width, image.height
        ));
    }
    Ok(region)
}
