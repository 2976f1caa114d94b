//! High-level image operations.
//!
//! These functions turn a [`Transform`] plus encoding settings into the
//! parameter struct the backend expects, and call it.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{
    ConvertParams, CropParams, Quality, ResampleFilter, ResizeParams, ThumbnailParams,
};
use crate::request::Transform;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Encoding settings shared by every file in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EncodeSettings {
    pub quality: Quality,
    pub filter: ResampleFilter,
}

/// Apply one transform to one file, writing `output`.
pub fn apply_transform(
    backend: &impl ImageBackend,
    transform: &Transform,
    source: &Path,
    output: &Path,
    settings: EncodeSettings,
) -> Result<Dimensions> {
    let source = source.to_path_buf();
    let output = output.to_path_buf();
    let quality = settings.quality;

    match *transform {
        Transform::Convert(_) => backend.convert(&ConvertParams {
            source,
            output,
            quality,
        }),
        Transform::Crop(region) => backend.crop(&CropParams {
            source,
            output,
            region,
            quality,
        }),
        Transform::Resize { width, height } => backend.resize(&ResizeParams {
            source,
            output,
            width,
            height,
            filter: settings.filter,
            quality,
        }),
        Transform::Thumbnail {
            max_width,
            max_height,
        } => backend.thumbnail(&ThumbnailParams {
            source,
            output,
            max_width,
            max_height,
            filter: settings.filter,
            quality,
        }),
    }
}
