//! Image processing on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Convert** | decode + `PngEncoder` / `JpegEncoder` |
//! | **Crop** | `DynamicImage::crop_imm` after bounds validation |
//! | **Resize** | `resize_exact` (stretch) |
//! | **Thumbnail** | [`fit_within`] + `resize_exact`, never upscaling |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Maps a [`Transform`](crate::request::Transform) onto a backend call

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ErrorKind, ImageBackend};
pub use calculations::{fit_within, validate_crop};
pub use operations::{EncodeSettings, apply_transform};
pub use params::{
    ConvertParams, CropBox, CropParams, OutputFormat, Quality, ResampleFilter, ResizeParams,
    ThumbnailParams,
};
pub use rust_backend::RustBackend;
