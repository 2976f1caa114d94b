//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: convert, crop, resize, and thumbnail. Each operation reads one
//! source file, writes one output file, and returns the dimensions of what it
//! wrote.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{ConvertParams, CropParams, ResizeParams, ThumbnailParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("Failed to encode {}: {reason}", .path.display())]
    Encode { path: PathBuf, reason: String },
    #[error("Invalid crop region: {0}")]
    InvalidRegion(String),
}

impl BackendError {
    /// Coarse classification used in per-file reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::InvalidRegion(_) => ErrorKind::InvalidRegion,
        }
    }
}

/// Per-file failure category, printed as e.g. `c.jpg: DecodeError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "IOError")]
    Io,
    #[serde(rename = "DecodeError")]
    Decode,
    #[serde(rename = "EncodeError")]
    Encode,
    #[serde(rename = "InvalidRegion")]
    InvalidRegion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Io => "IOError",
            Self::Decode => "DecodeError",
            Self::Encode => "EncodeError",
            Self::InvalidRegion => "InvalidRegion",
        })
    }
}

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by rayon workers.
pub trait ImageBackend: Sync {
    /// Re-encode the source in the format implied by the output extension.
    fn convert(&self, params: &ConvertParams) -> Result<Dimensions, BackendError>;

    /// Cut `params.region` out of the source.
    fn crop(&self, params: &CropParams) -> Result<Dimensions, BackendError>;

    /// Stretch to exact dimensions.
    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError>;

    /// Scale down to fit the bounding box, keeping aspect ratio.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError>;
}
