//! Eligibility and output naming for directory entries.
//!
//! Each transform accepts a fixed set of extensions, matched
//! case-sensitively: `photo.jpg` is eligible for a crop, `PHOTO.JPG` is not.
//!
//! | Transform | Accepted | Output name |
//! |---|---|---|
//! | to-png | `jpg`, `jpeg` | `<stem>.png` |
//! | to-jpg | `png` | `<stem>.jpg` |
//! | crop / resize / thumbnail | `jpg`, `jpeg`, `png` | unchanged |

use crate::request::{Transform, TransformKind};
use std::ffi::OsString;
use std::path::Path;

const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];
const PNG_EXTENSIONS: &[&str] = &["png"];
const ALL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extensions (without the dot) a transform will pick up.
pub fn accepted_extensions(kind: TransformKind) -> &'static [&'static str] {
    match kind {
        TransformKind::ToPng => JPEG_EXTENSIONS,
        TransformKind::ToJpg => PNG_EXTENSIONS,
        TransformKind::Crop | TransformKind::Resize | TransformKind::Thumbnail => ALL_EXTENSIONS,
    }
}

/// Whether a file name has one of the accepted extensions for `kind`.
///
/// Only the extension has to be UTF-8; the stem may be any OS string.
pub fn is_eligible(file_name: impl AsRef<Path>, kind: TransformKind) -> bool {
    file_name
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| accepted_extensions(kind).contains(&ext))
}

/// Name of the file written for `file_name`.
///
/// Conversions swap the extension; geometric transforms keep the name as is.
pub fn output_file_name(file_name: impl AsRef<Path>, transform: &Transform) -> OsString {
    let file_name = file_name.as_ref();
    match transform {
        Transform::Convert(format) => file_name.with_extension(format.extension()).into_os_string(),
        Transform::Crop(_) | Transform::Resize { .. } | Transform::Thumbnail { .. } => {
            file_name.as_os_str().to_os_string()
        }
    }
}
