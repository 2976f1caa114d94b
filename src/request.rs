//! Typed transform requests and the menu-to-request mapping.
//!
//! A [`TransformRequest`] is built once per batch, validated on construction,
//! and handed to the [`engine`](crate::engine). The interactive menu never
//! builds one directly: it collects raw text and calls [`build_request`], a
//! pure function, so every validation rule is unit-testable without a
//! terminal.
//!
//! ```text
//! (MenuChoice, source, dest, ["10", "10", "90", "90"])
//!     └─ build_request ─→ TransformRequest { Crop((10, 10, 90, 90)) }
//! ```

use crate::imaging::{CropBox, OutputFormat};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rejected user input. Printed to the user as `InvalidParameters`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid choice {0:?}: enter a number from 1 to 6")]
    InvalidChoice(String),
    #[error("Invalid {name}: {value:?} is not a non-negative whole number")]
    NotANumber { name: &'static str, value: String },
    #[error("Missing value for {0}")]
    MissingParameter(&'static str),
    #[error("Missing {0} directory")]
    MissingPath(&'static str),
    #[error("Invalid parameters: {0}")]
    OutOfRange(String),
}

/// The five batch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    ToPng,
    ToJpg,
    Crop,
    Resize,
    Thumbnail,
}

impl TransformKind {
    /// Past-tense status written after each processed file.
    pub fn status_verb(self) -> &'static str {
        match self {
            Self::ToPng => "converted to png",
            Self::ToJpg => "converted to jpg",
            Self::Crop => "cropped",
            Self::Resize => "resized",
            Self::Thumbnail => "thumbnailed",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ToPng => "to-png",
            Self::ToJpg => "to-jpg",
            Self::Crop => "crop",
            Self::Resize => "resize",
            Self::Thumbnail => "thumbnail",
        })
    }
}

/// A transform together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Convert(OutputFormat),
    Crop(CropBox),
    Resize { width: u32, height: u32 },
    Thumbnail { max_width: u32, max_height: u32 },
}

impl Transform {
    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Convert(OutputFormat::Png) => TransformKind::ToPng,
            Self::Convert(OutputFormat::Jpeg) => TransformKind::ToJpg,
            Self::Crop(_) => TransformKind::Crop,
            Self::Resize { .. } => TransformKind::Resize,
            Self::Thumbnail { .. } => TransformKind::Thumbnail,
        }
    }

    /// Reject geometry that can never produce an image.
    ///
    /// Crop boxes are only checked for shape here; whether they fit inside a
    /// given image is checked per file.
    pub fn validate(&self) -> Result<(), RequestError> {
        match *self {
            Self::Convert(_) => Ok(()),
            Self::Crop(region) if region.is_empty() => Err(RequestError::OutOfRange(format!(
                "crop box {region} must have right > left and bottom > top"
            ))),
            Self::Crop(_) => Ok(()),
            Self::Resize { width, height } if width == 0 || height == 0 => Err(
                RequestError::OutOfRange(format!("resize to {width}x{height} has no area")),
            ),
            Self::Thumbnail {
                max_width,
                max_height,
            } if max_width == 0 || max_height == 0 => Err(RequestError::OutOfRange(format!(
                "thumbnail bounds {max_width}x{max_height} have no area"
            ))),
            Self::Resize { .. } | Self::Thumbnail { .. } => Ok(()),
        }
    }
}

/// One batch: where to read, where to write, and what to do to each file.
///
/// Immutable once constructed; construction validates the transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    source_dir: PathBuf,
    dest_dir: PathBuf,
    transform: Transform,
}

impl TransformRequest {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
        transform: Transform,
    ) -> Result<Self, RequestError> {
        let source_dir = source_dir.into();
        let dest_dir = dest_dir.into();
        if source_dir.as_os_str().is_empty() {
            return Err(RequestError::MissingPath("source"));
        }
        if dest_dir.as_os_str().is_empty() {
            return Err(RequestError::MissingPath("destination"));
        }
        transform.validate()?;
        Ok(Self {
            source_dir,
            dest_dir,
            transform,
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn kind(&self) -> TransformKind {
        self.transform.kind()
    }
}

// ============================================================================
// Menu mapping
// ============================================================================

/// Numbered entries of the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ToPng = 1,
    ToJpg = 2,
    Crop = 3,
    Resize = 4,
    Thumbnail = 5,
    Exit = 6,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 6] = [
        Self::ToPng,
        Self::ToJpg,
        Self::Crop,
        Self::Resize,
        Self::Thumbnail,
        Self::Exit,
    ];

    /// Parse the text typed at the menu prompt (`"1"` through `"6"`).
    pub fn parse(input: &str) -> Result<Self, RequestError> {
        let trimmed = input.trim();
        trimmed
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| RequestError::InvalidChoice(trimmed.to_string()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ToPng => "Convert JPG to PNG",
            Self::ToJpg => "Convert PNG to JPG",
            Self::Crop => "Crop images",
            Self::Resize => "Resize images",
            Self::Thumbnail => "Thumbnail images",
            Self::Exit => "Exit",
        }
    }

    /// Numeric values to ask for, in the order [`build_request`] expects them.
    pub fn parameter_prompts(self) -> &'static [&'static str] {
        match self {
            Self::Crop => &[
                "left coordinate",
                "top coordinate",
                "right coordinate",
                "bottom coordinate",
            ],
            Self::Resize => &["width", "height"],
            Self::Thumbnail => &["max width", "max height"],
            Self::ToPng | Self::ToJpg | Self::Exit => &[],
        }
    }
}

fn parse_number(name: &'static str, raw: Option<&str>) -> Result<u32, RequestError> {
    let raw = raw.ok_or(RequestError::MissingParameter(name))?.trim();
    if raw.is_empty() {
        return Err(RequestError::MissingParameter(name));
    }
    raw.parse::<u32>().map_err(|_| RequestError::NotANumber {
        name,
        value: raw.to_string(),
    })
}

/// Turn a menu choice and raw text answers into a validated request.
///
/// Returns `Ok(None)` for [`MenuChoice::Exit`]. `values` are the answers to
/// [`MenuChoice::parameter_prompts`], in order.
pub fn build_request<S: AsRef<str>>(
    choice: MenuChoice,
    source: &str,
    dest: &str,
    values: &[S],
) -> Result<Option<TransformRequest>, RequestError> {
    let prompts = choice.parameter_prompts();
    let mut numbers = Vec::with_capacity(prompts.len());
    for (i, name) in prompts.iter().enumerate() {
        numbers.push(parse_number(name, values.get(i).map(AsRef::as_ref))?);
    }

    let transform = match choice {
        MenuChoice::Exit => return Ok(None),
        MenuChoice::ToPng => Transform::Convert(OutputFormat::Png),
        MenuChoice::ToJpg => Transform::Convert(OutputFormat::Jpeg),
        MenuChoice::Crop => Transform::Crop(CropBox {
            left: numbers[0],
            top: numbers[1],
            right: numbers[2],
            bottom: numbers[3],
        }),
        MenuChoice::Resize => Transform::Resize {
            width: numbers[0],
            height: numbers[1],
        },
        MenuChoice::Thumbnail => Transform::Thumbnail {
            max_width: numbers[0],
            max_height: numbers[1],
        },
    };

    TransformRequest::new(source.trim(), dest.trim(), transform).map(Some)
}
