//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader` with content-sniffed format |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize / thumbnail | `DynamicImage::resize_exact` with the configured filter |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha flattened to RGB) |
//!
//! Every output is encoded fully in memory, written to a hidden `.partial`
//! sibling and renamed into place, so a failed transform never leaves a
//! truncated file behind.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{fit_within, validate_crop};
use super::params::{
    ConvertParams, CropParams, OutputFormat, Quality, ResizeParams, ThumbnailParams,
};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};

/// Image backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<fs::File>>, BackendError> {
    // Sniff the format from content so a PNG named `.jpg` still decodes.
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?
        .decode()
        .map_err(|e| BackendError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn dimensions_of(img: &DynamicImage) -> Dimensions {
    Dimensions {
        width: img.width(),
        height: img.height(),
    }
}

/// Encode an image into memory in the format implied by `path`'s extension.
fn encode_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let encode_err = |reason: String| BackendError::Encode {
        path: path.to_path_buf(),
        reason,
    };

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let format = OutputFormat::from_extension(ext)
        .ok_or_else(|| encode_err(format!("unsupported output format: {ext:?}")))?;

    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => img
            .write_with_encoder(PngEncoder::new(&mut buf))
            .map_err(|e| encode_err(e.to_string()))?,
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel and only 8-bit samples
            let flattened = match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => None,
                other => Some(DynamicImage::ImageRgb8(other.to_rgb8())),
            };
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
            flattened
                .as_ref()
                .unwrap_or(img)
                .write_with_encoder(encoder)
                .map_err(|e| encode_err(e.to_string()))?
        }
    }
    Ok(buf)
}

/// Hidden sibling used while an output is being written.
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

/// Write bytes to `path` via a `.partial` file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let partial = partial_path(path);
    let result = fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(BackendError::Io(e));
    }
    Ok(())
}

/// Encode and save, returning the dimensions written.
fn save_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<Dimensions, BackendError> {
    let bytes = encode_image(img, path, quality)?;
    write_atomic(path, &bytes)?;
    Ok(dimensions_of(img))
}

impl ImageBackend for RustBackend {
    fn convert(&self, params: &ConvertParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        save_image(&img, &params.output, params.quality)
    }

    fn crop(&self, params: &CropParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let region =
            validate_crop(params.region, dimensions_of(&img)).map_err(BackendError::InvalidRegion)?;
        let cropped = img.crop_imm(region.left, region.top, region.width(), region.height());
        save_image(&cropped, &params.output, params.quality)
    }

    fn resize(&self, params: &ResizeParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, params.filter.to_filter_type());
        save_image(&resized, &params.output, params.quality)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let source = dimensions_of(&img);
        let target = fit_within(
            source,
            Dimensions {
                width: params.max_width,
                height: params.max_height,
            },
        );

        if target == source {
            return save_image(&img, &params.output, params.quality);
        }
        let scaled = img.resize_exact(target.width, target.height, params.filter.to_filter_type());
        save_image(&scaled, &params.output, params.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::ErrorKind;
    use crate::imaging::params::{CropBox, ResampleFilter};
    use image::{ImageEncoder, RgbImage, RgbaImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        })
    }

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = gradient(width, height);
        let file = fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn create_test_png(path: &Path, width: u32, height: u32) {
        gradient(width, height).save(path).unwrap();
    }

    fn decode(path: &Path) -> DynamicImage {
        image::open(path).unwrap()
    }

    fn no_partials(dir: &Path) -> bool {
        fs::read_dir(dir).unwrap().all(|e| {
            !e.unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with(".partial")
        })
    }

    #[test]
    fn missing_source_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = RustBackend::new()
            .convert(&ConvertParams {
                source: tmp.path().join("missing.jpg"),
                output: tmp.path().join("missing.png"),
                quality: Quality::default(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn convert_jpeg_to_png_preserves_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        let output = tmp.path().join("a.png");
        create_test_jpeg(&source, 100, 100);

        let dims = RustBackend::new()
            .convert(&ConvertParams {
                source,
                output: output.clone(),
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(dims, Dimensions { width: 100, height: 100 });
        let written = decode(&output);
        assert_eq!((written.width(), written.height()), (100, 100));
        assert_eq!(
            ImageReader::open(&output)
                .unwrap()
                .with_guessed_format()
                .unwrap()
                .format(),
            Some(image::ImageFormat::Png)
        );
    }

    #[test]
    fn convert_png_roundtrip_is_lossless() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        let output = tmp.path().join("out.png");
        create_test_png(&source, 64, 48);

        RustBackend::new()
            .convert(&ConvertParams {
                source,
                output: output.clone(),
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(decode(&output).to_rgb8(), gradient(64, 48));
    }

    #[test]
    fn convert_rgba_png_to_jpeg_flattens_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("alpha.png");
        let output = tmp.path().join("alpha.jpg");
        RgbaImage::from_pixel(40, 30, image::Rgba([200, 10, 10, 100]))
            .save(&source)
            .unwrap();

        let dims = RustBackend::new()
            .convert(&ConvertParams {
                source,
                output: output.clone(),
                quality: Quality::new(90),
            })
            .unwrap();

        assert_eq!(dims, Dimensions { width: 40, height: 30 });
        let written = decode(&output);
        assert_eq!((written.width(), written.height()), (40, 30));
    }

    #[test]
    fn crop_matches_source_region() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        let output = tmp.path().join("crop.png");
        create_test_png(&source, 100, 80);

        let dims = RustBackend::new()
            .crop(&CropParams {
                source,
                output: output.clone(),
                region: CropBox {
                    left: 10,
                    top: 20,
                    right: 60,
                    bottom: 50,
                },
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(dims, Dimensions { width: 50, height: 30 });
        let cropped = decode(&output).to_rgb8();
        let original = gradient(100, 80);
        for (x, y, pixel) in cropped.enumerate_pixels() {
            assert_eq!(pixel, original.get_pixel(x + 10, y + 20));
        }
    }

    #[test]
    fn crop_out_of_bounds_is_invalid_region_and_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        let output = tmp.path().join("out.png");
        create_test_png(&source, 50, 50);

        let err = RustBackend::new()
            .crop(&CropParams {
                source,
                output: output.clone(),
                region: CropBox {
                    left: 0,
                    top: 0,
                    right: 51,
                    bottom: 10,
                },
                quality: Quality::default(),
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRegion);
        assert!(!output.exists());
    }

    #[test]
    fn resize_stretches_to_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.jpg");
        let output = tmp.path().join("out.jpg");
        create_test_jpeg(&source, 400, 300);

        RustBackend::new()
            .resize(&ResizeParams {
                source,
                output: output.clone(),
                width: 50,
                height: 120,
                filter: ResampleFilter::Triangle,
                quality: Quality::default(),
            })
            .unwrap();

        let written = decode(&output);
        assert_eq!((written.width(), written.height()), (50, 120));
    }

    #[test]
    fn thumbnail_fits_bounds_and_keeps_aspect() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.jpg");
        let output = tmp.path().join("thumb.jpg");
        create_test_jpeg(&source, 800, 600);

        let dims = RustBackend::new()
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                max_width: 200,
                max_height: 200,
                filter: ResampleFilter::Lanczos3,
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(dims, Dimensions { width: 200, height: 150 });
        let written = decode(&output);
        assert_eq!((written.width(), written.height()), (200, 150));
    }

    #[test]
    fn thumbnail_never_upscales() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("small.png");
        let output = tmp.path().join("small-out.png");
        create_test_png(&source, 30, 20);

        RustBackend::new()
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                max_width: 300,
                max_height: 300,
                filter: ResampleFilter::Lanczos3,
                quality: Quality::default(),
            })
            .unwrap();

        let written = decode(&output);
        assert_eq!((written.width(), written.height()), (30, 20));
    }

    #[test]
    fn corrupt_source_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("c.jpg");
        fs::write(&source, b"definitely not a jpeg").unwrap();

        let err = RustBackend::new()
            .convert(&ConvertParams {
                source,
                output: tmp.path().join("c.png"),
                quality: Quality::default(),
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!tmp.path().join("c.png").exists());
    }

    #[test]
    fn unsupported_output_extension_is_encode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        create_test_png(&source, 10, 10);

        let err = RustBackend::new()
            .convert(&ConvertParams {
                source,
                output: tmp.path().join("out.bmp"),
                quality: Quality::default(),
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Encode);
        assert!(no_partials(tmp.path()));
    }

    #[test]
    fn failed_write_leaves_no_partial_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        // The output path is an existing directory, so the rename fails
        let output = tmp.path().join("taken.png");
        fs::create_dir(&output).unwrap();
        fs::write(output.join("keep"), b"x").unwrap();

        let err = write_atomic(&output, b"bytes").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(no_partials(tmp.path()));
    }

    #[test]
    fn partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/out/a.png")),
            PathBuf::from("/out/.a.png.partial")
        );
    }
}
