//! Collage encoding and output path resolution

use clap::ValueEnum;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ColorType, ImageEncoder, RgbImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Error type for output operations
#[derive(Debug)]
pub enum OutputError {
    /// IO error during file operations
    Io(io::Error),
    /// Image encoding error
    Image(image::ImageError),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "IO error: {}", e),
            OutputError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::Image(e) => Some(e),
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Io(e)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(e: image::ImageError) -> Self {
        OutputError::Image(e)
    }
}

/// Encoded file type of the collage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    #[default]
    #[value(name = "jpg")]
    #[serde(rename = "jpg")]
    Jpeg,
    #[value(name = "png")]
    #[serde(rename = "png")]
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Encoder settings for the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub format: OutputFormat,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// PNG compression level, 0-9
    pub png_compression: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { format: OutputFormat::Jpeg, jpeg_quality: 100, png_compression: 9 }
    }
}

/// Resolve the output file name and the format it will be written in.
///
/// | `name` | `format` | Result |
/// |--------|----------|--------|
/// | `collage` | jpg | `collage.jpg`, JPEG |
/// | `art.PNG` | jpg | `art.PNG`, PNG |
/// | `cover.jpg` | png | `cover.jpg`, JPEG |
/// | `my.collage` | png | `my.collage.png`, PNG |
///
/// An explicit `.png` or `.jpg` extension wins over `format`.
pub fn resolve_output_path(name: &str, format: OutputFormat) -> (PathBuf, OutputFormat) {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        (PathBuf::from(name), OutputFormat::Png)
    } else if lower.ends_with(".jpg") {
        (PathBuf::from(name), OutputFormat::Jpeg)
    } else {
        (PathBuf::from(format!("{}.{}", name, format.extension())), format)
    }
}

/// Map a 0-9 compression level onto the PNG encoder's presets.
fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encode the collage to `path`.
///
/// # Arguments
///
/// * `image` - The composed canvas
/// * `path` - The output file path; parent directories are created
/// * `options` - Format and quality settings
pub fn save_collage(image: &RgbImage, path: &Path, options: &EncodeOptions) -> Result<(), OutputError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    match options.format {
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut writer, options.jpeg_quality).encode_image(image)?;
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut writer,
                png_compression(options.png_compression),
                PngFilter::Adaptive,
            );
            encoder.write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_appends_extension() {
        assert_eq!(
            resolve_output_path("collage", OutputFormat::Jpeg),
            (PathBuf::from("collage.jpg"), OutputFormat::Jpeg)
        );
        assert_eq!(
            resolve_output_path("my.collage", OutputFormat::Png),
            (PathBuf::from("my.collage.png"), OutputFormat::Png)
        );
    }

    #[test]
    fn test_resolve_keeps_explicit_extension() {
        assert_eq!(
            resolve_output_path("art.PNG", OutputFormat::Jpeg),
            (PathBuf::from("art.PNG"), OutputFormat::Png)
        );
        assert_eq!(
            resolve_output_path("out/cover.jpg", OutputFormat::Png),
            (PathBuf::from("out/cover.jpg"), OutputFormat::Jpeg)
        );
    }

    #[test]
    fn test_png_compression_levels() {
        assert!(matches!(png_compression(0), CompressionType::Fast));
        assert!(matches!(png_compression(5), CompressionType::Default));
        assert!(matches!(png_compression(9), CompressionType::Best));
    }

    #[test]
    fn test_save_png_is_lossless() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("collage.png");
        let mut image = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        image.put_pixel(2, 1, Rgb([250, 0, 7]));

        let options = EncodeOptions { format: OutputFormat::Png, ..Default::default() };
        save_collage(&image, &path, &options).unwrap();

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_save_jpeg() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("collage.jpg");
        let image = RgbImage::from_pixel(16, 8, Rgb([200, 40, 40]));

        save_collage(&image, &path, &EncodeOptions { jpeg_quality: 50, ..Default::default() }).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 16);
    }
}
