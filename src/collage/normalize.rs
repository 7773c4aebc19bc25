//! Tile normalization - square RGB tiles of a fixed size

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

/// Convert a decoded cover to an RGB tile of `tile_size x tile_size`.
///
/// Uses bicubic (Catmull-Rom) resampling. Non-square sources are stretched,
/// matching how covers are treated everywhere else in the collage.
pub fn normalize_tile(image: &DynamicImage, tile_size: u32) -> RgbImage {
    let rgb = image.to_rgb8();
    if rgb.dimensions() == (tile_size, tile_size) {
        return rgb;
    }
    image::imageops::resize(&rgb, tile_size, tile_size, FilterType::CatmullRom)
}
