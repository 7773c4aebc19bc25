//! Local tile store
//!
//! Downloaded covers live in a single directory as `{rank:05}.jpg`, next to a
//! `meta.json` describing the run that fetched them.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::CacheMetadata;
use crate::collage::normalize_tile;
use crate::progress::{ProgressEvent, ProgressReporter, Stage};

/// File name of the cache metadata inside the store.
pub const METADATA_FILE: &str = "meta.json";

/// Quality used when re-encoding downloaded covers.
const TILE_JPEG_QUALITY: u8 = 100;

/// Error type for tile store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error on a store path
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The store location exists but is not a directory
    #[error("'{}' exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// meta.json could not be parsed or written
    #[error("{}: invalid cache metadata: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Downloaded bytes are not an image the decoder understands
    #[error("{}: cannot decode cover: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// A stored tile could not be read back or encoded
    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Tile listing pattern was invalid
    #[error("Invalid tile pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Fewer tiles on disk than the collage needs
    #[error("Only {found} images are stored but {required} are needed. Try --update-images yes")]
    MissingTiles { required: usize, found: usize },
    /// Stored ranks skip a number, so later tiles would shift into its place
    #[error("The image for rank {missing} is missing from the store. Try --update-images yes")]
    RankGap { missing: usize },
}

/// Encoder failures that are really I/O become [`StoreError::Io`].
fn encode_error(path: &Path, source: image::ImageError) -> StoreError {
    match source {
        image::ImageError::IoError(e) => StoreError::Io { path: path.to_path_buf(), source: e },
        other => StoreError::Image { path: path.to_path_buf(), source: other },
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

/// A tile stored on disk, identified by its popularity rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTile {
    /// 0 = most popular
    pub rank: usize,
    pub path: PathBuf,
    /// Format the cover was downloaded in, before re-encoding to JPEG
    pub source_format: ImageFormat,
}

/// Directory holding the cached tiles and their metadata.
#[derive(Debug, Clone)]
pub struct TileStore {
    dir: PathBuf,
}

impl TileStore {
    /// Open a store, creating its directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if dir.exists() {
            if !dir.is_dir() {
                return Err(StoreError::NotADirectory(dir));
            }
        } else {
            fs::create_dir_all(&dir).map_err(io_error(&dir))?;
            info!(dir = %dir.display(), "created images directory");
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Path of the tile file for a rank.
    pub fn tile_path(&self, rank: usize) -> PathBuf {
        self.dir.join(format!("{:05}.jpg", rank))
    }

    /// Read the metadata of the last acquisition, `None` if there is none.
    pub fn read_metadata(&self) -> Result<Option<CacheMetadata>, StoreError> {
        let path = self.metadata_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Metadata { path, source })
    }

    /// Persist metadata, replacing the previous file via rename.
    pub fn write_metadata(&self, metadata: &CacheMetadata) -> Result<(), StoreError> {
        let path = self.metadata_path();
        let tmp = self.dir.join(format!(".{}.tmp", METADATA_FILE));

        let json = serde_json::to_string(metadata)
            .map_err(|source| StoreError::Metadata { path: path.clone(), source })?;
        fs::write(&tmp, json).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;

        debug!(path = %path.display(), "wrote cache metadata");
        Ok(())
    }

    /// Forget the last acquisition, so a half-replaced store is never reused.
    pub fn remove_metadata(&self) -> Result<(), StoreError> {
        let path = self.metadata_path();
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(StoreError::Io { path, source: e }),
            _ => Ok(()),
        }
    }

    /// List stored tiles ordered by rank.
    pub fn tiles(&self) -> Result<Vec<RankedTile>, StoreError> {
        let pattern = format!("{}/*.jpg", glob::Pattern::escape(&self.dir.to_string_lossy()));

        let mut tiles: Vec<RankedTile> = glob::glob(&pattern)?
            .filter_map(Result::ok)
            .filter_map(|path| {
                let rank = path.file_stem()?.to_str()?.parse().ok()?;
                Some(RankedTile { rank, path, source_format: ImageFormat::Jpeg })
            })
            .collect();
        tiles.sort_by_key(|t| t.rank);
        Ok(tiles)
    }

    /// Remove every stored tile. Metadata is left alone.
    pub fn clear_tiles(&self) -> Result<usize, StoreError> {
        let tiles = self.tiles()?;
        for tile in &tiles {
            match fs::remove_file(&tile.path) {
                Ok(()) => {}
                // Already gone is as good as removed
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io { path: tile.path.clone(), source: e }),
            }
        }
        info!(count = tiles.len(), "removed old images");
        Ok(tiles.len())
    }

    /// Store downloaded cover bytes as the tile for `rank`.
    ///
    /// The format is detected from the content; the image is converted to
    /// RGB and written as a maximum-quality JPEG. Unreadable bytes give
    /// [`StoreError::Decode`]; a failed write gives [`StoreError::Io`].
    pub fn write_tile(&self, rank: usize, bytes: &[u8]) -> Result<RankedTile, StoreError> {
        let path = self.tile_path(rank);
        let decode_error = |source| StoreError::Decode { path: path.clone(), source };

        let source_format = image::guess_format(bytes).map_err(decode_error)?;
        let decoded =
            image::load_from_memory_with_format(bytes, source_format).map_err(decode_error)?;
        let rgb = decoded.to_rgb8();

        let file = File::create(&path).map_err(io_error(&path))?;
        let mut writer = BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, TILE_JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| encode_error(&path, e))?;
        writer.flush().map_err(io_error(&path))?;

        debug!(rank, format = ?source_format, path = %path.display(), "stored tile");
        Ok(RankedTile { rank, path, source_format })
    }

    /// Load the `count` most popular tiles, normalized to `tile_size`.
    pub fn load_tiles(
        &self,
        count: usize,
        tile_size: u32,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<RgbImage>, StoreError> {
        let stored = self.tiles()?;
        if stored.len() < count {
            return Err(StoreError::MissingTiles { required: count, found: stored.len() });
        }
        if let Some(missing) =
            stored.iter().take(count).enumerate().find(|(i, t)| t.rank != *i).map(|(i, _)| i)
        {
            return Err(StoreError::RankGap { missing });
        }

        progress.report(ProgressEvent::StageStarted { stage: Stage::Loading, total: count });
        let mut tiles = Vec::with_capacity(count);
        for (i, tile) in stored.iter().take(count).enumerate() {
            let image = image::open(&tile.path)
                .map_err(|source| StoreError::Image { path: tile.path.clone(), source })?;
            tiles.push(normalize_tile(&image, tile_size));
            progress.report(ProgressEvent::Step { stage: Stage::Loading, current: i + 1, total: count });
        }
        progress.report(ProgressEvent::StageCompleted { stage: Stage::Loading });

        Ok(tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use image::{DynamicImage, Rgb, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([0, 128, 255, 255]),
        ));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn sample_metadata() -> CacheMetadata {
        CacheMetadata {
            captured_at: 1_700_000_000,
            subject_id: "jerboa88".to_string(),
            period_key: "overall".to_string(),
            tile_count: 4,
        }
    }

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("images");
        let store = TileStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir.as_path());
    }

    #[test]
    fn test_open_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("images");
        fs::write(&file, "not a dir").unwrap();
        assert!(matches!(TileStore::open(&file), Err(StoreError::NotADirectory(_))));
    }

    #[test]
    fn test_metadata_absent_then_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        assert_eq!(store.read_metadata().unwrap(), None);

        store.write_metadata(&sample_metadata()).unwrap();
        assert_eq!(store.read_metadata().unwrap(), Some(sample_metadata()));
        assert!(!temp.path().join(".meta.json.tmp").exists());

        store.remove_metadata().unwrap();
        assert_eq!(store.read_metadata().unwrap(), None);
        // Removing twice is fine
        store.remove_metadata().unwrap();
    }

    #[test]
    fn test_malformed_metadata_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(METADATA_FILE), "{\"time\": \"yesterday\"}").unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        assert!(matches!(store.read_metadata(), Err(StoreError::Metadata { .. })));
    }

    #[test]
    fn test_write_tile_reencodes_as_jpeg() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();

        let tile = store.write_tile(7, &png_bytes(6, 6)).unwrap();
        assert_eq!(tile.rank, 7);
        assert_eq!(tile.source_format, ImageFormat::Png);
        assert_eq!(tile.path, temp.path().join("00007.jpg"));

        let written = fs::read(&tile.path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_write_tile_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        assert!(matches!(store.write_tile(0, b"<html>404</html>"), Err(StoreError::Decode { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_tile_full_disk_is_io_error() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        std::os::unix::fs::symlink("/dev/full", store.tile_path(0)).unwrap();

        // Noise keeps the JPEG larger than the write buffer
        let noisy = RgbImage::from_fn(300, 300, |x, y| {
            let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(91)])
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(noisy).write_to(&mut bytes, ImageFormat::Png).unwrap();

        let err = store.write_tile(0, &bytes.into_inner()).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_tiles_sorted_by_rank() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        for rank in [2, 0, 10, 1] {
            store.write_tile(rank, &png_bytes(2, 2)).unwrap();
        }
        fs::write(temp.path().join("notes.jpg"), "ignored").unwrap();

        let ranks: Vec<usize> = store.tiles().unwrap().iter().map(|t| t.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 10]);
    }

    #[test]
    fn test_clear_tiles_keeps_metadata() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        store.write_tile(0, &png_bytes(2, 2)).unwrap();
        store.write_tile(1, &png_bytes(2, 2)).unwrap();
        store.write_metadata(&sample_metadata()).unwrap();

        assert_eq!(store.clear_tiles().unwrap(), 2);
        assert!(store.tiles().unwrap().is_empty());
        assert!(store.read_metadata().unwrap().is_some());
    }

    #[test]
    fn test_load_tiles_normalizes() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        for rank in 0..3 {
            store.write_tile(rank, &png_bytes(20, 12)).unwrap();
        }

        let tiles = store.load_tiles(2, 8, &NullProgress::new()).unwrap();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|t| t.dimensions() == (8, 8)));
        let Rgb([r, _, b]) = *tiles[0].get_pixel(4, 4);
        assert!(r < 16 && b > 240);
    }

    #[test]
    fn test_load_tiles_missing() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        store.write_tile(0, &png_bytes(2, 2)).unwrap();

        let err = store.load_tiles(4, 8, &NullProgress::new()).unwrap_err();
        assert!(matches!(err, StoreError::MissingTiles { required: 4, found: 1 }));
    }

    #[test]
    fn test_load_tiles_rank_gap() {
        let temp = TempDir::new().unwrap();
        let store = TileStore::open(temp.path()).unwrap();
        for rank in [0, 1, 3, 4] {
            store.write_tile(rank, &png_bytes(2, 2)).unwrap();
        }

        let err = store.load_tiles(3, 8, &NullProgress::new()).unwrap_err();
        assert!(matches!(err, StoreError::RankGap { missing: 2 }));
        // Only the ranks actually used have to be contiguous
        assert_eq!(store.load_tiles(2, 8, &NullProgress::new()).unwrap().len(), 2);
    }
}
