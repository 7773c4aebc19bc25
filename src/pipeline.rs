//! Tile acquisition and collage assembly
//!
//! A [`CollageRun`] ties the pieces together for one invocation:
//!
//! 1. [`CollageRun::refresh_reason`] asks the freshness check whether the
//!    tiles on disk can be reused
//! 2. [`CollageRun::acquire`] pages through the ranking, downloads covers in
//!    rank order and records the acquisition
//! 3. [`CollageRun::compose`] loads the tiles and builds the canvas
//!
//! Everything runs sequentially; all downloads finish before composition.

use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{refresh_reason, CacheMetadata, FreshnessRequest, RefreshReason};
use crate::collage::{compose_with_progress, ComposeError};
use crate::config::CollageOptions;
use crate::progress::{ProgressEvent, ProgressReporter, Stage};
use crate::provider::{Album, HttpClient, LastFmClient, ProviderError, TopAlbumsQuery};
use crate::store::{StoreError, TileStore};

/// Upper bound the provider accepts for one page.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Errors from acquiring tiles or composing the collage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    /// The ranking is shorter than the grid
    #[error("Not enough albums were fetched from the server ({fetched} of {required}). You may need to pick a larger date range")]
    NotEnoughAlbums { fetched: usize, required: usize },
    /// Too many albums had no usable cover
    #[error("Only {downloaded} of {required} album covers could be downloaded. You may need to pick a larger date range")]
    NotEnoughCovers { downloaded: usize, required: usize },
}

/// Current time as Unix seconds.
pub fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}

/// Albums requested per page: half again the tiles needed, capped by the
/// provider limit, so a single page usually covers albums without art.
pub fn page_size(tiles_required: usize) -> usize {
    (tiles_required.saturating_mul(3) / 2).clamp(1, MAX_PAGE_SIZE)
}

/// Page through the ranking until enough albums have been requested.
///
/// Stops early when the provider returns an empty page.
pub fn fetch_ranking<C: HttpClient>(
    client: &LastFmClient<C>,
    user: &str,
    options: &CollageOptions,
    progress: &dyn ProgressReporter,
) -> Result<Vec<Album>, PipelineError> {
    let required = options.grid.tiles_required();
    let limit = page_size(required);
    let pages = required.div_ceil(limit);

    progress.report(ProgressEvent::StageStarted { stage: Stage::FetchingAlbums, total: pages });
    let mut albums = Vec::new();
    for page in 1..=pages {
        let query = TopAlbumsQuery { user, period: options.period, limit, page };
        let batch = client.top_albums(&query)?;
        progress.report(ProgressEvent::Step { stage: Stage::FetchingAlbums, current: page, total: pages });
        if batch.is_empty() {
            debug!(page, "ranking exhausted");
            break;
        }
        albums.extend(batch);
    }
    progress.report(ProgressEvent::StageCompleted { stage: Stage::FetchingAlbums });

    info!(albums = albums.len(), required, "fetched album ranking");
    Ok(albums)
}

/// One collage invocation over a tile store.
pub struct CollageRun<'a> {
    options: &'a CollageOptions,
    store: TileStore,
    progress: &'a dyn ProgressReporter,
}

impl<'a> CollageRun<'a> {
    /// Open the tile store named by the options.
    pub fn new(
        options: &'a CollageOptions,
        progress: &'a dyn ProgressReporter,
    ) -> Result<Self, PipelineError> {
        let store = TileStore::open(&options.images_dir)?;
        Ok(Self { options, store, progress })
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Why the stored tiles must be refetched, or `None` to reuse them.
    pub fn refresh_reason(&self, now: u64) -> Result<Option<RefreshReason>, PipelineError> {
        let metadata = self.store.read_metadata()?;
        let request = FreshnessRequest {
            subject_id: &self.options.user,
            period_key: self.options.period.provider_key(),
            tiles_required: self.options.grid.tiles_required(),
        };
        Ok(refresh_reason(self.options.refresh, &request, now, metadata.as_ref()))
    }

    /// Replace the stored tiles with freshly downloaded covers.
    ///
    /// Old tiles are only removed once the ranking is known to be long
    /// enough. Albums without art, or whose cover fails to download or
    /// decode, are skipped. Metadata is written only when every tile was
    /// stored.
    pub fn acquire<C: HttpClient>(
        &self,
        client: &LastFmClient<C>,
        now: u64,
    ) -> Result<CacheMetadata, PipelineError> {
        let required = self.options.grid.tiles_required();
        let albums = fetch_ranking(client, &self.options.user, self.options, self.progress)?;
        if albums.len() < required {
            return Err(PipelineError::NotEnoughAlbums { fetched: albums.len(), required });
        }

        self.store.remove_metadata()?;
        self.store.clear_tiles()?;

        let downloaded = self.download_covers(client, &albums, required)?;
        if downloaded < required {
            return Err(PipelineError::NotEnoughCovers { downloaded, required });
        }

        let metadata = CacheMetadata {
            captured_at: now,
            subject_id: self.options.user.clone(),
            period_key: self.options.period.provider_key().to_string(),
            tile_count: downloaded,
        };
        self.store.write_metadata(&metadata)?;
        Ok(metadata)
    }

    fn download_covers<C: HttpClient>(
        &self,
        client: &LastFmClient<C>,
        albums: &[Album],
        required: usize,
    ) -> Result<usize, PipelineError> {
        self.progress.report(ProgressEvent::StageStarted { stage: Stage::Downloading, total: required });

        let mut stored = 0;
        for album in albums {
            if stored == required {
                break;
            }
            let Some(url) = album.cover_url() else {
                debug!(album = %album.name, "no cover art, skipping");
                continue;
            };

            let bytes = match client.download(url) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(album = %album.name, error = %e, "cover download failed, skipping");
                    self.skipped(album, "could not be downloaded");
                    continue;
                }
            };
            // Bad cover bytes are skipped; a failing disk stops the run
            match self.store.write_tile(stored, &bytes) {
                Ok(_) => {}
                Err(StoreError::Decode { source, .. }) => {
                    warn!(album = %album.name, error = %source, "cover could not be decoded, skipping");
                    self.skipped(album, "could not be decoded");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            stored += 1;
            self.progress.report(ProgressEvent::Step {
                stage: Stage::Downloading,
                current: stored,
                total: required,
            });
        }

        self.progress.report(ProgressEvent::StageCompleted { stage: Stage::Downloading });
        Ok(stored)
    }

    fn skipped(&self, album: &Album, why: &str) {
        self.progress.report(ProgressEvent::Warning {
            message: format!("Skipping the cover of '{}': it {}", album.name, why),
        });
    }

    /// Load the stored tiles and compose the collage.
    pub fn compose(&self) -> Result<RgbImage, PipelineError> {
        let grid = &self.options.grid;
        let tiles = self.store.load_tiles(grid.tiles_required(), grid.tile_size(), self.progress)?;

        self.progress.report(ProgressEvent::StageStarted { stage: Stage::Composing, total: tiles.len() });
        let image =
            compose_with_progress(grid, self.options.canvas, self.options.layout, &tiles, |current, total| {
                self.progress.report(ProgressEvent::Step { stage: Stage::Composing, current, total })
            })?;
        self.progress.report(ProgressEvent::StageCompleted { stage: Stage::Composing });

        info!(
            width = image.width(),
            height = image.height(),
            layout = %self.options.layout,
            "composed collage"
        );
        Ok(image)
    }
}
