//! Tile cache freshness
//!
//! Decides whether the tiles stored by a previous run can be reused for the
//! current request, based on the metadata that run persisted.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Cached tiles older than this many seconds are refetched.
pub const STALE_AFTER_SECS: u64 = 7 * 24 * 60 * 60;

/// Metadata written after every successful tile acquisition.
///
/// Serialized as `{"time", "user", "period", "images_fetched"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Unix seconds when the tiles were fetched
    #[serde(rename = "time")]
    pub captured_at: u64,
    /// Last.fm user the tiles belong to
    #[serde(rename = "user")]
    pub subject_id: String,
    /// Provider period key (e.g. `overall`, `7day`)
    #[serde(rename = "period")]
    pub period_key: String,
    /// Number of tiles stored by that run
    #[serde(rename = "images_fetched")]
    pub tile_count: usize,
}

/// How to treat previously fetched tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Refetch only when the cache does not satisfy the request
    #[default]
    Auto,
    /// Always refetch
    Yes,
    /// Always reuse what is on disk
    No,
}

/// What the current run needs from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessRequest<'a> {
    pub subject_id: &'a str,
    pub period_key: &'a str,
    pub tiles_required: usize,
}

/// Why cached tiles cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshReason {
    /// Refresh forced by [`RefreshMode::Yes`]
    Forced,
    /// No metadata from a previous run
    MissingMetadata,
    /// Cached tiles belong to another user
    SubjectChanged { cached: String },
    /// Cached tiles cover another period
    PeriodChanged { cached: String },
    /// Previous run stored fewer tiles than needed now
    TooFewTiles { cached: usize, required: usize },
    /// Cached tiles reached the staleness age
    Expired { age_secs: u64 },
}

impl std::fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshReason::Forced => write!(f, "refresh requested"),
            RefreshReason::MissingMetadata => write!(f, "no cached tiles"),
            RefreshReason::SubjectChanged { cached } => {
                write!(f, "cached tiles belong to user '{}'", cached)
            }
            RefreshReason::PeriodChanged { cached } => {
                write!(f, "cached tiles cover period '{}'", cached)
            }
            RefreshReason::TooFewTiles { cached, required } => {
                write!(f, "only {} tiles cached, {} required", cached, required)
            }
            RefreshReason::Expired { age_secs } => {
                write!(f, "cached tiles are {} days old", age_secs / 86_400)
            }
        }
    }
}

/// First reason the cache must be refreshed, or `None` if it can be reused.
///
/// [`RefreshMode::Yes`] and [`RefreshMode::No`] short-circuit. In
/// [`RefreshMode::Auto`] the checks run in order: missing metadata, user,
/// period, tile count, age. A `captured_at` later than `now` counts as zero
/// elapsed seconds.
pub fn refresh_reason(
    mode: RefreshMode,
    request: &FreshnessRequest<'_>,
    now: u64,
    metadata: Option<&CacheMetadata>,
) -> Option<RefreshReason> {
    match mode {
        RefreshMode::Yes => return Some(RefreshReason::Forced),
        RefreshMode::No => return None,
        RefreshMode::Auto => {}
    }

    let Some(meta) = metadata else {
        return Some(RefreshReason::MissingMetadata);
    };

    if meta.subject_id != request.subject_id {
        return Some(RefreshReason::SubjectChanged { cached: meta.subject_id.clone() });
    }
    if meta.period_key != request.period_key {
        return Some(RefreshReason::PeriodChanged { cached: meta.period_key.clone() });
    }
    if meta.tile_count < request.tiles_required {
        return Some(RefreshReason::TooFewTiles {
            cached: meta.tile_count,
            required: request.tiles_required,
        });
    }

    let age_secs = now.saturating_sub(meta.captured_at);
    if age_secs >= STALE_AFTER_SECS {
        return Some(RefreshReason::Expired { age_secs });
    }

    None
}

/// Whether the tiles on disk must be refetched.
pub fn needs_refresh(
    mode: RefreshMode,
    request: &FreshnessRequest<'_>,
    now: u64,
    metadata: Option<&CacheMetadata>,
) -> bool {
    refresh_reason(mode, request, now, metadata).is_some()
}
