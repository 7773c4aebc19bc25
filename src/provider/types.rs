//! Provider types

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the ranking provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport failure or unexpected HTTP status
    #[error("HTTP error: {0}")]
    Http(String),
    /// The provider answered with an API error
    #[error("Error while fetching albums: {message} (code {code})")]
    Api { code: i64, message: String },
    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Time range the album ranking is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Period {
    #[default]
    #[serde(rename = "forever")]
    Forever,
    #[serde(rename = "year")]
    Year,
    #[value(name = "6month")]
    #[serde(rename = "6month")]
    SixMonths,
    #[value(name = "3month")]
    #[serde(rename = "3month")]
    ThreeMonths,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "week")]
    Week,
}

impl Period {
    /// Key the provider uses for this period.
    pub fn provider_key(&self) -> &'static str {
        match self {
            Period::Forever => "overall",
            Period::Year => "12month",
            Period::SixMonths => "6month",
            Period::ThreeMonths => "3month",
            Period::Month => "1month",
            Period::Week => "7day",
        }
    }
}

/// One page request against the top-albums ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopAlbumsQuery<'a> {
    pub user: &'a str,
    pub period: Period,
    /// Albums per page
    pub limit: usize,
    /// 1-based page number
    pub page: usize,
}

/// An album in the ranking, as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub artist: Option<Artist>,
    #[serde(default)]
    pub image: Vec<CoverImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Artist {
    pub name: String,
}

/// A cover art URL at one of the provider's fixed sizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoverImage {
    #[serde(default)]
    pub size: String,
    #[serde(rename = "#text", default)]
    pub url: String,
}

impl Album {
    /// URL of the largest cover, `None` if the provider has no art.
    ///
    /// Prefers the `extralarge` rendition and falls back to the last listed.
    pub fn cover_url(&self) -> Option<&str> {
        self.image
            .iter()
            .find(|img| img.size == "extralarge")
            .or_else(|| self.image.last())
            .map(|img| img.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopAlbumsResponse {
    pub topalbums: TopAlbums,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopAlbums {
    // The provider sends a bare object instead of a list for single results
    #[serde(default, deserialize_with = "one_or_many")]
    pub album: Vec<Album>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error: i64,
    #[serde(default)]
    pub message: String,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Album>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Album),
        Many(Vec<Album>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(album) => vec![album],
        OneOrMany::Many(albums) => albums,
    })
}
