//! Last.fm top-albums client

use reqwest::Url;
use tracing::debug;

use super::http::HttpClient;
use super::types::{Album, ApiError, ProviderError, TopAlbumsQuery, TopAlbumsResponse};

/// Base endpoint of the Last.fm web service.
pub const API_ROOT: &str = "http://ws.audioscrobbler.com/2.0/";

/// Client for the `user.gettopalbums` ranking.
pub struct LastFmClient<C: HttpClient> {
    http: C,
    api_key: String,
    api_root: String,
}

impl<C: HttpClient> LastFmClient<C> {
    pub fn new(http: C, api_key: impl Into<String>) -> Self {
        Self { http, api_key: api_key.into(), api_root: API_ROOT.to_string() }
    }

    /// Point the client at another endpoint.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// URL for one page of a user's top albums.
    pub fn top_albums_url(&self, query: &TopAlbumsQuery<'_>) -> Result<Url, ProviderError> {
        let limit = query.limit.to_string();
        let page = query.page.to_string();
        Url::parse_with_params(
            &self.api_root,
            &[
                ("method", "user.gettopalbums"),
                ("format", "json"),
                ("user", query.user),
                ("api_key", self.api_key.as_str()),
                ("period", query.period.provider_key()),
                ("limit", limit.as_str()),
                ("page", page.as_str()),
            ],
        )
        .map_err(|e| ProviderError::InvalidResponse(format!("bad API URL: {}", e)))
    }

    /// Fetch one page of the ranking, most popular first.
    pub fn top_albums(&self, query: &TopAlbumsQuery<'_>) -> Result<Vec<Album>, ProviderError> {
        let url = self.top_albums_url(query)?;
        let response = self.http.get(url.as_str())?;

        // Error payloads can arrive with any status
        if let Ok(api_error) = serde_json::from_slice::<ApiError>(&response.body) {
            return Err(ProviderError::Api { code: api_error.error, message: api_error.message });
        }
        if !response.is_success() {
            return Err(ProviderError::Http(format!("HTTP {} from {}", response.status, self.api_root)));
        }

        let parsed: TopAlbumsResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        debug!(page = query.page, albums = parsed.topalbums.album.len(), "fetched ranking page");
        Ok(parsed.topalbums.album)
    }

    /// Download raw cover bytes.
    pub fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.http.get(url)?;
        if !response.is_success() {
            return Err(ProviderError::Http(format!("HTTP {} from {}", response.status, url)));
        }
        Ok(response.body)
    }
}
