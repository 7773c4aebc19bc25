//! Album ranking provider
//!
//! Talks to the Last.fm web service through an [`HttpClient`], so the
//! acquisition pipeline can be driven by a mock in tests:
//!
//! ```ignore
//! use fmcollage::provider::{LastFmClient, ReqwestClient};
//!
//! let client = LastFmClient::new(ReqwestClient::new()?, api_key);
//! ```

mod http;
mod lastfm;
mod types;

pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use lastfm::{LastFmClient, API_ROOT};
pub use types::{Album, Artist, CoverImage, Period, ProviderError, TopAlbumsQuery};

#[cfg(test)]
pub(crate) use http::tests::MockHttpClient;
