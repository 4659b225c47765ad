//! HTTP fetcher for the upstream stats endpoint.
//!
//! One GET per call, no internal retries — retry policy belongs to whoever
//! drives the read loop. The upstream service rejects requests without its
//! expected browser-like header set, so those headers are fixed here.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::header::CONTENT_ENCODING;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::error::FetchError;
use crate::query::{StatsQuery, STATS_ENDPOINT};

/// Per-request deadline. Non-negotiable per call; external cancellation does
/// not shorten it, so an uncancelled call is bounded by this.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:72.0) Gecko/20100101 Firefox/72.0";
const REFERER: &str = "https://stats.nba.com/";

/// Seam between the poll loop and the network. Test doubles implement this to
/// count calls or inject failures without any sockets.
#[async_trait]
pub trait StatsFetch: Send + Sync {
    /// Fetch one payload for the given aggregation mode. Returns the decoded
    /// (non-gzip) response body as raw bytes.
    async fn fetch(&self, per_mode: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    /// Fetcher aimed at the production stats endpoint.
    pub fn new() -> Self {
        let base = Url::parse(STATS_ENDPOINT).expect("stats endpoint constant is a valid URL");
        Self::with_base_url(base)
    }

    /// Fetcher aimed at an alternate base URL (local mock servers in tests).
    pub fn with_base_url(base: Url) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction with static options");
        HttpFetcher { client, base }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsFetch for HttpFetcher {
    async fn fetch(&self, per_mode: &str) -> Result<Vec<u8>, FetchError> {
        let url = StatsQuery::with_per_mode(per_mode).url(&self.base);
        debug!(%url, "requesting player tracking stats");

        let mut request = self
            .client
            .get(url.clone())
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("x-nba-stats-origin", "stats")
            .header("x-nba-stats-token", "true")
            .header("Connection", "keep-alive")
            .header("Referer", REFERER)
            .header("Pragma", "no-cache")
            .header("Cache-Control", "no-cache");
        if let Some(host) = self.base.host_str() {
            request = request.header("Host", host);
        }

        let response = request.send().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::UpstreamStatus {
                code: response.status().as_u16(),
            });
        }

        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

        let body = response.bytes().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

        if gzipped {
            inflate_gzip(&body)
        } else {
            Ok(body.to_vec())
        }
    }
}

/// Inflate a gzip-encoded body into raw bytes.
fn inflate_gzip(body: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut decoded = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut decoded)
        .map_err(FetchError::DecodeFailure)?;
    Ok(decoded)
}
