//! Error taxonomy for the connector.
//!
//! Configuration problems are fatal and surface at configure time; fetch
//! problems are retryable and propagate to the caller untouched — the core
//! never retries internally, so every failure is visible exactly once.

use std::time::Duration;
use thiserror::Error;

/// Rejected configuration. Surfaced by `configure`, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid duration '{value}' for pollingPeriod: {detail}")]
    InvalidDuration { value: String, detail: String },

    #[error("pollingPeriod must be a positive duration, got {0:?}")]
    NonPositivePeriod(Duration),

    #[error("per_mode must not be empty")]
    EmptyPerMode,

    #[error("unrecognized option '{0}'")]
    UnknownOption(String),
}

/// A single upstream fetch attempt failed.
///
/// All variants are retryable from the caller's point of view; the fetcher
/// itself never retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, broken body stream).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream replied with a non-200 status. The body is left unread.
    #[error("upstream replied with HTTP {code}")]
    UpstreamStatus { code: u16 },

    /// The response declared gzip encoding but the body did not inflate.
    #[error("failed to inflate gzip response body: {0}")]
    DecodeFailure(#[source] std::io::Error),
}

/// Outcome of a failed `read` call.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The caller cancelled the wait before the limiter granted a tick.
    /// A graceful stop, not a failure — no fetch was attempted.
    #[error("read cancelled while waiting for the next poll tick")]
    Cancelled,

    /// The fetch itself failed; the caller decides whether to resubmit
    /// `read` (the next tick applies the usual interval) or stop polling.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    /// Lifecycle violation: `read` on a source that is not open.
    #[error("lifecycle violation: {0}")]
    Usage(&'static str),
}

/// Failure of a lifecycle operation (`configure`, `open`, `ack`, `teardown`).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("lifecycle violation: {0}")]
    Usage(&'static str),
}
