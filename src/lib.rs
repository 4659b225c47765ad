//! A polling source connector for the NBA player tracking stats API.
//!
//! The connector exposes the standard source lifecycle
//! (`configure → open → read → ack → teardown`): on each `read` it waits for
//! a rate-limiter tick, fetches the `leaguedashptstats` endpoint once, and
//! emits the raw response body as a record keyed by the UTC minute and the
//! configured aggregation mode. Retry and backoff policy belong to the
//! caller — the core never retries and never buffers.

pub mod config;
pub mod error;
pub mod fetch;
pub mod limiter;
pub mod payload;
pub mod query;
pub mod source;

pub use config::SourceConfig;
pub use error::{ConfigError, FetchError, ReadError, SourceError};
pub use fetch::{HttpFetcher, StatsFetch};
pub use limiter::IntervalLimiter;
pub use query::StatsQuery;
pub use source::{record_key, Position, Record, Source, StatsSource};

/// Connector metadata, built from Cargo package metadata at startup.
///
/// Injected where the host needs it instead of living in a process-wide
/// mutable variable; its lifetime is process initialization only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    pub name: &'static str,
    pub summary: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub author: &'static str,
}

/// The connector's self-description.
pub fn spec() -> Spec {
    Spec {
        name: env!("CARGO_PKG_NAME"),
        summary: "An NBA player tracking stats source connector.",
        description: "A source connector that polls the NBA league player \
                      tracking stats endpoint on a fixed interval and emits \
                      each response body as a timestamped record.",
        version: env!("CARGO_PKG_VERSION"),
        author: env!("CARGO_PKG_AUTHORS"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_reflects_package_metadata() {
        let spec = spec();
        assert_eq!(spec.name, "nba-stats-source");
        assert!(!spec.version.is_empty());
        assert!(!spec.summary.is_empty());
    }
}
