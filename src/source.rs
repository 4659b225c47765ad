//! Source connector lifecycle: `configure → open → read → ack → teardown`.
//!
//! The hosting framework drives these five operations. Its contract, relied
//! on here as a precondition rather than enforced with internal locking:
//! `read` is never called concurrently with itself, while `ack` may run
//! concurrently with an in-flight `read`. `read` is the only operation that
//! suspends (on the limiter wait and, transitively, on network I/O).

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::error::{ReadError, SourceError};
use crate::fetch::{HttpFetcher, StatsFetch};
use crate::limiter::IntervalLimiter;

/// Opaque resume marker handed back by the host after durable delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(Vec<u8>);

impl Position {
    pub fn new(bytes: Vec<u8>) -> Self {
        Position(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Position {
    fn from(bytes: Vec<u8>) -> Self {
        Position(bytes)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// One delivered unit: a positioned, keyed, raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub position: Position,
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Key (and position) for a fetch completed at `at`: the UTC minute formatted
/// `YYYY-MM-DD-HHMM`, an underscore, then the aggregation mode.
///
/// Minute resolution means two fetches in the same minute for the same mode
/// share a key. Accepted coarseness: downstream treats position as a resume
/// marker, not a uniqueness key, so the later record supersedes the earlier.
pub fn record_key(at: DateTime<Utc>, per_mode: &str) -> String {
    format!("{}_{}", at.format("%Y-%m-%d-%H%M"), per_mode)
}

/// The source connector contract exposed to the hosting framework.
#[async_trait]
pub trait Source: Send + Sync {
    /// Validate and store configuration. First call in the lifecycle;
    /// last write wins if called again before `open`. No I/O here.
    async fn configure(&self, options: &HashMap<String, String>) -> Result<(), SourceError>;

    /// Prepare to produce records. `position` is the last durably processed
    /// position, if any. No network calls are made here.
    async fn open(&self, position: Option<Position>) -> Result<(), SourceError>;

    /// Block until the limiter grants a tick (or `cancel` fires), fetch once,
    /// and return the stamped record. Never called concurrently with itself.
    async fn read(&self, cancel: &CancellationToken) -> Result<Record, ReadError>;

    /// Note that `position` was durably processed downstream. Bookkeeping
    /// only; never suspends; safe concurrently with an in-flight `read`.
    async fn ack(&self, position: Position) -> Result<(), SourceError>;

    /// Release resources. Idempotent, and succeeds even when `open` was
    /// never called. No other operation may be invoked afterwards, and it
    /// must not be called while a `read` is still in flight — it never
    /// suspends, so a violated ordering surfaces as a usage error rather
    /// than a wait.
    async fn teardown(&self) -> Result<(), SourceError>;
}

enum Phase {
    Unconfigured,
    Configured(SourceConfig),
    Open {
        config: SourceConfig,
        limiter: IntervalLimiter,
    },
    TornDown,
}

/// NBA player tracking stats source.
///
/// Generic over the fetch seam so tests can swap in counting or failing
/// fetchers; production code uses the [`HttpFetcher`] default.
pub struct StatsSource<F = HttpFetcher> {
    fetcher: F,
    // Poll state. Only read and the lifecycle operations touch this, and the
    // host never overlaps those, so the async mutex is uncontended in
    // practice; it exists so ack can stay off this lock entirely.
    phase: Mutex<Phase>,
    // Ack bookkeeping, deliberately separate from the poll state: ack must
    // proceed while read holds the phase lock across its waits.
    last_acked: StdMutex<Option<Position>>,
}

impl StatsSource<HttpFetcher> {
    pub fn new() -> Self {
        Self::with_fetcher(HttpFetcher::new())
    }
}

impl Default for StatsSource<HttpFetcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: StatsFetch> StatsSource<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        StatsSource {
            fetcher,
            phase: Mutex::new(Phase::Unconfigured),
            last_acked: StdMutex::new(None),
        }
    }

    /// Last position the host reported as durably processed, if any.
    pub fn last_acked(&self) -> Option<Position> {
        self.last_acked
            .lock()
            .expect("ack bookkeeping lock poisoned")
            .clone()
    }
}

#[async_trait]
impl<F: StatsFetch> Source for StatsSource<F> {
    async fn configure(&self, options: &HashMap<String, String>) -> Result<(), SourceError> {
        let config = SourceConfig::from_options(options)?;
        let mut phase = self.phase.lock().await;
        match *phase {
            Phase::Unconfigured | Phase::Configured(_) => {
                info!(
                    per_mode = %config.per_mode,
                    polling_period = ?config.polling_period,
                    "configuring source"
                );
                *phase = Phase::Configured(config);
                Ok(())
            }
            Phase::Open { .. } => Err(SourceError::Usage("configure called on an open source")),
            Phase::TornDown => Err(SourceError::Usage("configure called after teardown")),
        }
    }

    async fn open(&self, position: Option<Position>) -> Result<(), SourceError> {
        let mut phase = self.phase.lock().await;
        match std::mem::replace(&mut *phase, Phase::Unconfigured) {
            Phase::Configured(config) => {
                if let Some(pos) = position {
                    // Upstream is a live feed; there is nothing to rewind to.
                    info!(position = %pos, "opening after previously acked position");
                }
                let limiter = IntervalLimiter::new(config.polling_period);
                info!(polling_period = ?limiter.period(), "source open");
                *phase = Phase::Open { config, limiter };
                Ok(())
            }
            previous => {
                let message = match previous {
                    Phase::Unconfigured => "open called on an unconfigured source",
                    Phase::Open { .. } => "open called twice",
                    Phase::TornDown => "open called after teardown",
                    Phase::Configured(_) => unreachable!("handled above"),
                };
                *phase = previous;
                Err(SourceError::Usage(message))
            }
        }
    }

    async fn read(&self, cancel: &CancellationToken) -> Result<Record, ReadError> {
        let mut phase = self.phase.lock().await;
        let Phase::Open { config, limiter } = &mut *phase else {
            return Err(ReadError::Usage("read called on a source that is not open"));
        };

        limiter
            .wait(cancel)
            .await
            .map_err(|_| ReadError::Cancelled)?;
        info!(polling_period = ?config.polling_period, "poll tick granted, fetching stats");

        let payload = self.fetcher.fetch(&config.per_mode).await?;
        info!(bytes = payload.len(), "successfully fetched player tracking stats");

        let key = record_key(Utc::now(), &config.per_mode).into_bytes();
        Ok(Record {
            position: Position::new(key.clone()),
            key,
            payload,
        })
    }

    async fn ack(&self, position: Position) -> Result<(), SourceError> {
        // Best-effort teardown guard only: taking the phase lock outright
        // would block behind an in-flight read, and ack must never suspend.
        if let Ok(phase) = self.phase.try_lock() {
            if matches!(*phase, Phase::TornDown) {
                return Err(SourceError::Usage("ack called after teardown"));
            }
        }
        debug!(position = %position, "got ack");
        *self
            .last_acked
            .lock()
            .expect("ack bookkeeping lock poisoned") = Some(position);
        Ok(())
    }

    async fn teardown(&self) -> Result<(), SourceError> {
        // try_lock keeps teardown non-suspending. The lock is only ever
        // contended when the host breaks the ordering contract and tears
        // down with a read still in flight.
        let Ok(mut phase) = self.phase.try_lock() else {
            return Err(SourceError::Usage("teardown called while a read is in flight"));
        };
        // Idempotent, and valid from any state including Unconfigured.
        *phase = Phase::TornDown;
        info!("source torn down");
        Ok(())
    }
}
