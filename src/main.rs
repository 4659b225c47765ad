//! Standalone runner: drives the source lifecycle against the live endpoint.
//!
//! Useful for smoke-testing the connector outside a pipeline host. Fetch
//! errors are logged and the loop resubmits `read` on the next tick, which is
//! the same contract a hosting framework's backoff layer would follow.

use std::collections::HashMap;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nba_stats_source::payload::StatsResponse;
use nba_stats_source::{spec, ReadError, Source, StatsSource};

#[derive(Parser, Debug)]
#[command(
    name = "nba-stats-source",
    version,
    about = "Poll the NBA player tracking stats API and emit timestamped records"
)]
struct Cli {
    /// Aggregation mode requested from upstream (e.g. PerGame, Totals).
    #[arg(long, default_value = "PerGame")]
    per_mode: String,

    /// How often to poll upstream (Go-style duration, e.g. 30s, 5m).
    #[arg(long, default_value = "5m")]
    polling_period: String,

    /// Decode each payload and log its result set names and row counts.
    #[arg(long)]
    inspect: bool,

    /// Stop after this many records (0 = run until interrupted).
    #[arg(long, default_value_t = 0)]
    max_records: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let meta = spec();
    info!(name = meta.name, version = meta.version, "starting connector");

    let mut options = HashMap::new();
    options.insert("per_mode".to_string(), cli.per_mode);
    options.insert("pollingPeriod".to_string(), cli.polling_period);

    let source = StatsSource::new();
    if let Err(e) = source.configure(&options).await {
        error!(error = %e, "configuration rejected");
        return ExitCode::FAILURE;
    }
    if let Err(e) = source.open(None).await {
        error!(error = %e, "failed to open source");
        return ExitCode::FAILURE;
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping after the current read");
                cancel.cancel();
            }
        });
    }

    let mut delivered: u64 = 0;
    loop {
        match source.read(&cancel).await {
            Ok(record) => {
                delivered += 1;
                info!(
                    key = %String::from_utf8_lossy(&record.key),
                    bytes = record.payload.len(),
                    "record produced"
                );
                if cli.inspect {
                    match StatsResponse::from_bytes(&record.payload) {
                        Ok(body) => {
                            for set in &body.result_sets {
                                info!(name = %set.name, rows = set.row_set.len(), "result set");
                            }
                        }
                        Err(e) => warn!(error = %e, "payload is not a stats envelope"),
                    }
                }
                if let Err(e) = source.ack(record.position).await {
                    warn!(error = %e, "ack failed");
                }
                if cli.max_records > 0 && delivered >= cli.max_records {
                    break;
                }
            }
            Err(ReadError::Cancelled) => break,
            Err(e) => {
                warn!(error = %e, "read failed, resubmitting on the next tick");
            }
        }
    }

    if let Err(e) = source.teardown().await {
        error!(error = %e, "teardown failed");
        return ExitCode::FAILURE;
    }
    info!(delivered, "connector stopped");
    ExitCode::SUCCESS
}
