//! End-to-end lifecycle tests — the connector driven against a hand-rolled
//! mock upstream serving canned HTTP responses.

use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use nba_stats_source::{FetchError, HttpFetcher, ReadError, Source, StatsSource};

// -- mock upstream ----------------------------------------------------------

/// Serve the same canned response to every connection until dropped.
async fn spawn_upstream(response: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let response = response.clone();
            tokio::spawn(async move {
                // Drain the request head; the reply is canned regardless.
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

fn http_response(status_line: &str, extra_headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {status_line}\r\n").into_bytes();
    for (name, value) in extra_headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(body);
    out
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// A configured, open source pointed at the mock upstream.
async fn open_source(addr: SocketAddr, per_mode: &str, period: &str) -> StatsSource<HttpFetcher> {
    let base = Url::parse(&format!("http://{addr}/stats/leaguedashptstats")).unwrap();
    let source = StatsSource::with_fetcher(HttpFetcher::with_base_url(base));

    let mut options = HashMap::new();
    options.insert("per_mode".to_string(), per_mode.to_string());
    options.insert("pollingPeriod".to_string(), period.to_string());
    source.configure(&options).await.unwrap();
    source.open(None).await.unwrap();
    source
}

// -- lifecycle tests --------------------------------------------------------

#[tokio::test]
async fn test_gzip_payload_roundtrips_through_read() {
    let body = br#"{"resultSets":[]}"#;
    let response = http_response("200 OK", &[("Content-Encoding", "gzip")], &gzip(body));
    let addr = spawn_upstream(response).await;

    let source = open_source(addr, "PerGame", "10ms").await;
    let record = source.read(&CancellationToken::new()).await.unwrap();

    // Transparent inflate: the record carries the literal decoded bytes.
    assert_eq!(record.payload, body);
    assert_eq!(record.position.as_bytes(), record.key.as_slice());
    let key = String::from_utf8(record.key).unwrap();
    assert!(key.ends_with("_PerGame"), "key was {key}");

    source.ack(record.position).await.unwrap();
    source.teardown().await.unwrap();
}

#[tokio::test]
async fn test_plain_body_passes_through_untouched() {
    let body = br#"{"resource":"leaguedashptstats","resultSets":[]}"#;
    let response = http_response("200 OK", &[("Content-Type", "application/json")], body);
    let addr = spawn_upstream(response).await;

    let source = open_source(addr, "Totals", "10ms").await;
    let record = source.read(&CancellationToken::new()).await.unwrap();
    assert_eq!(record.payload, body);
    assert!(String::from_utf8(record.key).unwrap().ends_with("_Totals"));
}

#[tokio::test]
async fn test_http_500_surfaces_as_upstream_failure() {
    let response = http_response("500 Internal Server Error", &[], b"upstream exploded");
    let addr = spawn_upstream(response).await;

    let source = open_source(addr, "PerGame", "10ms").await;
    let err = source.read(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err,
        ReadError::Upstream(FetchError::UpstreamStatus { code: 500 })
    ));

    // The failure is retryable: the caller may simply resubmit read.
    let err = source.read(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, ReadError::Upstream(_)));
}

#[tokio::test]
async fn test_corrupt_gzip_surfaces_as_decode_failure() {
    let mut corrupt = gzip(br#"{"resultSets":[]}"#);
    corrupt.truncate(corrupt.len() / 2);
    let response = http_response("200 OK", &[("Content-Encoding", "gzip")], &corrupt);
    let addr = spawn_upstream(response).await;

    let source = open_source(addr, "PerGame", "10ms").await;
    let err = source.read(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err,
        ReadError::Upstream(FetchError::DecodeFailure(_))
    ));
}

#[tokio::test]
async fn test_repeated_reads_deliver_and_ack_in_order() {
    let body = br#"{"resultSets":[]}"#;
    let response = http_response("200 OK", &[], body);
    let addr = spawn_upstream(response).await;

    let source = open_source(addr, "PerGame", "10ms").await;
    let cancel = CancellationToken::new();
    for _ in 0..3 {
        let record = source.read(&cancel).await.unwrap();
        assert_eq!(record.payload, body);
        let position = record.position.clone();
        source.ack(record.position).await.unwrap();
        assert_eq!(source.last_acked(), Some(position));
    }
    source.teardown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_during_wait_stops_without_fetching() {
    let response = http_response("200 OK", &[], br#"{"resultSets":[]}"#);
    let addr = spawn_upstream(response).await;

    // Long period: the first read consumes the immediate tick, the second
    // has to sit out the full interval, which the cancellation cuts short.
    let source = open_source(addr, "PerGame", "1h").await;
    let cancel = CancellationToken::new();
    source.read(&cancel).await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let err = source.read(&cancel).await.unwrap_err();
    assert!(matches!(err, ReadError::Cancelled));

    source.teardown().await.unwrap();
}

#[tokio::test]
async fn test_teardown_without_open_succeeds() {
    let source = StatsSource::new();
    source.teardown().await.unwrap();
}
