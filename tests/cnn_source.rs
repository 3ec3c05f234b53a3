//! Fetcher behavior against a local HTTP server serving canned responses.

use chrono::{Local, TimeZone};
use feargreed_recorder::{CnnSource, FetchError, Granularity, ObservationSource};
use rust_decimal::Decimal;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one HTTP response and hand back the raw request text.
async fn serve_once(status: &str, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&request).to_string());
    });

    (format!("http://{}/graphdata/", addr), rx)
}

fn march_first() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn source(base_url: &str, granularity: Granularity) -> CnnSource {
    CnnSource::builder()
        .base_url(base_url)
        .granularity(granularity)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn fetch_returns_rounded_observation() {
    let (url, request) = serve_once("200 OK", r#"{"fear_and_greed":{"score":62.345,"rating":"greed"}}"#).await;

    let obs = source(&url, Granularity::Date).fetch(march_first()).await.unwrap();

    assert_eq!(obs.timestamp, "2024-03-01");
    assert_eq!(obs.value, Decimal::new(6235, 2));

    let request = request.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /graphdata/2024-03-01 http/1.1"));
    assert!(request.contains("user-agent: mozilla/5.0"));
    assert!(request.contains("accept-language: en-us,en;q=0.9"));
    assert!(request.contains("referer: https://edition.cnn.com"));
    assert!(request.contains("dnt: 1"));
}

#[tokio::test]
async fn fetch_stamps_datetime_granularity() {
    let (url, _request) = serve_once("200 OK", r#"{"fear_and_greed":{"score":20}}"#).await;

    let obs = source(&url, Granularity::DateTime).fetch(march_first()).await.unwrap();

    assert_eq!(obs.timestamp, "2024-03-01 12:00:00");
    assert_eq!(obs.value, Decimal::from(20));
}

#[tokio::test]
async fn fetch_reports_bad_status() {
    let (url, _request) = serve_once("503 Service Unavailable", r#"{"fear_and_greed":{"score":50}}"#).await;

    let result = source(&url, Granularity::Date).fetch(march_first()).await;

    assert!(matches!(result, Err(FetchError::BadStatus(503))));
}

#[tokio::test]
async fn fetch_reports_empty_body() {
    let (url, _request) = serve_once("200 OK", "").await;

    let result = source(&url, Granularity::Date).fetch(march_first()).await;

    assert!(matches!(result, Err(FetchError::EmptyOrInvalidBody(_))));
}

#[tokio::test]
async fn fetch_reports_missing_score() {
    let (url, _request) = serve_once("200 OK", r#"{"market_momentum_sp500":{"score":1}}"#).await;

    let result = source(&url, Granularity::Date).fetch(march_first()).await;

    assert!(matches!(result, Err(FetchError::EmptyOrInvalidBody(_))));
}

#[tokio::test]
async fn fetch_reports_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = source(&format!("http://{}/graphdata/", addr), Granularity::Date)
        .fetch(march_first())
        .await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}

#[tokio::test]
async fn fetch_reports_truncated_body_as_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        // Promise more bytes than are sent, then hang up
        let response = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"fear_and";
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    let result = source(&format!("http://{}/graphdata/", addr), Granularity::Date)
        .fetch(march_first())
        .await;

    assert!(matches!(result, Err(FetchError::Network(_))), "got {:?}", result);
}
