use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use forex_ingest::feed::{FeedClient, FeedError, TickSource};
use forex_ingest::ticks::RowError;

/// Serves exactly one HTTP response on a loopback port and returns the URL.
/// `declared_len` overrides Content-Length to simulate a truncated body.
async fn serve_once(
    status: &'static str,
    body: &'static [u8],
    declared_len: Option<usize>,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let Ok((mut sock, _)) = listener.accept().await else {
            return;
        };

        let mut buf = vec![0u8; 8192];
        let mut read = 0;
        loop {
            let n = sock.read(&mut buf[read..]).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            read += n;
            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                break;
            }
        }

        let head = format!(
            "HTTP/1.1 {status}\r\n\
             Content-Type: text/csv\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            declared_len.unwrap_or(body.len())
        );
        let _ = sock.write_all(head.as_bytes()).await;
        let _ = sock.write_all(body).await;
        let _ = sock.shutdown().await;
    });

    format!("http://{addr}/rates/connect.html?f=csv")
}

fn client(url: String) -> FeedClient {
    FeedClient::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetch_decodes_feed_and_drops_bad_rows() {
    let url = serve_once(
        "200 OK",
        b"EUR/USD,1000,1,23456,1,23556,1.3,1.1\nGBP/USD,abc,1,1,1,1,1,1",
        None,
    )
    .await;

    let out = client(url).fetch().await.unwrap();

    assert_eq!(out.ticks.len(), 1);
    assert!(!out.ticks.contains_key("GBP/USD"));

    let t = &out.ticks["EUR/USD"];
    assert_eq!(t.timestamp_ms, 1000);
    assert_eq!((t.bid_big, t.bid_points), (1.0, 23456.0));
    assert_eq!((t.offer_big, t.offer_points), (1.0, 23556.0));
    assert_eq!((t.high, t.low), (1.3, 1.1));

    assert_eq!(out.rejected.len(), 1);
    assert!(matches!(out.rejected[0].error, RowError::InvalidFields(_)));
}

#[tokio::test]
async fn fetch_raw_returns_body_verbatim() {
    let body: &'static [u8] = b"USD/JPY,1700000000123,151,234,151,240,152.1,150.9\r\n";
    let url = serve_once("200 OK", body, None).await;

    let raw = client(url).fetch_raw().await.unwrap();
    assert_eq!(raw, body);
}

#[tokio::test]
async fn server_error_is_request_level_failure() {
    let url = serve_once("503 Service Unavailable", b"down", None).await;

    let err = client(url).fetch().await.unwrap_err();
    assert!(matches!(err, FeedError::Http(_)));
}

#[tokio::test]
async fn truncated_body_is_request_level_failure() {
    let url = serve_once(
        "200 OK",
        b"EUR/USD,1000,1,23456,1,23556,1.3,1.1\nGBP/U",
        Some(4096),
    )
    .await;

    let err = client(url).fetch().await.unwrap_err();
    assert!(matches!(err, FeedError::Http(_)));
}

#[tokio::test]
async fn unreachable_feed_is_request_level_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{addr}/")).fetch().await.unwrap_err();
    assert!(matches!(err, FeedError::Http(_)));
}
