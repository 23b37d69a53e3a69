//! Integration tests for resumable byte-range downloads

mod common;

use common::{bearer, client, config, file_count};
use docsift::domain::{DocsiftError, DownloadError, ShutdownSignal};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::io::Read;
use tempfile::TempDir;

const CONTENT: &str = "/sites/site/drives/drive/items/doc/content";

fn payload() -> Vec<u8> {
    (0..300u32).map(|i| (i % 251) as u8).collect()
}

async fn chunk(
    server: &mut ServerGuard,
    range: Option<&str>,
    content_range: &str,
    body: &[u8],
) -> Mock {
    let range = match range {
        Some(r) => Matcher::Exact(r.to_string()),
        None => Matcher::Missing,
    };
    server
        .mock("GET", CONTENT)
        .match_header("authorization", bearer().as_str())
        .match_header("range", range)
        .with_status(206)
        .with_header("content-range", content_range)
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_three_chunks_reassemble_the_payload() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());
    let data = payload();

    let m1 = chunk(&mut server, None, "bytes 0-99/300", &data[0..100]).await;
    let m2 = chunk(&mut server, Some("bytes=100-"), "bytes 100-199/300", &data[100..200]).await;
    let m3 = chunk(&mut server, Some("bytes=200-"), "bytes 200-299/300", &data[200..300]).await;

    let mut file = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap();

    let mut downloaded = Vec::new();
    file.read_to_end(&mut downloaded).unwrap();
    assert_eq!(downloaded, data);
    assert!(file.path().starts_with(scratch.path()));
    m1.assert_async().await;
    m2.assert_async().await;
    m3.assert_async().await;

    drop(file);
    assert_eq!(file_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_full_body_with_200() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());

    server
        .mock("GET", CONTENT)
        .match_header("range", Matcher::Missing)
        .with_status(200)
        .with_body(payload())
        .create_async()
        .await;

    let mut file = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap();
    let mut downloaded = Vec::new();
    file.read_to_end(&mut downloaded).unwrap();
    assert_eq!(downloaded, payload());
}

#[tokio::test]
async fn test_range_start_mismatch_removes_scratch_file() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());
    let data = payload();
    let before = file_count(scratch.path());

    chunk(&mut server, None, "bytes 0-99/300", &data[0..100]).await;
    chunk(&mut server, Some("bytes=100-"), "bytes 150-249/300", &data[150..250]).await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::RangeStartMismatch {
            expected: 100,
            actual: 150
        })
    ));
    assert_eq!(file_count(scratch.path()), before);
}

#[tokio::test]
async fn test_total_size_change_is_fatal() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());
    let data = payload();

    chunk(&mut server, None, "bytes 0-99/300", &data[0..100]).await;
    chunk(&mut server, Some("bytes=100-"), "bytes 100-199/400", &data[100..200]).await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::TotalSizeChanged {
            previous: 300,
            current: 400
        })
    ));
    assert_eq!(file_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_zero_length_chunk_is_a_stall() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());

    let stalled = chunk(&mut server, None, "bytes 0-99/300", &[]).await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::Stalled { .. })
    ));
    stalled.assert_async().await;
    assert_eq!(file_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_short_chunk_is_truncation() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());
    let data = payload();

    chunk(&mut server, None, "bytes 0-99/300", &data[0..60]).await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::TruncatedChunk {
            expected: 100,
            actual: 60
        })
    ));
}

#[tokio::test]
async fn test_chunk_ceiling_stops_download() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let mut config = config(&server.url(), scratch.path());
    config.download.max_chunks = 2;
    let data = payload();

    chunk(&mut server, None, "bytes 0-99/300", &data[0..100]).await;
    chunk(&mut server, Some("bytes=100-"), "bytes 100-199/300", &data[100..200]).await;
    chunk(&mut server, Some("bytes=200-"), "bytes 200-299/300", &data[200..300]).await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::Stalled { chunks: 2 })
    ));
    assert_eq!(file_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_range_not_satisfiable_before_total() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());
    let data = payload();

    chunk(&mut server, None, "bytes 0-99/300", &data[0..100]).await;
    server
        .mock("GET", CONTENT)
        .match_header("range", "bytes=100-")
        .with_status(416)
        .create_async()
        .await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::RangeNotSatisfiable { written: 100 })
    ));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());

    let mock = server
        .mock("GET", CONTENT)
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::NotAccessible { status: 404 })
    ));
    mock.assert_async().await;
    assert_eq!(file_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_throttling_exhausts_retries() {
    let mut server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());

    let mock = server
        .mock("GET", CONTENT)
        .with_status(429)
        .with_header("retry-after", "0")
        .expect(3)
        .create_async()
        .await;

    let err = client(&config)
        .download("doc", &ShutdownSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocsiftError::Download(DownloadError::RetriesExhausted { attempts: 3, .. })
    ));
    mock.assert_async().await;
    assert_eq!(file_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_cancelled_download_leaves_no_scratch_file() {
    let server = Server::new_async().await;
    let scratch = TempDir::new().unwrap();
    let config = config(&server.url(), scratch.path());

    let (tx, signal) = ShutdownSignal::channel();
    tx.send(true).unwrap();

    let err = client(&config).download("doc", &signal).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(file_count(scratch.path()), 0);
}
