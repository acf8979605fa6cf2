use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::playback::StreamReader;
use bytes::Bytes;
use core_playback::cache::{ByteCache, NetworkCache};
use core_playback::{CachedStreamReader, FailureKind, PlaybackError, StreamingConfig};
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

const URL: &str = "https://cdn.example.com/album/track.mp3";
const BODY: &[u8] = b"0123456789abcdef";

fn requested_range(request: &HttpRequest) -> (usize, usize) {
    let value = request.headers.get("Range").expect("range header");
    let (start, end) = value
        .strip_prefix("bytes=")
        .and_then(|r| r.split_once('-'))
        .expect("well-formed range");
    (start.parse().unwrap(), end.parse().unwrap())
}

fn response(status: u16, body: &[u8]) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::copy_from_slice(body),
    }
}

/// Answers ranged GETs over `BODY` the way a compliant server would.
fn partial_content(request: HttpRequest) -> BridgeResult<HttpResponse> {
    let (start, end) = requested_range(&request);
    if start >= BODY.len() {
        return Ok(response(416, b""));
    }
    Ok(response(206, &BODY[start..=end.min(BODY.len() - 1)]))
}

fn config(chunk_bytes: usize) -> StreamingConfig {
    StreamingConfig::default()
        .with_chunk_bytes(chunk_bytes)
        .with_http_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_reads_are_chunk_aligned_ranges() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|request| {
            request.url == URL
                && request.headers.get("Range").map(String::as_str) == Some("bytes=4-7")
                && request.timeout == Some(Duration::from_secs(5))
        })
        .times(1)
        .returning(partial_content);

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(4));
    let data = reader.read_range(5, 2).await.unwrap();
    assert_eq!(&data[..], b"56");
}

#[tokio::test]
async fn test_read_spanning_chunks_is_stitched() {
    let mut http = MockHttp::new();
    http.expect_execute().times(3).returning(partial_content);

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(4));
    let data = reader.read_range(2, 8).await.unwrap();
    assert_eq!(&data[..], b"23456789");
}

#[tokio::test]
async fn test_cached_chunks_skip_the_network() {
    let cache = Arc::new(NetworkCache::new(1024));
    let mut http = MockHttp::new();
    http.expect_execute().times(1).returning(partial_content);

    let shared: Arc<dyn ByteCache> = cache.clone();
    let reader = CachedStreamReader::new(URL, Arc::new(http), Some(shared), &config(8));
    assert!(reader.is_cached());

    let first = reader.read_range(0, 4).await.unwrap();
    let second = reader.read_at(4, 4).await.unwrap();
    assert_eq!(&first[..], b"0123");
    assert_eq!(&second[..], b"4567");

    assert!(cache.contains(&format!("{URL}#0")));
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_uncached_reader_refetches() {
    let mut http = MockHttp::new();
    http.expect_execute().times(2).returning(partial_content);

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(8));
    assert!(!reader.is_cached());
    reader.read_range(0, 4).await.unwrap();
    reader.read_range(0, 4).await.unwrap();
}

#[tokio::test]
async fn test_short_read_at_end_of_resource() {
    let mut http = MockHttp::new();
    http.expect_execute().returning(partial_content);

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(4));
    let tail = reader.read_range(14, 10).await.unwrap();
    assert_eq!(&tail[..], b"ef");

    let past_end = reader.read_range(64, 4).await.unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_full_body_answer_is_sliced_locally() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(response(200, BODY)));

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(4));
    let data = reader.read_range(8, 4).await.unwrap();
    assert_eq!(&data[..], b"89ab");
}

#[tokio::test]
async fn test_full_body_answer_fills_every_chunk() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(response(200, BODY)));

    let cache = Arc::new(NetworkCache::new(1024));
    let shared: Arc<dyn ByteCache> = cache.clone();
    let reader = CachedStreamReader::new(URL, Arc::new(http), Some(shared), &config(4));

    assert_eq!(&reader.read_range(0, 4).await.unwrap()[..], b"0123");
    assert_eq!(&reader.read_range(8, 4).await.unwrap()[..], b"89ab");
    assert_eq!(&reader.read_range(12, 8).await.unwrap()[..], b"cdef");
    for index in 0..4 {
        assert!(cache.contains(&format!("{}#{}", URL, index)));
    }
    assert!(!cache.contains(&format!("{}#4", URL)));
}

#[tokio::test]
async fn test_read_near_u64_max_ends_cleanly() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(response(416, b"")));

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(10));
    let data = reader.read_range(u64::MAX - 1, 4).await.unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_error_status_fails_the_read() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Ok(response(503, b"unavailable")));

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(4));
    let err = reader.read_range(0, 4).await.unwrap_err();
    assert!(matches!(err, PlaybackError::StreamingFailed(_)));
    assert!(err.is_network_error());
    assert_eq!(err.kind(), FailureKind::Load);
}

#[tokio::test]
async fn test_transport_error_surfaces_through_stream_reader() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Err(BridgeError::Timeout("read".to_string())));

    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(4));
    let err = reader.read_at(0, 4).await.unwrap_err();
    assert!(matches!(err, BridgeError::OperationFailed(_)));
}

#[tokio::test]
async fn test_zero_length_read_makes_no_request() {
    let http = MockHttp::new();
    let reader = CachedStreamReader::new(URL, Arc::new(http), None, &config(4));
    assert!(reader.read_range(3, 0).await.unwrap().is_empty());
}
