//! # Network Stream Reader
//!
//! Serves random-access reads of a remote resource by fetching fixed-size,
//! chunk-aligned byte ranges and caching each chunk.
//!
//! ```text
//! read_at(offset, len)
//!   └─ for each chunk index overlapping the window
//!        ├─ cache hit  → slice
//!        └─ cache miss → GET Range: bytes=a-b → cache.put → slice
//! ```
//!
//! A chunk shorter than `chunk_bytes` marks the end of the resource.

use crate::config::StreamingConfig;
use crate::error::{PlaybackError, Result};
use crate::cache::ByteCache;
use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::playback::StreamReader;
use bytes::{Bytes, BytesMut};
use core_runtime::logging::redact_url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// [`StreamReader`] over an [`HttpClient`] with an optional [`ByteCache`].
pub struct CachedStreamReader {
    url: String,
    http: Arc<dyn HttpClient>,
    cache: Option<Arc<dyn ByteCache>>,
    chunk_bytes: usize,
    timeout: Duration,
}

impl CachedStreamReader {
    /// `cache = None` reads straight from the network.
    pub fn new(
        url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        cache: Option<Arc<dyn ByteCache>>,
        config: &StreamingConfig,
    ) -> Self {
        Self {
            url: url.into(),
            http,
            cache,
            chunk_bytes: config.chunk_bytes.max(1),
            timeout: config.http_timeout,
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn chunk_key(&self, index: u64) -> String {
        format!("{}#{}", self.url, index)
    }

    async fn chunk(&self, index: u64) -> Result<Bytes> {
        let key = self.chunk_key(index);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                trace!(chunk = index, "Chunk served from cache");
                return Ok(hit);
            }
        }

        let chunk_len = self.chunk_bytes as u64;
        let start = index.saturating_mul(chunk_len);
        let end = start.saturating_add(chunk_len - 1);
        let request = HttpRequest::get(&self.url)
            .range(start, end)
            .timeout(self.timeout);

        let response = self.http.execute(request).await.map_err(|e| {
            PlaybackError::StreamingFailed(format!(
                "{} (chunk {}): {}",
                redact_url(&self.url),
                index,
                e
            ))
        })?;

        let data = if response.is_partial_content() {
            response.body
        } else if response.is_range_not_satisfiable() {
            Bytes::new()
        } else if response.status == 200 {
            // Server ignored the range and sent the whole resource.
            self.store_whole(&response.body, index);
            slice_chunk(&response.body, index, chunk_len)
        } else {
            return Err(PlaybackError::StreamingFailed(format!(
                "HTTP {} for {} (chunk {})",
                response.status,
                redact_url(&self.url),
                index
            )));
        };

        debug!(chunk = index, bytes = data.len(), "Fetched chunk");

        if !data.is_empty() {
            if let Some(cache) = &self.cache {
                cache.put(&key, data.clone());
            }
        }

        Ok(data)
    }

    /// Cache every chunk of a full-body answer except `requested`, which the
    /// caller stores last so it is the most recently used.
    fn store_whole(&self, body: &Bytes, requested: u64) {
        let Some(cache) = &self.cache else {
            return;
        };
        let chunk_len = self.chunk_bytes as u64;
        let chunks = (body.len() as u64).div_ceil(chunk_len);
        for index in (0..chunks).filter(|&i| i != requested) {
            cache.put(&self.chunk_key(index), slice_chunk(body, index, chunk_len));
        }
        debug!(chunks, "Cached full-body response");
    }

    /// Read `length` bytes at `offset`, stopping early at end of resource.
    pub async fn read_range(&self, offset: u64, length: usize) -> Result<Bytes> {
        if length == 0 {
            return Ok(Bytes::new());
        }

        let chunk_len = self.chunk_bytes as u64;
        let end = offset.saturating_add(length as u64);
        let mut index = offset / chunk_len;
        let mut out: Option<BytesMut> = None;

        loop {
            let Some(chunk_start) = index.checked_mul(chunk_len) else {
                break;
            };
            if chunk_start >= end {
                break;
            }

            let data = self.chunk(index).await?;
            let from = offset.saturating_sub(chunk_start) as usize;
            if from >= data.len() {
                break;
            }
            let to = ((end - chunk_start) as usize).min(data.len());

            // Window satisfied by the first chunk alone: slice, no copy.
            if out.is_none() && (chunk_start + to as u64 == end || data.len() < self.chunk_bytes) {
                return Ok(data.slice(from..to));
            }

            out.get_or_insert_with(|| BytesMut::with_capacity(length))
                .extend_from_slice(&data[from..to]);

            if data.len() < self.chunk_bytes {
                break;
            }
            let Some(next) = index.checked_add(1) else {
                break;
            };
            index = next;
        }

        Ok(out.map(BytesMut::freeze).unwrap_or_default())
    }
}

/// Chunk `index` of a complete resource body; empty past the end.
fn slice_chunk(body: &Bytes, index: u64, chunk_len: u64) -> Bytes {
    let len = body.len() as u64;
    let start = index.saturating_mul(chunk_len);
    if start >= len {
        return Bytes::new();
    }
    let end = start.saturating_add(chunk_len).min(len);
    body.slice(start as usize..end as usize)
}

#[async_trait]
impl StreamReader for CachedStreamReader {
    async fn read_at(&self, offset: u64, length: usize) -> BridgeResult<Bytes> {
        self.read_range(offset, length)
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))
    }
}
