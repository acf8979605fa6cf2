//! Process-wide LRU byte cache for streamed media.
//!
//! Entries are fixed-size chunks of remote resources keyed by
//! `"{url}#{chunk_index}"`. The bound is on total bytes, not on entry count:
//! inserting a chunk evicts least-recently-used chunks until the total fits.

use super::{CacheConfig, CacheStats};
use crate::error::{PlaybackError, Result};
use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Storage seen by the streaming reader.
///
/// [`NetworkCache`] is the production implementation; tests can substitute
/// anything, including a map that never evicts.
pub trait ByteCache: Send + Sync {
    /// Look up a chunk, marking it most recently used.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Store a chunk. Implementations may drop it silently.
    fn put(&self, key: &str, data: Bytes);

    fn stats(&self) -> CacheStats;
}

static SHARED_CACHE: Mutex<Option<Arc<NetworkCache>>> = parking_lot::const_mutex(None);

struct CacheInner {
    entries: LruCache<String, Bytes>,
    size_bytes: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheInner {
    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            size_bytes: self.size_bytes,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

/// Bounded least-recently-used cache of remote byte ranges.
pub struct NetworkCache {
    inner: Mutex<CacheInner>,
    max_size_bytes: u64,
}

impl NetworkCache {
    /// Create a standalone cache. Most callers want [`NetworkCache::shared`].
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::unbounded(),
                size_bytes: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            max_size_bytes,
        }
    }

    /// The process-wide instance, constructed on first call.
    ///
    /// Construction happens under a lock, so concurrent first callers all
    /// receive the same instance. `config` only matters for the call that
    /// constructs the cache.
    pub fn shared(config: &CacheConfig) -> Result<Arc<NetworkCache>> {
        let mut slot = SHARED_CACHE.lock();
        if let Some(cache) = slot.as_ref() {
            return Ok(Arc::clone(cache));
        }

        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let cache = Arc::new(NetworkCache::new(config.max_size_bytes));
        info!(
            max_size_bytes = config.max_size_bytes,
            "Initialized shared network cache"
        );
        *slot = Some(Arc::clone(&cache));
        Ok(cache)
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.size_bytes = 0;
    }
}

impl ByteCache for NetworkCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        let mut inner = self.inner.lock();
        match inner.entries.get(key).cloned() {
            Some(data) => {
                inner.hits += 1;
                Some(data)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    fn put(&self, key: &str, data: Bytes) {
        let data_size = data.len() as u64;
        if data_size > self.max_size_bytes {
            debug!(
                key = key,
                size = data_size,
                "Chunk larger than cache bound, not caching"
            );
            return;
        }

        let mut inner = self.inner.lock();
        if let Some(previous) = inner.entries.put(key.to_string(), data) {
            inner.size_bytes -= previous.len() as u64;
        }
        inner.size_bytes += data_size;

        let mut evicted_now = 0;
        while inner.size_bytes > self.max_size_bytes {
            match inner.entries.pop_lru() {
                Some((evicted_key, evicted)) => {
                    inner.size_bytes -= evicted.len() as u64;
                    inner.evictions += 1;
                    evicted_now += 1;
                    debug!(key = %evicted_key, size = evicted.len(), "Evicted cache entry");
                }
                None => break,
            }
        }

        if evicted_now > 0 {
            let stats = inner.stats();
            debug!(
                evicted = evicted_now,
                usage_percent = stats.usage_percentage(self.max_size_bytes),
                hit_ratio = stats.hit_ratio(),
                "Cache at capacity"
            );
        }
    }

    fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }
}
