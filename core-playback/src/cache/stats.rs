//! Cache statistics

use serde::{Deserialize, Serialize};

/// Point-in-time counters for a byte cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached chunks
    pub entries: usize,

    /// Total bytes held
    pub size_bytes: u64,

    pub hits: u64,

    pub misses: u64,

    /// Entries dropped to stay under the size bound
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate cache usage as a percentage of max size.
    pub fn usage_percentage(&self, max_size: u64) -> f64 {
        if max_size == 0 {
            return 0.0;
        }

        (self.size_bytes as f64 / max_size as f64) * 100.0
    }

    /// Fraction of lookups served from the cache, `0.0` when never queried.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }

        self.hits as f64 / lookups as f64
    }
}
