//! How a streaming engine obtains its cache.

use super::{ByteCache, CacheConfig, NetworkCache};
use crate::error::{PlaybackError, Result};
use std::sync::Arc;

/// Hands out the cache a streaming engine should wrap around the network.
///
/// [`CacheProvider::acquire`] may block (first use constructs the shared
/// cache), so engines call it off the coordinator's context.
pub trait CacheProvider: Send + Sync {
    fn acquire(&self) -> Result<Arc<dyn ByteCache>>;
}

/// Production provider: the lazily built process-wide [`NetworkCache`].
#[derive(Debug, Clone, Default)]
pub struct SharedCacheProvider {
    config: CacheConfig,
}

impl SharedCacheProvider {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }
}

impl CacheProvider for SharedCacheProvider {
    fn acquire(&self) -> Result<Arc<dyn ByteCache>> {
        if !self.config.enabled {
            return Err(PlaybackError::CacheUnavailable(
                "caching disabled by configuration".to_string(),
            ));
        }

        let cache: Arc<dyn ByteCache> = NetworkCache::shared(&self.config)?;
        Ok(cache)
    }
}

/// Always returns the same injected cache.
#[derive(Clone)]
pub struct FixedCacheProvider {
    cache: Arc<dyn ByteCache>,
}

impl FixedCacheProvider {
    pub fn new(cache: Arc<dyn ByteCache>) -> Self {
        Self { cache }
    }
}

impl CacheProvider for FixedCacheProvider {
    fn acquire(&self) -> Result<Arc<dyn ByteCache>> {
        Ok(Arc::clone(&self.cache))
    }
}
