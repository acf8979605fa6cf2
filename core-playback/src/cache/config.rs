//! Cache configuration

use serde::{Deserialize, Serialize};

/// Configuration for the streamed-media byte cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on cached bytes (default: 100 MB)
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// When `false`, streaming always takes the uncached direct path.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            enabled: default_enabled(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum cache size.
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    /// Enable or disable caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size_bytes == 0 {
            return Err("max_size_bytes must be greater than 0".to_string());
        }

        Ok(())
    }
}

fn default_max_size_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_enabled() -> bool {
    true
}
