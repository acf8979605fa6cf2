//! # Playback Configuration
//!
//! Tuning knobs for the coordinator, the streaming engine and the network
//! cache. None of these are correctness contracts; they trade startup latency,
//! memory and stutter risk against each other.

use crate::cache::CacheConfig;
use bridge_traits::playback::BufferingPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Streaming
// ============================================================================

/// Buffering and transfer settings for network playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Keep at least this much media buffered ahead of the playhead.
    ///
    /// Default: 15 seconds.
    #[serde(default = "default_min_buffer")]
    pub min_buffer: Duration,

    /// Stop fetching once this much media is buffered.
    ///
    /// Default: 50 seconds.
    #[serde(default = "default_max_buffer")]
    pub max_buffer: Duration,

    /// Media required before the first frame plays (pre-roll).
    ///
    /// Default: 2.5 seconds.
    #[serde(default = "default_buffer_for_playback")]
    pub buffer_for_playback: Duration,

    /// Media required before resuming after a stall. Larger than the pre-roll
    /// so a flaky connection does not stutter repeatedly.
    ///
    /// Default: 5 seconds.
    #[serde(default = "default_buffer_for_playback_after_rebuffer")]
    pub buffer_for_playback_after_rebuffer: Duration,

    /// Size of one ranged HTTP request and of one cache entry.
    ///
    /// Default: 256 KB.
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,

    /// Maximum duration to wait for one ranged request.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: Duration,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self::conservative()
    }
}

impl StreamingConfig {
    /// Default profile: modest pre-roll, generous rebuffer.
    pub fn conservative() -> Self {
        Self {
            min_buffer: default_min_buffer(),
            max_buffer: default_max_buffer(),
            buffer_for_playback: default_buffer_for_playback(),
            buffer_for_playback_after_rebuffer: default_buffer_for_playback_after_rebuffer(),
            chunk_bytes: default_chunk_bytes(),
            http_timeout: default_http_timeout(),
        }
    }

    /// Start fast on good connections.
    ///
    /// - 1s pre-roll, 2s after a stall
    /// - Smaller chunks (128 KB)
    pub fn low_latency() -> Self {
        Self {
            min_buffer: Duration::from_secs(5),
            max_buffer: Duration::from_secs(20),
            buffer_for_playback: Duration::from_secs(1),
            buffer_for_playback_after_rebuffer: Duration::from_secs(2),
            chunk_bytes: 128 * 1024,
            ..Self::conservative()
        }
    }

    /// Cap buffered media for constrained devices.
    pub fn low_memory() -> Self {
        Self {
            min_buffer: Duration::from_secs(10),
            max_buffer: Duration::from_secs(15),
            chunk_bytes: 128 * 1024,
            ..Self::conservative()
        }
    }

    pub fn with_chunk_bytes(mut self, bytes: usize) -> Self {
        self.chunk_bytes = bytes;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_for_playback > self.min_buffer {
            return Err("buffer_for_playback cannot exceed min_buffer".to_string());
        }

        if self.min_buffer > self.max_buffer {
            return Err("min_buffer cannot exceed max_buffer".to_string());
        }

        if self.buffer_for_playback_after_rebuffer < self.buffer_for_playback {
            return Err(
                "buffer_for_playback_after_rebuffer must be at least buffer_for_playback"
                    .to_string(),
            );
        }

        if self.chunk_bytes == 0 {
            return Err("chunk_bytes must be > 0".to_string());
        }

        if self.http_timeout.is_zero() {
            return Err("http_timeout must be > 0".to_string());
        }

        Ok(())
    }

    /// Thresholds in the form backends consume.
    pub fn buffering_policy(&self) -> BufferingPolicy {
        BufferingPolicy {
            min_buffer: self.min_buffer,
            max_buffer: self.max_buffer,
            buffer_for_playback: self.buffer_for_playback,
            buffer_for_playback_after_rebuffer: self.buffer_for_playback_after_rebuffer,
        }
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Top-level configuration for the playback core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Progress sampling cadence.
    ///
    /// Default: 250 ms.
    #[serde(default = "default_sample_interval")]
    pub sample_interval: Duration,

    /// `skip_previous` restarts the current track instead of moving back once
    /// playback is at or past this position.
    ///
    /// Default: 3 seconds.
    #[serde(default = "default_restart_threshold")]
    pub restart_threshold: Duration,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_interval: default_sample_interval(),
            restart_threshold: default_restart_threshold(),
            streaming: StreamingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn with_restart_threshold(mut self, threshold: Duration) -> Self {
        self.restart_threshold = threshold;
        self
    }

    pub fn with_streaming(mut self, streaming: StreamingConfig) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_interval.is_zero() {
            return Err("sample_interval must be > 0".to_string());
        }

        self.streaming
            .validate()
            .map_err(|e| format!("streaming: {}", e))?;
        self.cache.validate().map_err(|e| format!("cache: {}", e))?;

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_min_buffer() -> Duration {
    Duration::from_secs(15)
}

fn default_max_buffer() -> Duration {
    Duration::from_secs(50)
}

fn default_buffer_for_playback() -> Duration {
    Duration::from_millis(2500)
}

fn default_buffer_for_playback_after_rebuffer() -> Duration {
    Duration::from_secs(5)
}

fn default_chunk_bytes() -> usize {
    256 * 1024
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_sample_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_restart_threshold() -> Duration {
    Duration::from_secs(3)
}
