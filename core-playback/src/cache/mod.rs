//! # Network Cache
//!
//! Bounded in-memory cache for streamed media, shared by every streaming
//! engine in the process.
//!
//! - [`NetworkCache`]: LRU over chunk keys, bounded by total bytes
//! - [`CacheProvider`]: indirection that lets tests inject a stub cache or
//!   force the uncached path
//!
//! The coordinator never sees this module; only the streaming engine does.

mod config;
mod network;
mod provider;
mod stats;

pub use config::CacheConfig;
pub use network::{ByteCache, NetworkCache};
pub use provider::{CacheProvider, FixedCacheProvider, SharedCacheProvider};
pub use stats::CacheStats;
