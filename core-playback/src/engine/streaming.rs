//! Network media served through the shared cache.

use super::driver::{BackendEngine, SourceResolver};
use super::{EngineEvents, EngineKind};
use crate::cache::{ByteCache, CacheProvider};
use crate::config::StreamingConfig;
use crate::error::{PlaybackError, Result};
use crate::streaming::CachedStreamReader;
use crate::track::Track;
use bridge_traits::error::BridgeError;
use bridge_traits::http::HttpClient;
use bridge_traits::playback::{AudioBackendFactory, AudioSource, PrepareOptions};
use core_runtime::logging::redact_url;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine for `http(s)` locators.
pub type StreamingEngine = BackendEngine<StreamingSource>;

impl StreamingEngine {
    pub fn new(
        backends: Arc<dyn AudioBackendFactory>,
        events: EngineEvents,
        http: Arc<dyn HttpClient>,
        cache: Arc<dyn CacheProvider>,
        config: StreamingConfig,
    ) -> Self {
        BackendEngine::with_resolver(
            StreamingSource {
                http,
                cache,
                config,
            },
            backends,
            events,
        )
    }
}

/// Resolver for [`StreamingEngine`].
pub struct StreamingSource {
    http: Arc<dyn HttpClient>,
    cache: Arc<dyn CacheProvider>,
    config: StreamingConfig,
}

impl StreamingSource {
    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }
}

/// Cache lookup never fails the load; any problem degrades to `None`.
async fn acquire_cache(provider: Arc<dyn CacheProvider>) -> Option<Arc<dyn ByteCache>> {
    match tokio::task::spawn_blocking(move || provider.acquire()).await {
        Ok(Ok(cache)) => Some(cache),
        Ok(Err(e)) => {
            warn!(error = %e, "Network cache unavailable, streaming uncached");
            None
        }
        Err(e) => {
            warn!(error = %e, "Network cache setup panicked, streaming uncached");
            None
        }
    }
}

impl SourceResolver for StreamingSource {
    fn kind(&self) -> EngineKind {
        EngineKind::Streaming
    }

    fn resolve(&self, track: &Track) -> BoxFuture<'static, Result<AudioSource>> {
        let url = track.uri.trim().to_string();
        let http = self.http.clone();
        let provider = self.cache.clone();
        let config = self.config.clone();

        async move {
            let cache = acquire_cache(provider).await;
            let reader = CachedStreamReader::new(url.clone(), http, cache, &config);
            debug!(
                url = %redact_url(&url),
                cached = reader.is_cached(),
                "Stream reader ready"
            );
            Ok(AudioSource::Stream {
                url,
                reader: Arc::new(reader),
            })
        }
        .boxed()
    }

    fn prepare_options(&self, autoplay: bool, volume: f32) -> PrepareOptions {
        PrepareOptions {
            play_when_ready: autoplay,
            initial_volume: volume,
            buffering: Some(self.config.buffering_policy()),
        }
    }

    fn playback_failure(&self, error: BridgeError) -> PlaybackError {
        PlaybackError::Interrupted(format!("stream lost: {}", error))
    }
}
