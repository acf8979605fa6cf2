use super::{Engine, EngineEvents, EngineFactory, EngineKind, LocalEngine, StreamingEngine};
use crate::cache::CacheProvider;
use crate::config::StreamingConfig;
use bridge_traits::http::HttpClient;
use bridge_traits::playback::AudioBackendFactory;
use std::sync::Arc;

/// Production [`EngineFactory`]: both variants over one host backend factory.
pub struct BackendEngineFactory {
    backends: Arc<dyn AudioBackendFactory>,
    http: Arc<dyn HttpClient>,
    cache: Arc<dyn CacheProvider>,
    streaming: StreamingConfig,
}

impl BackendEngineFactory {
    pub fn new(
        backends: Arc<dyn AudioBackendFactory>,
        http: Arc<dyn HttpClient>,
        cache: Arc<dyn CacheProvider>,
        streaming: StreamingConfig,
    ) -> Self {
        Self {
            backends,
            http,
            cache,
            streaming,
        }
    }
}

impl EngineFactory for BackendEngineFactory {
    fn create(&self, kind: EngineKind, events: EngineEvents) -> Arc<dyn Engine> {
        match kind {
            EngineKind::Local => Arc::new(LocalEngine::new(self.backends.clone(), events)),
            EngineKind::Streaming => Arc::new(StreamingEngine::new(
                self.backends.clone(),
                events,
                self.http.clone(),
                self.cache.clone(),
                self.streaming.clone(),
            )),
        }
    }
}
