//! Local media: filesystem paths and platform content references.

use super::driver::{BackendEngine, SourceResolver};
use super::{EngineEvents, EngineKind};
use crate::error::{PlaybackError, Result};
use crate::track::{uri_scheme, Track};
use bridge_traits::playback::{AudioBackendFactory, AudioSource};
use futures::future::{self, BoxFuture, FutureExt};
use std::path::PathBuf;
use std::sync::Arc;

/// Engine for everything that is not `http(s)`.
pub type LocalEngine = BackendEngine<LocalSource>;

impl LocalEngine {
    pub fn new(backends: Arc<dyn AudioBackendFactory>, events: EngineEvents) -> Self {
        BackendEngine::with_resolver(LocalSource, backends, events)
    }
}

/// Resolver for [`LocalEngine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSource;

impl SourceResolver for LocalSource {
    fn kind(&self) -> EngineKind {
        EngineKind::Local
    }

    fn resolve(&self, track: &Track) -> BoxFuture<'static, Result<AudioSource>> {
        future::ready(local_source(&track.uri)).boxed()
    }
}

/// Map a locator onto a local [`AudioSource`].
///
/// `file:` URIs and bare paths become [`AudioSource::LocalFile`]; any other
/// scheme is passed through for the host to resolve.
pub fn local_source(uri: &str) -> Result<AudioSource> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(PlaybackError::UnsupportedSource(
            "blank track locator".to_string(),
        ));
    }

    match uri_scheme(uri) {
        Some(scheme) if scheme == "file" => {
            let rest = &uri[scheme.len() + 1..];
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path.is_empty() {
                return Err(PlaybackError::UnsupportedSource(format!(
                    "file URI without a path: {uri}"
                )));
            }
            Ok(AudioSource::LocalFile {
                path: PathBuf::from(path),
            })
        }
        Some(_) => Ok(AudioSource::ContentUri {
            uri: uri.to_string(),
        }),
        None => Ok(AudioSource::LocalFile {
            path: PathBuf::from(uri),
        }),
    }
}
