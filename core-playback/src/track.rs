//! Track value type handed in by the catalog.

use serde::{Deserialize, Serialize};

/// Immutable description of one playable item.
///
/// Identity is [`Track::id`]; [`Track::uri`] decides which engine plays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    /// Local path, platform content reference, or `http(s)` URL.
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub artwork_uri: Option<String>,
    /// Catalog duration, used until the engine reports the real one.
    #[serde(default)]
    pub advisory_duration_ms: Option<u64>,
}

impl Track {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            artwork_uri: None,
            advisory_duration_ms: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    pub fn with_artwork_uri(mut self, uri: impl Into<String>) -> Self {
        self.artwork_uri = Some(uri.into());
        self
    }

    pub fn with_advisory_duration_ms(mut self, duration_ms: u64) -> Self {
        self.advisory_duration_ms = Some(duration_ms);
        self
    }

    /// A track is only queueable when its locator is non-blank.
    pub fn has_playable_uri(&self) -> bool {
        !self.uri.trim().is_empty()
    }

    /// Lower-cased URI scheme, if the locator has one.
    pub fn scheme(&self) -> Option<String> {
        uri_scheme(&self.uri)
    }
}

/// Lower-cased scheme of `uri`, or `None` for bare paths.
///
/// Single-letter schemes are treated as Windows drive letters.
pub fn uri_scheme(uri: &str) -> Option<String> {
    let (scheme, _) = uri.trim().split_once(':')?;
    let valid = scheme.len() > 1
        && scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}
