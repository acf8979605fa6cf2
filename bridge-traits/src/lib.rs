//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and
//! platform-specific implementations. Each trait is a capability the core
//! needs but that differs per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Audio
//! - [`AudioBackendFactory`](playback::AudioBackendFactory) - Creates one decode/output resource per loaded track
//! - [`AudioBackend`](playback::AudioBackend) - Prepare, transport control and position readout
//! - [`StreamReader`](playback::StreamReader) - Random-access bytes for network media (implemented by the core)
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Ranged `GET` requests for streamed media
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop` (HTTP only) | ✅ In Progress |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with a descriptive error when a required capability
//! is missing:
//!
//! ```ignore
//! let backends = config.audio_backends
//!     .ok_or_else(|| CoreError::CapabilityMissing {
//!         capability: "AudioBackendFactory".to_string(),
//!         message: "No audio backend provided. Inject the platform player.".to_string(),
//!     })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks.

pub mod error;
pub mod http;
pub mod log;
pub mod playback;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    AudioBackend, AudioBackendFactory, AudioSource, BackendKind, BufferingPolicy, PrepareOptions,
    StreamReader,
};
