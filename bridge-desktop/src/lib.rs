//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! Only networking has a portable desktop implementation: `HttpClient` over
//! `reqwest` with rustls. Audio output is always injected by the host
//! application because device handling differs too much between desktop
//! audio stacks.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let config = CoreConfig::builder()
//!     .http_client(http_client)
//!     .audio_backends(backends)
//!     .build()?;
//! ```

mod http;

pub use http::ReqwestHttpClient;
