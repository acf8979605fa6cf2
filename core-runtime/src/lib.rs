//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the playback core:
//! - Logging and tracing bootstrap, with locator redaction helpers
//! - Event bus for playback and queue notifications
//!
//! Nothing here knows about engines or queues; `core-playback` and
//! `core-service` build on these pieces.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
