//! Workspace placeholder crate.
//!
//! Exposes feature flags that map onto the workspace crates so a host
//! application can depend on `cadence-workspace` alone:
//!
//! - `desktop-shims` (default): the full `core-service` façade with the
//!   reqwest-backed HTTP bridge.
//! - `playback-only`: just `core-playback`, for hosts that wire their own
//!   bridges and event plumbing.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "playback-only")]
pub use core_playback as playback;
