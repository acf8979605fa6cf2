//! Logging system demonstration
//!
//! Shows the output formats and the locator helpers used when logging tracks.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use bridge_traits::LogLevel;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::{
    display_locator, init_logging, redact_url, strip_path, LogFormat, LoggingConfig,
};
use std::env;
use tracing::{debug, info, instrument, span, trace, warn, Level};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some(_) => LogFormat::Pretty,
        None => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");

    demo_locators();
    demo_event_bus().await;
    load_track("t1", "https://cdn.example.com/a.mp3?token=secret").await;

    info!("Demo complete");
}

fn demo_locators() {
    let span = span!(Level::INFO, "locators");
    let _enter = span.enter();

    let remote = "https://cdn.example.com/album/track.mp3?sig=abc123";
    let local = "/home/user/Music/album/track.flac";

    info!(url = %redact_url(remote), "Remote locator");
    info!(file = %strip_path(local), "Local locator");
    info!(locator = %display_locator(remote), "Either kind");
}

async fn demo_event_bus() {
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();

    let _ = bus.emit(CoreEvent::Playback(PlaybackEvent::VolumeChanged { percent: 80 }));

    match rx.recv().await {
        Ok(event) => debug!(?event, "Received event"),
        Err(e) => warn!(error = %e, "Event bus closed"),
    }
}

#[instrument(skip(locator), fields(locator = %display_locator(locator)))]
async fn load_track(track_id: &str, locator: &str) {
    trace!("Preparing engine");
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    info!(track_id, "Track ready");
}
