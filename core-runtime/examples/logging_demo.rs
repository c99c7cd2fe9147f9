//! Logging system demonstration
//!
//! Shows the output of each format with the kind of events the radar engines
//! emit.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-runtime --example logging_demo
//!
//! # JSON format
//! cargo run -p core-runtime --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run -p core-runtime --example logging_demo -- compact "logging_demo=trace"
//! ```

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, span, trace, warn, Level};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);

    match args.get(2) {
        Some(filter) => config = config.with_filter(filter.clone()),
        // The demo binary is not one of the workspace targets
        None => config = config.with_filter("logging_demo=trace,core_runtime=trace"),
    }

    if let Err(e) = init_logging(config) {
        eprintln!("{}", e);
        return;
    }

    info!(format = ?format, "Logging initialized");

    demo_sync("032").await;
    demo_retention();

    info!("Demo complete");
}

#[instrument]
async fn demo_sync(site: &str) {
    info!("Connecting to mirror");

    for category in ["backgrounds", "frames"] {
        let span = span!(Level::DEBUG, "category", name = category);
        let _enter = span.enter();

        debug!(listed = 12, wanted = 6, "Listed remote directory");
        for minute in [0, 10] {
            trace!(name = %format!("IDR{}.T.20180321050{}.png", site, minute), "Fetching");
        }
    }

    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    info!(fetched = 2, skipped = 4, "Sync finished");
}

fn demo_retention() {
    let span = span!(Level::INFO, "retention");
    let _enter = span.enter();

    warn!(path = "/tmp/radar-cache/IDR032.T.201803190500.png", error = "permission denied", "Failed to remove expired frame");
    info!(targeted = 2, failed = 1, "Cache cleaned");
}
