//! Tracing subscriber setup for the binary

use std::env;

use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter, Layer as _};

/// Environment variable holding extra filter directives
pub const LOG_ENV: &str = "WEBVAULT_LOG";

/// Filter directive for a `-v` count, followed by any `WEBVAULT_LOG` directives
///
/// Later directives win, so `WEBVAULT_LOG=debug` overrides the default level.
pub fn directive(verbosity: u8, extra: Option<&str>) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    match extra.map(str::trim).filter(|s| !s.is_empty()) {
        Some(extra) => format!("{},{}", level, extra),
        None => level.to_string(),
    }
}

/// Install the global subscriber, writing to stderr
///
/// Stdout is left for command output. Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let extra = env::var(LOG_ENV).ok();
    let filter = EnvFilter::new(directive(verbosity, extra.as_deref()));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init();
    tracing::debug!("initialized tracing subscriber");
}
