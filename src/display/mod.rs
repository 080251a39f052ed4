//! Display formatting for terminal output
//!
//! Human-readable sizes and ages, and the artifact table printed by
//! `webvault list`.

pub mod artifact;

pub use artifact::format_artifact_list;

use chrono::{DateTime, Utc};

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format how long ago `at` was, relative to `now`
///
/// Timestamps in the future (clock skew between hosts) show as "0s".
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total_seconds = now.signed_duration_since(at).num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}
