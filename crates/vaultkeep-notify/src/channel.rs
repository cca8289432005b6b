//! Channel trait and delivery errors.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use vaultkeep_core::NotificationEvent;

/// Per-request timeout applied by every channel's HTTP client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to deliver {channel} notification: {source}")]
    Transport {
        channel: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{channel} endpoint returned status {status}")]
    Status {
        channel: &'static str,
        status: reqwest::StatusCode,
    },
}

/// One configured notification transport.
///
/// Channels format and deliver each event independently; delivery failures are
/// surfaced to the fan-out, never retried.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver one event.
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Humanize a byte count with binary units: "512 B", "1.0 KB", "1.5 MB".
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

    if size < UNIT {
        return format!("{size} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", size as f64 / div as f64, PREFIXES[exp])
}
