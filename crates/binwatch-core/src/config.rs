// ── Runtime monitor configuration ──
//
// Describes which backend to watch and how often. The CLI and TUI build a
// `MonitorConfig` from their config files and flags; core never reads
// config files itself.

use std::time::Duration;

use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = binwatch_api::transport::DEFAULT_TIMEOUT;
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 20;

/// Configuration for watching a single backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Backend root URL (e.g., `http://localhost:8000`).
    pub url: Url,
    /// Upper bound on every backend request. A timed-out request is a
    /// network failure and frees the in-flight slot.
    pub timeout: Duration,
    /// Period of the background poll. `Duration::ZERO` disables the timer.
    pub poll_interval: Duration,
    /// How many notifications each poll requests.
    pub notification_limit: u32,
}

impl MonitorConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
        }
    }
}
