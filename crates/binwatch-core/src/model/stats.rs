// ── Aggregate statistics ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fleet-wide aggregates as computed by the backend.
///
/// Treated as opaque: the client never derives these itself, apart from
/// the optimistic unread decrement and the consistency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_bins: u32,
    pub full_bins: u32,
    pub offline_bins: u32,
    pub low_battery_bins: u32,
    pub avg_fill_level: f64,
    pub unread_notifications: u32,
    pub last_updated: DateTime<Utc>,
}

/// Backend health probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub message: String,
    pub status: String,
    pub bins_count: u32,
}

impl BackendStatus {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}
