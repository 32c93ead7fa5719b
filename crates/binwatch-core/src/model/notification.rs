// ── Notification domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

/// What the alert is about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum NotificationKind {
    Full,
    BatteryLow,
    Offline,
    Maintenance,
    #[default]
    #[serde(other)]
    Other,
}

impl NotificationKind {
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

/// Alert urgency, ordered most urgent first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Other,
}

impl Priority {
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

/// An alert raised by the backend for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,
    pub dustbin_id: Option<EntityId>,
    pub dustbin_name: String,
    pub kind: NotificationKind,
    pub priority: Priority,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_priorities_fall_back() {
        assert_eq!(NotificationKind::from_wire("battery_low"), NotificationKind::BatteryLow);
        assert_eq!(NotificationKind::from_wire("flood"), NotificationKind::Other);
        assert_eq!(Priority::from_wire("critical"), Priority::Critical);
        assert_eq!(Priority::from_wire("urgent"), Priority::Other);
    }

    #[test]
    fn priority_orders_most_urgent_first() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::Low < Priority::Other);
    }
}
