// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use crate::classify::{BatteryTier, FillTier, classify_battery, classify_fill};

/// Connectivity reported by the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DeviceStatus {
    Online,
    Offline,
    Maintenance,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DeviceStatus {
    /// Parse a backend status string, falling back to `Unknown`.
    pub fn from_wire(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Geographic placement of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// A monitored waste container.
///
/// `fill_level` and `battery_level` are stored exactly as reported, even
/// when sensor noise pushes them outside 0..=100. Clamp at render time
/// with [`clamp_percent`](crate::classify::clamp_percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    pub name: String,
    pub location: Location,
    pub fill_level: f64,
    pub battery_level: f64,
    pub status: DeviceStatus,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

impl Device {
    pub fn fill_tier(&self) -> FillTier {
        classify_fill(self.fill_level, self.status)
    }

    pub fn battery_tier(&self) -> BatteryTier {
        classify_battery(self.battery_level)
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_values() {
        assert_eq!(DeviceStatus::from_wire("online"), DeviceStatus::Online);
        assert_eq!(DeviceStatus::from_wire("OFFLINE"), DeviceStatus::Offline);
        assert_eq!(DeviceStatus::from_wire("maintenance"), DeviceStatus::Maintenance);
    }

    #[test]
    fn unknown_status_is_not_online() {
        let status = DeviceStatus::from_wire("rebooting");
        assert_eq!(status, DeviceStatus::Unknown);
        assert!(!status.is_online());
    }
}
