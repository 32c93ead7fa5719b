// Wire types for the backend JSON payloads.
//
// Field names follow the backend exactly. Enumerated fields (`status`,
// `type`, `priority`) stay as raw strings here; the core crate maps them
// into typed enums and tolerates unknown values there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic placement of a dustbin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
}

/// One monitored container, as returned by `GET /api/dustbins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dustbin {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,
    pub name: String,
    pub location: Location,
    pub fill_level: f64,
    pub battery_level: f64,
    pub status: String,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub is_full: bool,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

/// An alert derived by the backend from device telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,
    #[serde(default, deserialize_with = "id::deserialize_opt")]
    pub dustbin_id: Option<String>,
    pub dustbin_name: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

/// Aggregate fleet statistics from `GET /api/dashboard/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_bins: u32,
    pub full_bins: u32,
    pub offline_bins: u32,
    pub low_battery_bins: u32,
    pub unread_notifications: u32,
    pub avg_fill_level: f64,
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
}

/// Health probe payload from `GET /api/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub bins_count: u32,
}

/// Response to `POST /api/initialize-demo-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoDataAck {
    pub message: String,
    #[serde(default)]
    pub bins: u32,
}

/// Response to `POST /api/simulate/iot-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationAck {
    pub message: String,
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAck {
    pub message: String,
}

/// ISO-8601 timestamps, tolerating naive values (no offset) as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            ser: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => ser.serialize_str(&dt.to_rfc3339()),
                None => ser.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            de: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(de)?;
            raw.map(|s| {
                super::parse(&s)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}")))
            })
            .transpose()
        }
    }
}

/// Identifiers arrive as UUID strings, but integer ids are accepted too.
mod id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    impl From<RawId> for String {
        fn from(raw: RawId) -> Self {
            match raw {
                RawId::Text(s) => s,
                RawId::Number(n) => n.to_string(),
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        RawId::deserialize(de).map(String::from)
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Option::<RawId>::deserialize(de).map(|raw| raw.map(String::from))
    }
}
