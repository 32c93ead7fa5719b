// ── Identity ──
//
// Device and notification ids are UUID strings on the stock backend, but
// any stable string is accepted. The text is kept exactly as the backend
// sent it, since it is echoed back in request paths. Equality and hashing
// follow the parsed UUID when there is one, so `"7F0C..."` and `"7f0c..."`
// name the same device.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a device or notification.
#[derive(Debug, Clone)]
pub struct EntityId {
    raw: String,
    uuid: Option<Uuid>,
}

/// Comparison key: the parsed UUID, or the raw text for opaque ids.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Key<'a> {
    Uuid(Uuid),
    Opaque(&'a str),
}

impl EntityId {
    pub fn as_uuid(&self) -> Option<&Uuid> {
        self.uuid.as_ref()
    }

    /// The id exactly as the backend issued it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn key(&self) -> Key<'_> {
        match self.uuid {
            Some(u) => Key::Uuid(u),
            None => Key::Opaque(&self.raw),
        }
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self {
            raw: u.to_string(),
            uuid: Some(u),
        }
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        let uuid = Uuid::parse_str(&raw).ok();
        Self { raw, uuid }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::from(n.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
