// ── Wire → domain conversion ──
//
// Infallible: the API crate has already validated shapes, and enumerated
// strings degrade to catch-all variants instead of failing.

use binwatch_api::types as wire;

use crate::model::{
    BackendStatus, Device, DeviceStatus, EntityId, Location, Notification, NotificationKind,
    Priority, Stats,
};

impl From<wire::Location> for Location {
    fn from(l: wire::Location) -> Self {
        Self {
            latitude: l.latitude,
            longitude: l.longitude,
            address: l.address,
        }
    }
}

impl From<wire::Dustbin> for Device {
    fn from(d: wire::Dustbin) -> Self {
        Self {
            id: EntityId::from(d.id),
            name: d.name,
            location: d.location.into(),
            fill_level: d.fill_level,
            battery_level: d.battery_level,
            status: DeviceStatus::from_wire(&d.status),
            temperature: d.temperature,
            humidity: d.humidity,
            last_updated: d.last_updated,
        }
    }
}

impl From<wire::Notification> for Notification {
    fn from(n: wire::Notification) -> Self {
        Self {
            id: EntityId::from(n.id),
            dustbin_id: n.dustbin_id.map(EntityId::from),
            dustbin_name: n.dustbin_name,
            kind: NotificationKind::from_wire(&n.kind),
            priority: Priority::from_wire(&n.priority),
            message: n.message,
            timestamp: n.timestamp,
            is_read: n.is_read,
        }
    }
}

impl From<wire::DashboardStats> for Stats {
    fn from(s: wire::DashboardStats) -> Self {
        Self {
            total_bins: s.total_bins,
            full_bins: s.full_bins,
            offline_bins: s.offline_bins,
            low_battery_bins: s.low_battery_bins,
            avg_fill_level: s.avg_fill_level,
            unread_notifications: s.unread_notifications,
            last_updated: s.last_updated,
        }
    }
}

impl From<wire::ApiStatus> for BackendStatus {
    fn from(s: wire::ApiStatus) -> Self {
        Self {
            message: s.message,
            status: s.status,
            bins_count: s.bins_count,
        }
    }
}
