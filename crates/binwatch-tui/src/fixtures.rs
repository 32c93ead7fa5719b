//! Shared builders for unit tests.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use ratatui::buffer::Buffer;

use binwatch_core::{
    Device, DeviceStatus, EntityId, Location, Notification, NotificationKind, Priority, Snapshot,
    Stats,
};

pub fn device(id: &str, fill: f64, status: DeviceStatus) -> Device {
    Device {
        id: EntityId::from(id),
        name: format!("Bin {id}"),
        location: Location {
            latitude: 40.71,
            longitude: -74.0,
            address: format!("{id} Main St"),
        },
        fill_level: fill,
        battery_level: 80.0,
        status,
        temperature: Some(21.5),
        humidity: None,
        last_updated: Utc::now(),
    }
}

pub fn note(id: &str, minutes_ago: i64, is_read: bool) -> Notification {
    Notification {
        id: EntityId::from(id),
        dustbin_id: None,
        dustbin_name: "Bin 1".into(),
        kind: NotificationKind::Full,
        priority: Priority::High,
        message: format!("alert {id}"),
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
        is_read,
    }
}

pub fn stats(total: u32, unread: u32) -> Stats {
    Stats {
        total_bins: total,
        full_bins: 1,
        offline_bins: 0,
        low_battery_bins: 0,
        avg_fill_level: 62.5,
        unread_notifications: unread,
        last_updated: Utc::now(),
    }
}

pub fn snapshot(devices: Vec<Device>, notes: Vec<Notification>) -> Arc<Snapshot> {
    let unread = u32::try_from(notes.iter().filter(|n| !n.is_read).count()).unwrap();
    let total = u32::try_from(devices.len()).unwrap();
    Arc::new(Snapshot::new(devices, notes, stats(total, unread), Utc::now()))
}

/// Flatten a rendered buffer into newline-separated rows.
pub fn buffer_text(buf: &Buffer) -> String {
    let width = usize::from(buf.area.width);
    buf.content
        .chunks(width)
        .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
