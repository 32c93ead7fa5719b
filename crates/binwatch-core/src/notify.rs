// ── Notification read-state reducer ──
//
// Optimistic read flips as a pure copy-on-write transform over a
// snapshot. Only the notification list and the stats are rebuilt; the
// device list is shared with the input. The next poll replaces the result
// wholesale, which doubles as the rollback path when the backend write
// fails.

use std::sync::Arc;

use crate::model::{EntityId, Notification, Stats};
use crate::store::Snapshot;

/// Flip one notification to read, or `None` if nothing would change
/// (unknown id, or already read).
///
/// On a flip the unread counter in the stats drops by exactly one,
/// saturating at zero. Sequence order is preserved.
pub fn try_mark_read(snapshot: &Snapshot, id: &EntityId) -> Option<Snapshot> {
    let idx = snapshot
        .notifications
        .iter()
        .position(|n| n.id == *id && !n.is_read)?;

    let mut notifications: Vec<Arc<Notification>> = snapshot.notifications.as_ref().clone();
    let mut flipped = notifications[idx].as_ref().clone();
    flipped.is_read = true;
    notifications[idx] = Arc::new(flipped);

    let stats = Stats {
        unread_notifications: snapshot.stats.unread_notifications.saturating_sub(1),
        ..snapshot.stats.as_ref().clone()
    };

    Some(Snapshot {
        devices: Arc::clone(&snapshot.devices),
        notifications: Arc::new(notifications),
        stats: Arc::new(stats),
        fetched_at: snapshot.fetched_at,
        generation: snapshot.generation,
    })
}

/// Flip one notification to read, returning the (possibly unchanged)
/// snapshot. Idempotent.
pub fn mark_read(snapshot: &Snapshot, id: &EntityId) -> Snapshot {
    try_mark_read(snapshot, id).unwrap_or_else(|| snapshot.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{NotificationKind, Priority};

    fn note(id: u64, minutes_ago: i64, is_read: bool) -> Notification {
        Notification {
            id: EntityId::from(id),
            dustbin_id: Some(EntityId::from(1_u64)),
            dustbin_name: "Bin 1".into(),
            kind: NotificationKind::Full,
            priority: Priority::Critical,
            message: format!("alert {id}"),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            is_read,
        }
    }

    fn snapshot(notes: Vec<Notification>, unread: u32) -> Snapshot {
        Snapshot::new(
            Vec::new(),
            notes,
            Stats {
                total_bins: 1,
                full_bins: 1,
                offline_bins: 0,
                low_battery_bins: 0,
                avg_fill_level: 95.0,
                unread_notifications: unread,
                last_updated: Utc::now(),
            },
            Utc::now(),
        )
    }

    fn ids(s: &Snapshot) -> Vec<String> {
        s.notifications.iter().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn mark_read_flips_and_decrements_once() {
        let before = snapshot(vec![note(9, 1, false), note(7, 5, false)], 2);
        let after = mark_read(&before, &EntityId::from(7_u64));

        assert!(after.notification(&EntityId::from(7_u64)).unwrap().is_read);
        assert!(!after.notification(&EntityId::from(9_u64)).unwrap().is_read);
        assert_eq!(after.stats.unread_notifications, 1);
        // input untouched
        assert!(!before.notification(&EntityId::from(7_u64)).unwrap().is_read);
        assert_eq!(before.stats.unread_notifications, 2);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let before = snapshot(vec![note(7, 1, false)], 1);
        let once = mark_read(&before, &EntityId::from(7_u64));
        let twice = mark_read(&once, &EntityId::from(7_u64));

        assert!(twice.notification(&EntityId::from(7_u64)).unwrap().is_read);
        assert_eq!(twice.stats.unread_notifications, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn counter_saturates_at_zero() {
        // Backend says zero unread but the list still shows an unread item.
        let before = snapshot(vec![note(7, 1, false)], 0);
        let after = mark_read(&before, &EntityId::from(7_u64));
        assert_eq!(after.stats.unread_notifications, 0);
        assert!(after.notification(&EntityId::from(7_u64)).unwrap().is_read);
    }

    #[test]
    fn already_read_does_not_decrement() {
        let before = snapshot(vec![note(7, 1, true)], 3);
        assert!(try_mark_read(&before, &EntityId::from(7_u64)).is_none());
        assert_eq!(mark_read(&before, &EntityId::from(7_u64)).stats.unread_notifications, 3);
    }

    #[test]
    fn unknown_id_is_noop() {
        let before = snapshot(vec![note(7, 1, false)], 1);
        assert!(try_mark_read(&before, &EntityId::from(8_u64)).is_none());
    }

    #[test]
    fn order_is_preserved() {
        let before = snapshot(vec![note(3, 30, false), note(1, 1, false), note(2, 10, false)], 3);
        assert_eq!(ids(&before), ["1", "2", "3"]);
        let after = mark_read(&before, &EntityId::from(2_u64));
        assert_eq!(ids(&after), ["1", "2", "3"]);
    }

    #[test]
    fn devices_are_shared_not_copied() {
        let before = snapshot(vec![note(7, 1, false)], 1);
        let after = mark_read(&before, &EntityId::from(7_u64));
        assert!(Arc::ptr_eq(&before.devices, &after.devices));
    }
}
