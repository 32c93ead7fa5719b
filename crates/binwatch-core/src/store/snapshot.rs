// ── Atomically replaceable fleet snapshot ──
//
// A `Snapshot` bundles devices, notifications and stats from one poll.
// The store holds at most one, behind a `watch` channel: readers clone an
// `Arc` under the channel's read lock, writers swap under its write lock,
// so nobody ever sees devices from one poll next to stats from another.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{Device, EntityId, Notification, Stats};

use super::stream::SnapshotStream;

type SnapshotCell = watch::Sender<Option<Arc<Snapshot>>>;

/// One consistent point-in-time view of the fleet.
///
/// Collections are shared `Arc`s, so cloning a snapshot is cheap and a
/// copy-on-write transform only reallocates the part it touches.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub devices: Arc<Vec<Arc<Device>>>,
    /// Newest first by timestamp.
    pub notifications: Arc<Vec<Arc<Notification>>>,
    pub stats: Arc<Stats>,
    /// When the poll that produced this snapshot completed.
    pub fetched_at: DateTime<Utc>,
    /// Monotonic commit counter, assigned by the store.
    pub generation: u64,
}

impl Snapshot {
    /// Build a snapshot from one poll's results.
    ///
    /// Notifications are stably re-sorted newest-first; the backend already
    /// sends them that way, so this only guards against clock ties and
    /// misbehaving backends.
    pub fn new(
        devices: Vec<Device>,
        mut notifications: Vec<Notification>,
        stats: Stats,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self {
            devices: Arc::new(devices.into_iter().map(Arc::new).collect()),
            notifications: Arc::new(notifications.into_iter().map(Arc::new).collect()),
            stats: Arc::new(stats),
            fetched_at,
            generation: 0,
        }
    }

    pub fn device(&self, id: &EntityId) -> Option<&Arc<Device>> {
        self.devices.iter().find(|d| d.id == *id)
    }

    pub fn notification(&self, id: &EntityId) -> Option<&Arc<Notification>> {
        self.notifications.iter().find(|n| n.id == *id)
    }

    pub fn online_count(&self) -> usize {
        self.devices.iter().filter(|d| d.is_online()).count()
    }

    /// Unread notifications among the ones this snapshot carries. May be
    /// lower than `stats.unread_notifications` when the list is truncated.
    pub fn unread_in_view(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.fetched_at)
    }
}

/// Process-wide holder of the latest committed [`Snapshot`].
///
/// Empty until the first successful poll; `current()` returns `None` in
/// that state. Only whole-snapshot writes are exposed publicly. Field-level
/// edits go through [`Monitor::mark_read`](crate::Monitor::mark_read),
/// which uses the crate-private [`update`](Self::update).
#[derive(Debug)]
pub struct SnapshotStore {
    cell: SnapshotCell,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        Self { cell }
    }

    /// Atomically swap in a new snapshot.
    ///
    /// Returns the previous snapshot (if any) and the committed one, read
    /// under the same lock, so callers can diff exactly what changed.
    pub fn replace(&self, snapshot: Snapshot) -> (Option<Arc<Snapshot>>, Arc<Snapshot>) {
        let mut next = Arc::new(snapshot);
        let mut previous = None;
        self.cell.send_modify(|slot| {
            Arc::make_mut(&mut next).generation = slot.as_ref().map_or(1, |s| s.generation + 1);
            previous = slot.replace(Arc::clone(&next));
        });
        (previous, next)
    }

    /// Derive a new snapshot from the current one under the write lock.
    ///
    /// `f` returns `None` to leave the store untouched (and subscribers
    /// un-notified). Does nothing before the first commit.
    pub(crate) fn update<F>(&self, f: F) -> Option<Arc<Snapshot>>
    where
        F: FnOnce(&Snapshot) -> Option<Snapshot>,
    {
        let mut committed = None;
        self.cell.send_if_modified(|slot| {
            let Some(current) = slot.as_ref() else {
                return false;
            };
            let Some(mut next) = f(current) else {
                return false;
            };
            next.generation = current.generation + 1;
            let next = Arc::new(next);
            *slot = Some(Arc::clone(&next));
            committed = Some(next);
            true
        });
        committed
    }

    /// The latest committed snapshot, or `None` before the first poll.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.cell.borrow().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Subscribe to commits.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.cell.subscribe())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{DeviceStatus, Location, NotificationKind, Priority};

    pub(crate) fn device(id: &str, fill: f64, status: DeviceStatus) -> Device {
        Device {
            id: EntityId::from(id),
            name: format!("Bin {id}"),
            location: Location {
                latitude: 40.78,
                longitude: -73.96,
                address: String::new(),
            },
            fill_level: fill,
            battery_level: 80.0,
            status,
            temperature: None,
            humidity: None,
            last_updated: Utc::now(),
        }
    }

    fn stats(total: u32) -> Stats {
        Stats {
            total_bins: total,
            full_bins: 0,
            offline_bins: 0,
            low_battery_bins: 0,
            avg_fill_level: 0.0,
            unread_notifications: 0,
            last_updated: Utc::now(),
        }
    }

    fn snapshot_of(n: usize) -> Snapshot {
        let devices = (0..n)
            .map(|i| device(&i.to_string(), 10.0, DeviceStatus::Online))
            .collect();
        let total = u32::try_from(n).unwrap();
        Snapshot::new(devices, Vec::new(), stats(total), Utc::now())
    }

    #[test]
    fn store_starts_uninitialized() {
        let store = SnapshotStore::new();
        assert!(store.current().is_none());
        assert!(!store.is_initialized());
    }

    #[test]
    fn replace_swaps_whole_snapshot_and_bumps_generation() {
        let store = SnapshotStore::new();
        let (prev, first) = store.replace(snapshot_of(2));
        assert!(prev.is_none());
        assert_eq!(first.generation, 1);

        let (prev, second) = store.replace(snapshot_of(3));
        assert_eq!(prev.unwrap().devices.len(), 2);
        assert_eq!(second.generation, 2);

        let current = store.current().unwrap();
        assert_eq!(current.stats.total_bins as usize, current.devices.len());
    }

    #[test]
    fn concurrent_readers_never_see_torn_snapshots() {
        let store = Arc::new(SnapshotStore::new());
        store.replace(snapshot_of(1));

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for n in 1..200 {
                    store.replace(snapshot_of(n % 7 + 1));
                }
            })
        };
        for _ in 0..500 {
            let snap = store.current().unwrap();
            assert_eq!(snap.stats.total_bins as usize, snap.devices.len());
        }
        writer.join().unwrap();
    }

    #[test]
    fn update_is_noop_before_first_commit() {
        let store = SnapshotStore::new();
        let out = store.update(|s| Some(s.clone()));
        assert!(out.is_none());
        assert!(store.current().is_none());
    }

    #[test]
    fn update_returning_none_keeps_generation() {
        let store = SnapshotStore::new();
        store.replace(snapshot_of(1));
        assert!(store.update(|_| None).is_none());
        assert_eq!(store.current().unwrap().generation, 1);
    }

    #[test]
    fn notifications_are_sorted_newest_first() {
        let now = Utc::now();
        let note = |id: &str, mins: i64| Notification {
            id: EntityId::from(id),
            dustbin_id: None,
            dustbin_name: "Bin".into(),
            kind: NotificationKind::Full,
            priority: Priority::High,
            message: String::new(),
            timestamp: now - chrono::Duration::minutes(mins),
            is_read: false,
        };
        let snap = Snapshot::new(
            Vec::new(),
            vec![note("old", 30), note("new", 1), note("mid", 10)],
            stats(0),
            now,
        );
        let order: Vec<_> = snap.notifications.iter().map(|n| n.id.to_string()).collect();
        assert_eq!(order, ["new", "mid", "old"]);
    }
}
