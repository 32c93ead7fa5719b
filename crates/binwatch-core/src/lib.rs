// binwatch-core: live fleet state for the binwatch client.
//
// Poll results are committed to a `SnapshotStore` as whole snapshots.
// Around it sit pure helpers (classifier, marker diffing, the optimistic
// read-flip reducer, the stats consistency check) and the `Monitor`
// facade that drives periodic polling and manual actions.

pub mod classify;
pub mod config;
pub mod consistency;
pub mod convert;
pub mod error;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod poller;
pub mod reconcile;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{BatteryTier, FillTier, Hue, classify_battery, classify_fill, clamp_percent};
pub use config::MonitorConfig;
pub use consistency::{ComputedStats, ConsistencyReport, Discrepancy, StatField};
pub use error::{CoreError, ErrorKind};
pub use monitor::{Monitor, MonitorEvent};
pub use notify::{mark_read, try_mark_read};
pub use poller::{FlightGuard, ManualAction, Poller, PollerState};
pub use reconcile::{MarkerDiff, MarkerReconciler, MarkerRecord, MarkerSurface, reconcile};
pub use store::{Snapshot, SnapshotStore, SnapshotStream};

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{
    BackendStatus, Device, DeviceStatus, EntityId, Location, Notification, NotificationKind,
    Priority, Stats,
};
