// ── Domain model ──
//
// Typed counterparts of the backend wire payloads. Enumerated fields are
// parsed leniently: unknown strings land in a catch-all variant so a new
// backend status never fails a whole poll.

mod device;
mod entity_id;
mod notification;
mod stats;

pub use device::{Device, DeviceStatus, Location};
pub use entity_id::EntityId;
pub use notification::{Notification, NotificationKind, Priority};
pub use stats::{BackendStatus, Stats};
