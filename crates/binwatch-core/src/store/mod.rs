// ── Snapshot storage ──
//
// One consistent view of the fleet, replaced wholesale on every successful
// poll and observable through `watch`-backed streams.

mod snapshot;
mod stream;

pub use snapshot::{Snapshot, SnapshotStore};
pub use stream::{SnapshotStream, SnapshotWatchStream};
