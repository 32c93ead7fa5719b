// ── Reactive snapshot streams ──
//
// Subscription types for consuming commits from the SnapshotStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::snapshot::Snapshot;

/// A subscription to the snapshot store.
///
/// Provides both point-in-time access and change notification via
/// `changed()` or by converting to a `Stream`.
pub struct SnapshotStream {
    current: Option<Arc<Snapshot>>,
    receiver: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Option<Arc<Snapshot>>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> Option<&Arc<Snapshot>> {
        self.current.as_ref()
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next commit and return it.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            if let Some(snap) = snap {
                self.current = Some(Arc::clone(&snap));
                return Some(snap);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first (if any), then every
    /// subsequent commit.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`, skipping the
/// uninitialized state.
pub struct SnapshotWatchStream {
    inner: WatchStream<Option<Arc<Snapshot>>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Some(snap))) => return Poll::Ready(Some(snap)),
                Poll::Ready(Some(None)) => {}
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::Stats;
    use crate::store::SnapshotStore;

    fn empty() -> Snapshot {
        Snapshot::new(
            Vec::new(),
            Vec::new(),
            Stats {
                total_bins: 0,
                full_bins: 0,
                offline_bins: 0,
                low_battery_bins: 0,
                avg_fill_level: 0.0,
                unread_notifications: 0,
                last_updated: Utc::now(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn changed_yields_each_commit() {
        let store = SnapshotStore::new();
        let mut stream = store.subscribe();
        assert!(stream.current().is_none());

        store.replace(empty());
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.generation, 1);
        assert_eq!(stream.current().unwrap().generation, 1);
        assert_eq!(stream.latest().unwrap().generation, 1);
    }

    #[tokio::test]
    async fn stream_skips_uninitialized_state() {
        use tokio_stream::StreamExt;

        let store = SnapshotStore::new();
        let mut stream = store.subscribe().into_stream();
        store.replace(empty());
        let first = stream.next().await.unwrap();
        assert_eq!(first.generation, 1);
    }
}
