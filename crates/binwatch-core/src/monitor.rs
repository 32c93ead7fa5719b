// ── Fleet monitor ──
//
// Lifecycle and orchestration for one backend: periodic polling, manual
// actions, optimistic read flips, and the outbound event feed consumed by
// the CLI and TUI. All backend traffic funnels through the `Poller` gate
// so a poll or action is never duplicated while another is in flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use binwatch_api::{BinwatchClient, TransportConfig};

use crate::config::MonitorConfig;
use crate::consistency;
use crate::error::CoreError;
use crate::model::{BackendStatus, Device, EntityId, Notification};
use crate::notify;
use crate::poller::{ManualAction, Poller, PollerState};
use crate::reconcile::{MarkerDiff, reconcile};
use crate::store::{Snapshot, SnapshotStore, SnapshotStream};

const EVENT_CHANNEL_SIZE: usize = 64;

// ── Events ───────────────────────────────────────────────────────

/// Outbound notifications for presentation layers.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A new snapshot was committed (poll or optimistic update).
    SnapshotChanged(Arc<Snapshot>),
    /// The device id set was diffed against the previous poll.
    MarkersChanged(Arc<MarkerDiff>),
    /// A poll failed; the previous snapshot is still current.
    PollError(CoreError),
    /// A manual action's backend write failed.
    ActionFailed {
        action: ManualAction,
        error: CoreError,
    },
    /// A manual action's backend write succeeded.
    ActionCompleted {
        action: ManualAction,
        message: String,
    },
}

// ── Monitor ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Call [`start()`](Self::start)
/// to run the first poll and the background timer, and
/// [`shutdown()`](Self::shutdown) to tear the timer down.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: BinwatchClient,
    store: SnapshotStore,
    poller: Poller,
    event_tx: broadcast::Sender<MonitorEvent>,
    cancel: CancellationToken,
    /// Child token for the current run, replaced on restart.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Create a monitor for `config`. Does NOT poll.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::with_timeout(config.timeout);
        let client = BinwatchClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Create a monitor around a pre-built client.
    pub fn with_client(config: MonitorConfig, client: BinwatchClient) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                store: SnapshotStore::new(),
                poller: Poller::new(),
                event_tx,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the first poll, then start the periodic timer.
    ///
    /// The timer is started even if the first poll fails; the error is
    /// returned (and broadcast) so callers can show it.
    ///
    /// The timer task holds its own handle to the monitor, so dropping every
    /// `Monitor` does not stop it. Call [`shutdown`](Self::shutdown) when done.
    pub async fn start(&self) -> Result<(), CoreError> {
        let first = self.poll_now().await.map(|_| ());

        let period = self.inner.config.poll_interval;
        if !period.is_zero() {
            let child = {
                let mut guard = self.inner.cancel_child.lock().await;
                if guard.is_cancelled() {
                    *guard = self.inner.cancel.child_token();
                }
                guard.clone()
            };
            let mut handles = self.inner.task_handles.lock().await;
            if handles.is_empty() {
                handles.push(tokio::spawn(poll_task(self.clone(), period, child)));
                info!(interval_secs = period.as_secs(), "poll timer started");
            }
        }

        first
    }

    /// Stop the periodic timer and wait for it to exit.
    ///
    /// A poll already in flight is allowed to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("monitor stopped");
    }

    /// One-shot: run a closure against a monitor with no timer.
    pub async fn oneshot<F, Fut, T>(config: MonitorConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Monitor) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.poll_interval = Duration::ZERO;

        let monitor = Monitor::new(cfg)?;
        let result = f(monitor.clone()).await;
        monitor.shutdown().await;
        result
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Poll now, unless something is already in flight.
    pub async fn poll_now(&self) -> Result<Arc<Snapshot>, CoreError> {
        let Some(_guard) = self.inner.poller.try_begin(PollerState::Polling) else {
            return Err(CoreError::Busy {
                operation: "poll".into(),
            });
        };
        self.refresh_held().await
    }

    /// Timer tick: poll if idle, otherwise drop the tick.
    async fn tick(&self) {
        let Some(_guard) = self.inner.poller.try_begin(PollerState::Polling) else {
            debug!(state = %self.inner.poller.state(), "poll in flight, dropping tick");
            return;
        };
        // Failure is already logged and broadcast.
        let _ = self.refresh_held().await;
    }

    /// Fetch and commit a snapshot. Caller must hold the poller slot.
    async fn refresh_held(&self) -> Result<Arc<Snapshot>, CoreError> {
        let snapshot = match self.fetch_snapshot().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "poll failed, keeping previous snapshot");
                self.emit(MonitorEvent::PollError(e.clone()));
                return Err(e);
            }
        };

        let (previous, committed) = self.inner.store.replace(snapshot);
        let diff = match &previous {
            Some(prev) => reconcile(prev.devices.iter().map(|d| &d.id), &committed.devices),
            None => reconcile(std::iter::empty(), &committed.devices),
        };
        debug!(
            generation = committed.generation,
            devices = committed.devices.len(),
            added = diff.to_add.len(),
            removed = diff.to_remove.len(),
            "snapshot committed"
        );

        let report = consistency::check(&committed);
        for d in &report.discrepancies {
            debug!(
                field = %d.field,
                declared = d.declared,
                computed = d.computed,
                "stats disagree with device list"
            );
        }

        self.emit(MonitorEvent::SnapshotChanged(Arc::clone(&committed)));
        self.emit(MonitorEvent::MarkersChanged(Arc::new(diff)));
        Ok(committed)
    }

    /// Fetch all three endpoints concurrently; any failure fails the poll.
    async fn fetch_snapshot(&self) -> Result<Snapshot, CoreError> {
        let client = &self.inner.client;
        let limit = self.inner.config.notification_limit;
        let (bins, notes, stats) = tokio::try_join!(
            client.list_dustbins(),
            client.list_notifications(limit, false),
            client.dashboard_stats(),
        )?;

        Ok(Snapshot::new(
            bins.into_iter().map(Device::from).collect(),
            notes.into_iter().map(Notification::from).collect(),
            stats.into(),
            Utc::now(),
        ))
    }

    // ── Manual actions ───────────────────────────────────────────

    /// Reseed the backend with demo data, then refresh.
    pub async fn reset_demo_data(&self) -> Result<String, CoreError> {
        self.run_action(ManualAction::ResetDemoData, || async move {
            let ack = self.inner.client.initialize_demo_data().await?;
            Ok(format!("{} ({} bins)", ack.message, ack.bins))
        })
        .await
    }

    /// Ask the backend to perturb telemetry, then refresh.
    pub async fn simulate_update(&self) -> Result<String, CoreError> {
        self.run_action(ManualAction::SimulateUpdate, || async move {
            let ack = self.inner.client.simulate_iot_data().await?;
            Ok(ack.message)
        })
        .await
    }

    /// Write, then refresh, holding the slot throughout.
    ///
    /// Rejected with `Busy` if anything is in flight. A failed write skips
    /// the refresh; a failed refresh after a good write goes to the poll
    /// error channel and the action still succeeds.
    async fn run_action<F, Fut>(&self, action: ManualAction, write: F) -> Result<String, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<String, CoreError>>,
    {
        let Some(guard) = self.inner.poller.try_begin(PollerState::Acting(action)) else {
            debug!(%action, state = %self.inner.poller.state(), "rejecting manual action");
            return Err(CoreError::Busy {
                operation: action.to_string(),
            });
        };

        info!(%action, "running manual action");
        let message = match write().await {
            Ok(m) => m,
            Err(e) => {
                warn!(%action, error = %e, "manual action failed");
                self.emit(MonitorEvent::ActionFailed {
                    action,
                    error: e.clone(),
                });
                return Err(e);
            }
        };
        self.emit(MonitorEvent::ActionCompleted {
            action,
            message: message.clone(),
        });

        guard.advance(PollerState::Polling);
        let _ = self.refresh_held().await;
        Ok(message)
    }

    /// Optimistically mark a notification read, write it, then refresh.
    ///
    /// The local flip is applied before the request goes out. If the write
    /// fails the error is returned and broadcast, and the flip stays until
    /// the next poll overwrites it. No retry is attempted.
    pub async fn mark_read(&self, id: &EntityId) -> Result<(), CoreError> {
        if let Some(snap) = self
            .inner
            .store
            .update(|current| notify::try_mark_read(current, id))
        {
            debug!(%id, unread = snap.stats.unread_notifications, "optimistic read flip");
            self.emit(MonitorEvent::SnapshotChanged(snap));
        }

        let action = ManualAction::MarkRead;
        if let Err(e) = self
            .inner
            .client
            .mark_notification_read(id.as_str())
            .await
        {
            let e = CoreError::from(e);
            warn!(%id, error = %e, "mark-read write failed");
            self.emit(MonitorEvent::ActionFailed {
                action,
                error: e.clone(),
            });
            return Err(e);
        }
        self.emit(MonitorEvent::ActionCompleted {
            action,
            message: format!("notification {id} marked read"),
        });

        let _guard = self.inner.poller.begin_when_idle(PollerState::Polling).await;
        let _ = self.refresh_held().await;
        Ok(())
    }

    // ── Direct queries (no snapshot involvement) ─────────────────

    /// Backend health probe.
    pub async fn backend_status(&self) -> Result<BackendStatus, CoreError> {
        Ok(self.inner.client.api_status().await?.into())
    }

    /// Fetch a single device straight from the backend.
    pub async fn device(&self, id: &EntityId) -> Result<Device, CoreError> {
        Ok(self.inner.client.get_dustbin(id.as_str()).await?.into())
    }

    /// Fetch notifications with an explicit limit and filter.
    pub async fn notifications(
        &self,
        limit: u32,
        unread_only: bool,
    ) -> Result<Vec<Notification>, CoreError> {
        let notes = self
            .inner
            .client
            .list_notifications(limit, unread_only)
            .await?;
        Ok(notes.into_iter().map(Notification::from).collect())
    }

    // ── State observation ────────────────────────────────────────

    /// Latest committed snapshot, or `None` before the first good poll.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.current()
    }

    pub fn snapshots(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn poller_state(&self) -> watch::Receiver<PollerState> {
        self.inner.poller.subscribe()
    }

    fn emit(&self, event: MonitorEvent) {
        // No subscribers is fine.
        let _ = self.inner.event_tx.send(event);
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Fixed-period poll loop. Ticks are not delayed by failures and are
/// dropped (not queued) while another round-trip is in flight.
async fn poll_task(monitor: Monitor, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => monitor.tick().await,
        }
    }
    debug!("poll timer stopped");
}
