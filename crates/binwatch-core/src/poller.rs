// ── Poll/action single-flight state ──
//
// One state tag shared by the periodic timer, manual refreshes and the
// demo actions. Starting any backend round-trip is a compare-and-set from
// `Idle`; whoever wins holds a `FlightGuard` that puts the tag back to
// `Idle` when dropped, including on early return or cancellation.

use std::fmt;

use strum::Display;
use tokio::sync::watch;

/// User-triggered operations that write to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ManualAction {
    ResetDemoData,
    SimulateUpdate,
    MarkRead,
}

/// What the poller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    #[default]
    Idle,
    Polling,
    Acting(ManualAction),
}

impl PollerState {
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Polling => f.write_str("polling"),
            Self::Acting(action) => write!(f, "acting: {action}"),
        }
    }
}

/// Single-flight gate for backend round-trips.
#[derive(Debug)]
pub struct Poller {
    state: watch::Sender<PollerState>,
}

impl Poller {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self { state }
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    /// Leave `Idle` for `next`, or return `None` if something else is in
    /// flight.
    pub fn try_begin(&self, next: PollerState) -> Option<FlightGuard<'_>> {
        let acquired = self.state.send_if_modified(|state| {
            if state.is_idle() && !next.is_idle() {
                *state = next;
                true
            } else {
                false
            }
        });
        acquired.then_some(FlightGuard { poller: self })
    }

    /// Wait for `Idle`, then leave it for `next`.
    ///
    /// Used for refreshes that must follow a completed write: the refresh
    /// is never dropped, only queued behind whatever is in flight.
    pub async fn begin_when_idle(&self, next: PollerState) -> FlightGuard<'_> {
        let mut rx = self.state.subscribe();
        loop {
            if let Some(guard) = self.try_begin(next) {
                return guard;
            }
            // The sender lives in `self`, so this cannot observe a closed channel.
            let _ = rx.wait_for(|s| s.is_idle()).await;
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of holding the in-flight slot. Dropping it returns to `Idle`.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    poller: &'a Poller,
}

impl FlightGuard<'_> {
    /// Move to another non-idle state without releasing the slot
    /// (e.g. `Acting` → `Polling` once a write has committed).
    pub fn advance(&self, next: PollerState) {
        if !next.is_idle() {
            self.poller.state.send_replace(next);
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.poller.state.send_replace(PollerState::Idle);
    }
}
