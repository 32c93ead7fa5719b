//! Data bridge: connects the [`Monitor`] to TUI actions.
//!
//! Runs as a background task. Starts the monitor (first poll plus the
//! periodic timer), then forwards every monitor event and poller state
//! transition as an [`Action`] until cancelled, and finally stops the
//! timer.

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use binwatch_core::{Monitor, MonitorEvent};

use crate::action::Action;

/// Map one monitor event onto the action the UI understands.
pub fn event_to_action(event: MonitorEvent) -> Action {
    match event {
        MonitorEvent::SnapshotChanged(snapshot) => Action::SnapshotUpdated(snapshot),
        MonitorEvent::MarkersChanged(diff) => Action::MarkersChanged(diff),
        MonitorEvent::PollError(error) => Action::PollFailed(error.to_string()),
        MonitorEvent::ActionFailed { action, error } => Action::ActionFinished {
            action,
            outcome: Err(error.to_string()),
        },
        MonitorEvent::ActionCompleted { action, message } => Action::ActionFinished {
            action,
            outcome: Ok(message),
        },
    }
}

pub async fn spawn_data_bridge(
    monitor: Monitor,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    // Subscribe before starting so the first poll's events are not missed.
    let mut events = monitor.events();
    let mut poller_state = monitor.poller_state();

    if let Some(snapshot) = monitor.snapshot() {
        let _ = action_tx.send(Action::SnapshotUpdated(snapshot));
    }
    let _ = action_tx.send(Action::PollerStateChanged(*poller_state.borrow_and_update()));

    let mut start = Box::pin(monitor.start());
    let mut started = false;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            result = &mut start, if !started => {
                started = true;
                match result {
                    Ok(()) => info!("monitor started"),
                    // Already broadcast as a poll error.
                    Err(e) => warn!(error = %e, "first poll failed"),
                }
            }

            Ok(()) = poller_state.changed() => {
                let state = *poller_state.borrow_and_update();
                let _ = action_tx.send(Action::PollerStateChanged(state));
            }

            received = events.recv() => match received {
                Ok(event) => {
                    let _ = action_tx.send(event_to_action(event));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // The current snapshot resyncs every screen, markers included.
                    warn!(skipped, "data bridge lagged behind monitor events");
                    if let Some(snapshot) = monitor.snapshot() {
                        let _ = action_tx.send(Action::SnapshotUpdated(snapshot));
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    drop(start);
    monitor.shutdown().await;
    debug!("data bridge shut down");
}

#[cfg(test)]
mod tests {
    use binwatch_core::{CoreError, ManualAction};

    use super::*;

    #[test]
    fn action_failures_keep_their_message() {
        let action = event_to_action(MonitorEvent::ActionFailed {
            action: ManualAction::SimulateUpdate,
            error: CoreError::BackendError {
                status: 500,
                message: "boom".into(),
            },
        });
        match action {
            Action::ActionFinished {
                action: ManualAction::SimulateUpdate,
                outcome: Err(msg),
            } => assert!(msg.contains("boom"), "{msg}"),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn poll_errors_become_poll_failed() {
        let action = event_to_action(MonitorEvent::PollError(CoreError::NetworkFailure {
            reason: "connection refused".into(),
        }));
        assert!(matches!(action, Action::PollFailed(msg) if msg.contains("connection refused")));
    }
}
