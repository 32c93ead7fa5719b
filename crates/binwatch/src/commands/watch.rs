//! Live event feed: start the monitor and print one line per event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use binwatch_core::{Hue, Monitor, MonitorEvent};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

#[derive(Debug, Serialize)]
struct EventLine {
    at: DateTime<Utc>,
    #[serde(flatten)]
    event: EventBody,
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum EventBody {
    Snapshot {
        generation: u64,
        bins: usize,
        online: usize,
        full_bins: u32,
        unread: u32,
    },
    Markers {
        added: Vec<String>,
        removed: Vec<String>,
        updated: usize,
    },
    PollError {
        kind: String,
        message: String,
    },
    ActionFailed {
        action: String,
        message: String,
    },
    ActionCompleted {
        action: String,
        message: String,
    },
}

/// Summarize an event. Marker diffs that only update in place are skipped.
fn describe(event: &MonitorEvent) -> Option<EventBody> {
    Some(match event {
        MonitorEvent::SnapshotChanged(snap) => EventBody::Snapshot {
            generation: snap.generation,
            bins: snap.devices.len(),
            online: snap.online_count(),
            full_bins: snap.stats.full_bins,
            unread: snap.stats.unread_notifications,
        },
        MonitorEvent::MarkersChanged(diff) => {
            if diff.is_membership_unchanged() {
                return None;
            }
            EventBody::Markers {
                added: diff.to_add.iter().map(|d| d.id.to_string()).collect(),
                removed: diff.to_remove.iter().map(ToString::to_string).collect(),
                updated: diff.to_update.len(),
            }
        }
        MonitorEvent::PollError(e) => EventBody::PollError {
            kind: e.kind().to_string(),
            message: e.to_string(),
        },
        MonitorEvent::ActionFailed { action, error } => EventBody::ActionFailed {
            action: action.to_string(),
            message: error.to_string(),
        },
        MonitorEvent::ActionCompleted { action, message } => EventBody::ActionCompleted {
            action: action.to_string(),
            message: message.clone(),
        },
    })
}

fn text(line: &EventLine, painter: Painter) -> String {
    let at = painter.dim(&line.at.format("%H:%M:%S").to_string());
    let body = match &line.event {
        EventBody::Snapshot {
            generation,
            bins,
            online,
            full_bins,
            unread,
        } => {
            let full = format!("{full_bins} full");
            let full = if *full_bins > 0 {
                painter.hue(Hue::Red, &full)
            } else {
                full
            };
            format!("snapshot #{generation}: {online}/{bins} online, {full}, {unread} unread")
        }
        EventBody::Markers {
            added,
            removed,
            updated,
        } => format!(
            "markers: +{} -{} ~{updated}",
            added.len(),
            removed.len()
        ),
        EventBody::PollError { kind, message } => {
            painter.hue(Hue::Red, &format!("poll failed ({kind}): {message}"))
        }
        EventBody::ActionFailed { action, message } => {
            painter.hue(Hue::Red, &format!("{action} failed: {message}"))
        }
        EventBody::ActionCompleted { action, message } => {
            painter.hue(Hue::Green, &format!("{action}: {message}"))
        }
    };
    format!("{at} {body}")
}

fn render(line: &EventLine, format: &OutputFormat, painter: Painter) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(line),
        OutputFormat::Yaml => Ok(format!("---\n{}", output::render_yaml(line)?.trim_end())),
        OutputFormat::Table | OutputFormat::Plain => Ok(text(line, painter)),
    }
}

pub async fn handle(monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    let painter = Painter::new(&global.color_mode());
    let format = global.format();

    // Subscribe before starting so the first poll's events are seen.
    let mut events = monitor.events();
    if let Err(e) = monitor.start().await {
        // Already broadcast as a poll error; the timer keeps going.
        warn!(error = %e, "first poll failed");
    }
    info!(
        backend = %monitor.config().url,
        interval_secs = monitor.config().poll_interval.as_secs(),
        "watching, Ctrl-C to stop"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            received = events.recv() => match received {
                Ok(event) => {
                    let Some(body) = describe(&event) else { continue };
                    let line = EventLine { at: Utc::now(), event: body };
                    output::print_output(&render(&line, &format, painter)?, global.quiet);
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event feed lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use binwatch_core::{CoreError, ManualAction};

    use super::*;

    #[test]
    fn json_lines_are_tagged() {
        let line = EventLine {
            at: Utc::now(),
            event: describe(&MonitorEvent::ActionFailed {
                action: ManualAction::SimulateUpdate,
                error: CoreError::NetworkFailure {
                    reason: "refused".into(),
                },
            })
            .unwrap(),
        };
        let json = output::render_json_compact(&line).unwrap();
        assert!(json.contains(r#""event":"action_failed""#), "{json}");
        assert!(json.contains(r#""action":"simulate-update""#), "{json}");
    }

    #[test]
    fn in_place_marker_updates_are_skipped() {
        let diff = binwatch_core::MarkerDiff::default();
        assert!(describe(&MonitorEvent::MarkersChanged(std::sync::Arc::new(diff))).is_none());
    }
}
