//! Settings screen: connection details, backend health, and the demo
//! controls (reset, simulate, refresh).

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Local};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use binwatch_core::{BackendStatus, ManualAction, MonitorConfig, PollerState, Snapshot};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;
use crate::widgets::time_fmt::local_time;

const ACTIVITY_LOG_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActivityEntry {
    at: DateTime<Local>,
    action: ManualAction,
    outcome: Result<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BackendHealth {
    Unknown,
    Checking,
    Loaded(BackendStatus),
    Failed(String),
}

pub struct SettingsScreen {
    focused: bool,
    backend_url: String,
    poll_interval: std::time::Duration,
    timeout: std::time::Duration,
    snapshot: Option<Arc<Snapshot>>,
    health: BackendHealth,
    poller: PollerState,
    /// Newest first.
    activity: VecDeque<ActivityEntry>,
}

impl SettingsScreen {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            focused: false,
            backend_url: config.url.to_string(),
            poll_interval: config.poll_interval,
            timeout: config.timeout,
            snapshot: None,
            health: BackendHealth::Unknown,
            poller: PollerState::Idle,
            activity: VecDeque::with_capacity(ACTIVITY_LOG_LEN),
        }
    }

    fn record(&mut self, action: ManualAction, outcome: &Result<String, String>) {
        self.activity.push_front(ActivityEntry {
            at: Local::now(),
            action,
            outcome: outcome.clone(),
        });
        self.activity.truncate(ACTIVITY_LOG_LEN);
    }

    fn connection_lines(&self) -> Vec<Line<'static>> {
        let label = |text: &'static str| Span::styled(format!("  {text:<14}"), theme::key_hint());
        let value = |text: String| Span::styled(text, theme::table_row());

        let interval = if self.poll_interval.is_zero() {
            "disabled".to_owned()
        } else {
            humantime::format_duration(self.poll_interval).to_string()
        };
        let (total, updated) = self.snapshot.as_ref().map_or_else(
            || ("-".to_owned(), "never".to_owned()),
            |s| (s.stats.total_bins.to_string(), local_time(s.fetched_at)),
        );

        let health = match &self.health {
            BackendHealth::Unknown => Span::styled("not checked", theme::key_hint()),
            BackendHealth::Checking => {
                Span::styled("checking…", Style::default().fg(theme::WARNING))
            }
            BackendHealth::Loaded(status) if status.is_active() => Span::styled(
                format!("● {} ({} bins)", status.status, status.bins_count),
                Style::default().fg(theme::SUCCESS),
            ),
            BackendHealth::Loaded(status) => Span::styled(
                format!("◐ {}", status.status),
                Style::default().fg(theme::WARNING),
            ),
            BackendHealth::Failed(e) => {
                Span::styled(format!("○ {e}"), Style::default().fg(theme::ERROR))
            }
        };
        let poller = match self.poller {
            PollerState::Idle => Span::styled("idle", Style::default().fg(theme::SUCCESS)),
            state => Span::styled(state.to_string(), Style::default().fg(theme::WARNING)),
        };

        vec![
            Line::from(""),
            Line::from(vec![label("Backend"), value(self.backend_url.clone())]),
            Line::from(vec![label("Poll interval"), value(interval)]),
            Line::from(vec![
                label("Timeout"),
                value(humantime::format_duration(self.timeout).to_string()),
            ]),
            Line::from(""),
            Line::from(vec![label("Status"), health]),
            Line::from(vec![label("Poller"), poller]),
            Line::from(vec![label("Total bins"), value(total)]),
            Line::from(vec![label("Last update"), value(updated)]),
        ]
    }

    fn activity_lines(&self) -> Vec<Line<'static>> {
        if self.activity.is_empty() {
            return vec![Line::from(Span::styled(
                "  No actions yet",
                theme::key_hint(),
            ))];
        }
        self.activity
            .iter()
            .map(|entry| {
                let (icon, color, text) = match &entry.outcome {
                    Ok(msg) => ("✓", theme::SUCCESS, msg.clone()),
                    Err(e) => ("✗", theme::ERROR, e.clone()),
                };
                Line::from(vec![
                    Span::styled(format!("  {} ", entry.at.format("%H:%M:%S")), theme::key_hint()),
                    Span::styled(format!("{icon} "), Style::default().fg(color)),
                    Span::styled(format!("{:<16}", entry.action.to_string()), theme::table_row()),
                    Span::styled(text, Style::default().fg(color)),
                ])
            })
            .collect()
    }
}

impl Component for SettingsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('r') => Some(Action::ShowConfirm(ConfirmAction::ResetDemoData)),
            KeyCode::Char('s') => Some(Action::RequestSimulate),
            KeyCode::Char('p') => Some(Action::RequestRefresh),
            KeyCode::Char('b') => Some(Action::RequestBackendStatus),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SnapshotUpdated(snapshot) => self.snapshot = Some(Arc::clone(snapshot)),
            Action::PollerStateChanged(state) => self.poller = *state,
            Action::RequestBackendStatus => self.health = BackendHealth::Checking,
            Action::BackendStatusLoaded(Ok(status)) => {
                self.health = BackendHealth::Loaded(status.clone());
            }
            Action::BackendStatusLoaded(Err(e)) => self.health = BackendHealth::Failed(e.clone()),
            Action::ActionFinished { action, outcome } => self.record(*action, outcome),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Length(12), Constraint::Min(4)]).split(area);

        let conn = Block::default()
            .title(" Connection ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(self.focused));
        frame.render_widget(Paragraph::new(self.connection_lines()).block(conn), rows[0]);

        let log = Block::default()
            .title(" Activity ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(false));
        frame.render_widget(Paragraph::new(self.activity_lines()).block(log), rows[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("r", "reset demo"),
            ("s", "simulate"),
            ("p", "poll now"),
            ("b", "backend status"),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::fixtures::buffer_text;

    fn screen() -> SettingsScreen {
        SettingsScreen::new(&MonitorConfig::new("http://bins.local:8000".parse().unwrap()))
    }

    #[test]
    fn reset_asks_for_confirmation() {
        let mut screen = screen();
        let action = screen.handle_key_event(KeyEvent::from(KeyCode::Char('r'))).unwrap();
        assert!(matches!(
            action,
            Some(Action::ShowConfirm(ConfirmAction::ResetDemoData))
        ));
        let action = screen.handle_key_event(KeyEvent::from(KeyCode::Char('s'))).unwrap();
        assert!(matches!(action, Some(Action::RequestSimulate)));
    }

    #[test]
    fn activity_log_is_bounded_and_newest_first() {
        let mut screen = screen();
        for i in 0..ACTIVITY_LOG_LEN + 3 {
            screen
                .update(&Action::ActionFinished {
                    action: ManualAction::SimulateUpdate,
                    outcome: Ok(format!("run {i}")),
                })
                .unwrap();
        }
        assert_eq!(screen.activity.len(), ACTIVITY_LOG_LEN);
        assert_eq!(
            screen.activity.front().map(|e| e.outcome.clone()),
            Some(Ok(format!("run {}", ACTIVITY_LOG_LEN + 2)))
        );
    }

    #[test]
    fn backend_status_moves_from_checking_to_loaded() {
        let mut screen = screen();
        screen.update(&Action::RequestBackendStatus).unwrap();
        assert_eq!(screen.health, BackendHealth::Checking);

        let status = BackendStatus {
            message: "Smart Dustbin API".into(),
            status: "active".into(),
            bins_count: 12,
        };
        screen
            .update(&Action::BackendStatusLoaded(Ok(status.clone())))
            .unwrap();
        assert_eq!(screen.health, BackendHealth::Loaded(status));
    }

    #[test]
    fn renders_connection_and_failures() {
        let mut screen = screen();
        screen
            .update(&Action::ActionFinished {
                action: ManualAction::ResetDemoData,
                outcome: Err("Backend error (HTTP 500): boom".into()),
            })
            .unwrap();

        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| screen.render(f, f.area())).unwrap();
        let text = buffer_text(terminal.backend().buffer());

        assert!(text.contains("http://bins.local:8000/"), "{text}");
        assert!(text.contains("30s"), "{text}");
        assert!(text.contains("reset-demo-data"), "{text}");
        assert!(text.contains("HTTP 500"), "{text}");
    }
}
