//! Dashboard screen: fleet totals, the bin table and recent alerts.
//!
//! Layout:
//! ┌─ Total ─┐┌─ Full ─┐┌─ Offline ─┐┌─ Low battery ─┐┌─ Avg fill ─┐┌─ Unread ─┐
//! ├─ Bins (fill / battery bars) ───────────┐┌─ Notifications ─────────────┤
//! │                                        ││ ● 12:04 high  Bin 3  ...    │
//! └────────────────────────────────────────┘└─────────────────────────────┘

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use binwatch_core::{Device, DeviceStatus, Notification, Snapshot};

use crate::action::{Action, StatusMessage};
use crate::component::Component;
use crate::theme;
use crate::widgets::level_bar::level_bar;
use crate::widgets::time_fmt::short_time;

/// How many notifications the panel lists.
pub const NOTIFICATION_PANEL_LEN: usize = 10;

const FILL_BAR_WIDTH: u16 = 10;
const BATTERY_BAR_WIDTH: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Bins,
    Notifications,
}

pub struct DashboardScreen {
    focused: bool,
    snapshot: Option<Arc<Snapshot>>,
    panel: Panel,
    bin_selected: usize,
    note_selected: usize,
}

fn status_dot(status: DeviceStatus) -> Span<'static> {
    let (symbol, color) = match status {
        DeviceStatus::Online => ("●", theme::SUCCESS),
        DeviceStatus::Offline => ("○", theme::ERROR),
        DeviceStatus::Maintenance => ("◐", theme::WARNING),
        DeviceStatus::Unknown => ("?", theme::DIM_WHITE),
    };
    Span::styled(symbol, Style::default().fg(color))
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            snapshot: None,
            panel: Panel::Bins,
            bin_selected: 0,
            note_selected: 0,
        }
    }

    fn devices(&self) -> &[Arc<Device>] {
        self.snapshot.as_ref().map(|s| s.devices.as_slice()).unwrap_or_default()
    }

    /// The newest notifications, as shown in the panel.
    fn recent_notifications(&self) -> &[Arc<Notification>] {
        let all = self
            .snapshot
            .as_ref()
            .map(|s| s.notifications.as_slice())
            .unwrap_or_default();
        &all[..all.len().min(NOTIFICATION_PANEL_LEN)]
    }

    fn clamp_selection(&mut self) {
        self.bin_selected = self
            .bin_selected
            .min(self.devices().len().saturating_sub(1));
        self.note_selected = self
            .note_selected
            .min(self.recent_notifications().len().saturating_sub(1));
    }

    fn move_selection(&mut self, delta: isize) {
        let len = match self.panel {
            Panel::Bins => self.devices().len(),
            Panel::Notifications => self.recent_notifications().len(),
        };
        let max = len.saturating_sub(1);
        let selected = match self.panel {
            Panel::Bins => &mut self.bin_selected,
            Panel::Notifications => &mut self.note_selected,
        };
        *selected = selected.saturating_add_signed(delta).min(max);
    }

    fn activate_selection(&self) -> Option<Action> {
        match self.panel {
            Panel::Bins => self
                .devices()
                .get(self.bin_selected)
                .map(|d| Action::LocateBin(d.id.clone())),
            Panel::Notifications => {
                let note = self.recent_notifications().get(self.note_selected)?;
                if note.is_read {
                    Some(Action::Status(StatusMessage::info("Already marked read")))
                } else {
                    Some(Action::RequestMarkRead(note.id.clone()))
                }
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_stat_cards(&self, frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
        let stats = &snapshot.stats;
        let cards = [
            ("Total bins", stats.total_bins.to_string(), theme::CYAN),
            ("Full", stats.full_bins.to_string(), theme::ERROR),
            ("Offline", stats.offline_bins.to_string(), theme::hue(binwatch_core::Hue::Gray)),
            ("Low battery", stats.low_battery_bins.to_string(), theme::ERROR),
            ("Avg fill", format!("{:.1}%", stats.avg_fill_level), theme::WARNING),
            ("Unread", stats.unread_notifications.to_string(), theme::ACCENT),
        ];

        let columns = Layout::horizontal([Constraint::Ratio(1, 6); 6]).split(area);
        for ((label, value, color), col) in cards.into_iter().zip(columns.iter()) {
            let block = Block::default()
                .title(Span::styled(format!(" {label} "), theme::key_hint()))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border(false));
            let body = Paragraph::new(Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .centered()
            .block(block);
            frame.render_widget(body, *col);
        }
    }

    fn render_bins(&self, frame: &mut Frame, area: Rect) {
        let focused = self.focused && self.panel == Panel::Bins;
        let devices = self.devices();
        let block = Block::default()
            .title(format!(" Bins · {} ", devices.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(focused));

        let header = Row::new(["", "Name", "Fill", "Battery", "Tier", "Address"])
            .style(theme::table_header());

        let rows: Vec<Row> = devices
            .iter()
            .map(|d| {
                let fill_color = theme::fill(d.fill_tier());
                let battery_color = theme::battery(d.battery_tier());
                Row::new(vec![
                    Cell::from(status_dot(d.status)),
                    Cell::from(d.name.clone()),
                    Cell::from(Line::from(level_bar(d.fill_level, FILL_BAR_WIDTH, fill_color))),
                    Cell::from(Line::from(level_bar(
                        d.battery_level,
                        BATTERY_BAR_WIDTH,
                        battery_color,
                    ))),
                    Cell::from(Span::styled(
                        d.fill_tier().to_string(),
                        Style::default().fg(fill_color),
                    )),
                    Cell::from(d.location.address.clone()),
                ])
                .style(theme::table_row())
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Min(12),
                Constraint::Length(FILL_BAR_WIDTH + 5),
                Constraint::Length(BATTERY_BAR_WIDTH + 5),
                Constraint::Length(9),
                Constraint::Fill(1),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(if focused {
            theme::table_selected()
        } else {
            Style::default()
        });

        let mut state =
            TableState::default().with_selected((!devices.is_empty()).then_some(self.bin_selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect, snapshot: &Snapshot) {
        let focused = self.focused && self.panel == Panel::Notifications;
        let notes = self.recent_notifications();
        let title = Line::from(vec![
            Span::styled(" Notifications ", theme::title_style()),
            Span::styled(
                format!("· {} unread ", snapshot.stats.unread_notifications),
                Style::default().fg(theme::ACCENT),
            ),
        ]);
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(focused));

        if notes.is_empty() {
            frame.render_widget(
                Paragraph::new("No notifications").style(theme::key_hint()).block(block),
                area,
            );
            return;
        }

        let rows: Vec<Row> = notes
            .iter()
            .map(|n| {
                let badge = if n.is_read {
                    Span::raw(" ")
                } else {
                    Span::styled("●", Style::default().fg(theme::ACCENT))
                };
                let text_style = if n.is_read {
                    theme::key_hint()
                } else {
                    theme::table_row()
                };
                Row::new(vec![
                    Cell::from(badge),
                    Cell::from(short_time(n.timestamp)),
                    Cell::from(Span::styled(
                        n.priority.to_string(),
                        Style::default().fg(theme::priority(n.priority)),
                    )),
                    Cell::from(n.dustbin_name.clone()),
                    Cell::from(n.message.clone()),
                ])
                .style(text_style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Length(14),
                Constraint::Fill(1),
            ],
        )
        .block(block)
        .row_highlight_style(if focused {
            theme::table_selected()
        } else {
            Style::default()
        });

        let mut state = TableState::default().with_selected(Some(self.note_selected));
        frame.render_stateful_widget(table, area, &mut state);
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.panel = Panel::Bins,
            KeyCode::Right | KeyCode::Char('l') => self.panel = Panel::Notifications,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Home | KeyCode::Char('g') => self.move_selection(isize::MIN),
            KeyCode::End | KeyCode::Char('G') => self.move_selection(isize::MAX),
            KeyCode::Enter => return Ok(self.activate_selection()),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::SnapshotUpdated(snapshot) = action {
            self.snapshot = Some(Arc::clone(snapshot));
            self.clamp_selection();
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(snapshot) = self.snapshot.as_deref() else {
            return;
        };

        if area.width < 60 || area.height < 12 {
            let summary = format!(
                "Bins: {} │ Full: {} │ Unread: {}",
                snapshot.stats.total_bins,
                snapshot.stats.full_bins,
                snapshot.stats.unread_notifications
            );
            frame.render_widget(Paragraph::new(summary).style(theme::table_row()), area);
            return;
        }

        let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(6)]).split(area);
        self.render_stat_cards(frame, rows[0], snapshot);

        let body = Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(rows[1]);
        self.render_bins(frame, body[0]);
        self.render_notifications(frame, body[1], snapshot);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        match self.panel {
            Panel::Bins => &[("←/→", "panel"), ("j/k", "select"), ("Enter", "show on map")],
            Panel::Notifications => &[("←/→", "panel"), ("j/k", "select"), ("Enter", "mark read")],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use binwatch_core::{DeviceStatus, EntityId};

    use super::*;
    use crate::fixtures::{buffer_text, device, note, snapshot};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn loaded() -> DashboardScreen {
        let mut screen = DashboardScreen::new();
        let snap = snapshot(
            vec![
                device("1", 95.0, DeviceStatus::Online),
                device("2", 30.0, DeviceStatus::Offline),
            ],
            vec![note("n1", 1, false), note("n2", 5, true)],
        );
        screen.update(&Action::SnapshotUpdated(snap)).unwrap();
        screen
    }

    #[test]
    fn enter_on_unread_notification_requests_mark_read() {
        let mut screen = loaded();
        screen.handle_key_event(key(KeyCode::Right)).unwrap();
        let action = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::RequestMarkRead(id)) if id == EntityId::from("n1")));
    }

    #[test]
    fn enter_on_read_notification_does_not_write() {
        let mut screen = loaded();
        screen.handle_key_event(key(KeyCode::Right)).unwrap();
        screen.handle_key_event(key(KeyCode::Down)).unwrap();
        let action = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::Status(_))));
    }

    #[test]
    fn enter_on_bin_locates_it() {
        let mut screen = loaded();
        screen.handle_key_event(key(KeyCode::Down)).unwrap();
        let action = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::LocateBin(id)) if id == EntityId::from("2")));
    }

    #[test]
    fn selection_is_clamped_when_the_list_shrinks() {
        let mut screen = loaded();
        screen.handle_key_event(key(KeyCode::End)).unwrap();
        assert_eq!(screen.bin_selected, 1);

        let smaller = snapshot(vec![device("1", 10.0, DeviceStatus::Online)], vec![]);
        screen.update(&Action::SnapshotUpdated(smaller)).unwrap();
        assert_eq!(screen.bin_selected, 0);
        assert_eq!(screen.note_selected, 0);
    }

    #[test]
    fn panel_lists_at_most_ten_notifications() {
        let mut screen = DashboardScreen::new();
        let notes = (0..15).map(|i| note(&format!("n{i}"), i, false)).collect();
        screen
            .update(&Action::SnapshotUpdated(snapshot(vec![], notes)))
            .unwrap();
        assert_eq!(screen.recent_notifications().len(), NOTIFICATION_PANEL_LEN);
        assert_eq!(screen.recent_notifications()[0].id, EntityId::from("n0"));
    }

    #[test]
    fn renders_cards_and_tiers() {
        let screen = loaded();
        let mut terminal = Terminal::new(TestBackend::new(140, 20)).unwrap();
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Total bins"), "{text}");
        assert!(text.contains("critical"), "{text}");
        assert!(text.contains("offline"), "{text}");
        assert!(text.contains("1 unread"), "{text}");
    }
}
