//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use binwatch_core::{CoreError, ManualAction, Monitor, PollerState, Snapshot};

use crate::action::{Action, ConfirmAction, StatusLevel, StatusMessage};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::time_fmt::fmt_age;

const TICK_RATE: Duration = Duration::from_millis(250);
const FRAME_RATE: Duration = Duration::from_millis(33);
const STATUS_TTL: Duration = Duration::from_secs(5);
/// How long to wait for the monitor timer to stop on quit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    /// Components and spawned tasks dispatch through this.
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    monitor: Monitor,
    /// Cancels the data bridge and the input reader.
    data_cancel: CancellationToken,
    /// Latest snapshot, `None` until the first good poll.
    snapshot: Option<Arc<Snapshot>>,
    poller_state: PollerState,
    /// Set by a failed poll, cleared by the next successful one.
    last_poll_error: Option<String>,
    /// Blocks other input while shown.
    pending_confirm: Option<ConfirmAction>,
    status: Option<(StatusMessage, Instant)>,
}

impl App {
    pub fn new(monitor: Monitor) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let mut screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens(monitor.config()).into_iter().collect();

        let active_screen = ScreenId::default();
        if let Some(screen) = screens.get_mut(&active_screen) {
            screen.set_focused(true);
        }

        Self {
            active_screen,
            screens,
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            monitor,
            data_cancel: CancellationToken::new(),
            snapshot: None,
            poller_state: PollerState::Idle,
            last_poll_error: None,
            pending_confirm: None,
            status: None,
        }
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let bridge = tokio::spawn(crate::data_bridge::spawn_data_bridge(
            self.monitor.clone(),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));
        let mut events = EventReader::spawn(TICK_RATE, FRAME_RATE, &self.data_cancel);

        info!("TUI event loop started");
        let outcome = self.event_loop(&mut tui, &mut events).await;

        self.data_cancel.cancel();
        events.stop();
        tui.exit();
        if tokio::time::timeout(SHUTDOWN_GRACE, bridge).await.is_err() {
            warn!("monitor did not stop in time");
        }
        info!("TUI event loop ended");
        outcome
    }

    async fn event_loop(&mut self, tui: &mut Tui, events: &mut EventReader) -> Result<()> {
        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if matches!(action, Action::Render) {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }
        Ok(())
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Map a key to an action. Dialogs and overlays capture input first,
    /// then global keys, then the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            });
        }

        // Nothing to navigate until the first snapshot lands.
        if self.snapshot.is_none() {
            return Ok(match key.code {
                KeyCode::Char('i') => Some(Action::RequestResetDemo),
                KeyCode::Char('p' | 'r') => Some(Action::RequestRefresh),
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => {
                let screen = c
                    .to_digit(10)
                    .and_then(|n| u8::try_from(n).ok())
                    .and_then(ScreenId::from_number);
                if let Some(screen) = screen {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (_, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render | Action::Resize(..) => {}

            Action::Tick => {
                if self
                    .status
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > STATUS_TTL)
                {
                    self.status = None;
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::SwitchScreen(target) => self.switch_screen(*target)?,

            Action::LocateBin(_) => {
                if let Some(screen) = self.screens.get_mut(&ScreenId::Map) {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
                self.switch_screen(ScreenId::Map)?;
            }

            // ── Monitor feed: app state first, then every screen ─────
            Action::SnapshotUpdated(snapshot) => {
                // Optimistic flips keep the poll timestamp; only a real poll
                // clears a standing poll error.
                let polled = self
                    .snapshot
                    .as_ref()
                    .is_none_or(|prev| prev.fetched_at != snapshot.fetched_at);
                if polled {
                    self.last_poll_error = None;
                }
                self.snapshot = Some(Arc::clone(snapshot));
                self.broadcast(action)?;
            }

            Action::PollerStateChanged(state) => {
                self.poller_state = *state;
                self.broadcast(action)?;
            }

            Action::PollFailed(error) => {
                self.last_poll_error = Some(error.clone());
                self.set_status(StatusMessage::error(format!("Poll failed: {error}")));
            }

            Action::ActionFinished { action: kind, outcome } => {
                let status = match (kind, outcome) {
                    (ManualAction::MarkRead, Ok(_)) => StatusMessage::success("Marked read"),
                    (_, Ok(message)) => StatusMessage::success(format!("{kind}: {message}")),
                    (_, Err(error)) => StatusMessage::error(format!("{kind} failed: {error}")),
                };
                self.set_status(status);
                self.broadcast(action)?;
            }

            Action::MarkersChanged(_) | Action::BackendStatusLoaded(_) => {
                self.broadcast(action)?;
            }

            // ── Requests ─────────────────────────────────────────────
            Action::RequestRefresh => self.spawn_refresh(),
            Action::RequestResetDemo => {
                self.spawn_manual(ManualAction::ResetDemoData);
            }
            Action::RequestSimulate => {
                self.spawn_manual(ManualAction::SimulateUpdate);
            }
            Action::RequestMarkRead(id) => {
                let monitor = self.monitor.clone();
                let id = id.clone();
                // Failures arrive as ActionFailed events.
                tokio::spawn(async move {
                    if let Err(e) = monitor.mark_read(&id).await {
                        debug!(%id, error = %e, "mark read failed");
                    }
                });
            }
            Action::RequestBackendStatus => {
                self.broadcast(action)?;
                let monitor = self.monitor.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let result = monitor.backend_status().await.map_err(|e| e.to_string());
                    let _ = tx.send(Action::BackendStatusLoaded(result));
                });
            }

            // ── Confirm dialog ───────────────────────────────────────
            Action::ShowConfirm(confirm) => self.pending_confirm = Some(*confirm),
            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    match confirm {
                        ConfirmAction::ResetDemoData => {
                            self.action_tx.send(Action::RequestResetDemo)?;
                        }
                    }
                }
            }
            Action::ConfirmNo => self.pending_confirm = None,

            Action::Status(message) => self.set_status(message.clone()),
        }
        Ok(())
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn switch_screen(&mut self, target: ScreenId) -> Result<()> {
        if target == self.active_screen {
            return Ok(());
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&target) {
            screen.set_focused(true);
        }
        if target == ScreenId::Settings {
            self.action_tx.send(Action::RequestBackendStatus)?;
        }
        Ok(())
    }

    fn set_status(&mut self, message: StatusMessage) {
        self.status = Some((message, Instant::now()));
    }

    /// Busy rejections are not broadcast by the monitor, so they surface
    /// here as an info message. Other failures arrive as events.
    fn report_busy(tx: &mpsc::UnboundedSender<Action>, error: &CoreError) {
        if matches!(error, CoreError::Busy { .. }) {
            let _ = tx.send(Action::Status(StatusMessage::info(error.to_string())));
        }
    }

    fn spawn_refresh(&self) {
        let monitor = self.monitor.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match monitor.poll_now().await {
                Ok(snapshot) => {
                    let _ = tx.send(Action::Status(StatusMessage::success(format!(
                        "Refreshed {} bins",
                        snapshot.devices.len()
                    ))));
                }
                Err(e) => Self::report_busy(&tx, &e),
            }
        });
    }

    fn spawn_manual(&self, action: ManualAction) {
        let monitor = self.monitor.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = match action {
                ManualAction::ResetDemoData => monitor.reset_demo_data().await,
                ManualAction::SimulateUpdate => monitor.simulate_update().await,
                ManualAction::MarkRead => return,
            };
            if let Err(e) = result {
                Self::report_busy(&tx, &e);
            }
        });
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let layout = Layout::vertical([
            Constraint::Length(1), // Header
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        self.render_header(frame, layout[0]);
        match self.snapshot {
            Some(_) => {
                if let Some(screen) = self.screens.get(&self.active_screen) {
                    screen.render(frame, layout[1]);
                }
            }
            None => self.render_loading(frame, layout[1]),
        }
        self.render_tab_bar(frame, layout[2]);
        self.render_status_bar(frame, layout[3]);

        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
        if let Some(confirm) = self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let sep = || Span::styled(" │ ", theme::key_hint());
        let mut spans = vec![Span::styled(
            " ◆ binwatch",
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )];

        if let Some(snapshot) = &self.snapshot {
            let online = snapshot.online_count();
            let total = snapshot.devices.len();
            let color = if online == total {
                theme::SUCCESS
            } else {
                theme::WARNING
            };
            spans.push(sep());
            spans.push(Span::styled(
                format!("{online}/{total} Online"),
                Style::default().fg(color),
            ));
            spans.push(sep());
            spans.push(Span::styled(
                format!("updated {}", fmt_age(snapshot.age(Utc::now()))),
                theme::table_row(),
            ));
        }

        spans.push(sep());
        spans.push(match (&self.last_poll_error, self.poller_state) {
            (_, PollerState::Polling) => {
                Span::styled("◐ polling", Style::default().fg(theme::WARNING))
            }
            (_, PollerState::Acting(action)) => {
                Span::styled(format!("◐ {action}"), Style::default().fg(theme::WARNING))
            }
            (Some(_), PollerState::Idle) => {
                Span::styled("○ poll failed", Style::default().fg(theme::ERROR))
            }
            (None, PollerState::Idle) => {
                Span::styled("● idle", Style::default().fg(theme::SUCCESS))
            }
        });
        spans.push(sep());
        spans.push(Span::styled(
            self.monitor.config().url.to_string(),
            theme::key_hint(),
        ));

        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(theme::BG_DARK)),
            area,
        );
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(false));

        let mut lines = vec![Line::from("")];
        match &self.last_poll_error {
            Some(error) => {
                lines.push(Line::from(Span::styled(
                    "Could not load the fleet",
                    Style::default().fg(theme::ERROR).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(error.clone(), theme::table_row())));
            }
            None => lines.push(Line::from(Span::styled(
                format!("Connecting to {} …", self.monitor.config().url),
                theme::title_style(),
            ))),
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("i ", theme::key_hint_key()),
            Span::styled("initialize demo data   ", theme::key_hint()),
            Span::styled("p ", theme::key_hint_key()),
            Span::styled("retry   ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .centered()
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some((message, _)) = &self.status {
            let (icon, color) = match message.level {
                StatusLevel::Success => ("✓", theme::SUCCESS),
                StatusLevel::Error => ("✗", theme::ERROR),
                StatusLevel::Info => ("·", theme::CYAN),
            };
            let line = Line::from(vec![
                Span::styled(format!(" {icon} "), Style::default().fg(color)),
                Span::styled(message.text.clone(), Style::default().fg(color)),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let mut spans = vec![Span::raw(" ")];
        let screen_hints = self
            .screens
            .get(&self.active_screen)
            .filter(|_| self.snapshot.is_some())
            .map(|s| s.key_hints())
            .unwrap_or_default();
        for (key, label) in screen_hints {
            spans.push(Span::styled(format!("{key} "), theme::key_hint_key()));
            spans.push(Span::styled(format!("{label}  "), theme::key_hint()));
        }
        spans.push(Span::styled("│ ? help  q quit", theme::key_hint()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled("  Global", Style::default().fg(theme::CYAN))),
            Line::from(Span::styled("  ──────", theme::key_hint())),
        ];
        let global: [(&str, &str); 5] = [
            ("1-3", "Jump to screen"),
            ("Tab", "Next screen"),
            ("?", "This help"),
            ("q", "Quit"),
            ("Ctrl+c", "Quit"),
        ];
        let screen = self
            .screens
            .get(&self.active_screen)
            .map(|s| s.key_hints())
            .unwrap_or_default();

        let row = |key: &str, label: &str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(label.to_owned(), theme::key_hint()),
            ])
        };
        lines.extend(global.iter().map(|(k, l)| row(k, l)));
        if !screen.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("  {}", self.active_screen),
                Style::default().fg(theme::CYAN),
            )));
            lines.push(Line::from(Span::styled("  ──────", theme::key_hint())));
            lines.extend(screen.iter().map(|(k, l)| row(k, l)));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  Esc or ? to close", theme::key_hint())));

        let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX);
        let help_area = centered(area, 48, height);
        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(true))
            .style(Style::default().bg(theme::BG_DARK));
        frame.render_widget(Paragraph::new(lines).block(block), help_area);
    }
}

/// A `width` x `height` rect centred in `area`, shrunk to fit.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: ConfirmAction) {
    let dialog_area = centered(area, 50, 5);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Confirm ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::WARNING))
        .style(Style::default().bg(theme::BG_DARK));

    let text = vec![
        Line::from(Span::styled(
            format!("  {confirm}"),
            Style::default().fg(theme::DIM_WHITE),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).block(block), dialog_area);
}
