//! Map screen: one pin per bin on a world canvas.
//!
//! Pins live on a [`PinLayer`], which only the [`MarkerReconciler`] edits.
//! Monitor diffs are applied as they arrive, so a pin survives across
//! polls for as long as its bin does. Which bin is selected is state of
//! this screen alone.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use indexmap::IndexMap;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context, Map, MapResolution};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use binwatch_core::{
    Device, EntityId, FillTier, MarkerDiff, MarkerReconciler, MarkerSurface, Snapshot,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::level_bar::level_bar;
use crate::widgets::time_fmt::local_time;

// ── Pin layer ────────────────────────────────────────────────────────

/// Slot of a pin on the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinHandle(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub id: EntityId,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub tier: FillTier,
}

impl Pin {
    fn from_device(device: &Device, tier: FillTier) -> Self {
        Self {
            id: device.id.clone(),
            name: device.name.clone(),
            lon: device.location.longitude,
            lat: device.location.latitude,
            tier,
        }
    }
}

/// The drawable pins, in insertion order.
#[derive(Debug, Default)]
pub struct PinLayer {
    pins: IndexMap<PinHandle, Pin>,
    next_slot: u64,
    /// Total pins ever created; stays flat while bins only update.
    created: u64,
}

impl PinLayer {
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub fn created(&self) -> u64 {
        self.created
    }
}

impl MarkerSurface for PinLayer {
    type Handle = PinHandle;

    fn add_marker(&mut self, device: &Device, tier: FillTier) -> PinHandle {
        let handle = PinHandle(self.next_slot);
        self.next_slot += 1;
        self.created += 1;
        self.pins.insert(handle, Pin::from_device(device, tier));
        handle
    }

    fn update_marker(&mut self, handle: &mut PinHandle, device: &Device, tier: FillTier) {
        if let Some(pin) = self.pins.get_mut(handle) {
            *pin = Pin::from_device(device, tier);
        }
    }

    fn remove_marker(&mut self, handle: PinHandle) {
        self.pins.shift_remove(&handle);
    }
}

// ── Viewport ─────────────────────────────────────────────────────────

/// Canvas bounds as `(x = longitude, y = latitude)` ranges.
pub type Bounds = ([f64; 2], [f64; 2]);

pub const WORLD: Bounds = ([-180.0, 180.0], [-90.0, 90.0]);

/// Smallest span shown when zoomed to the fleet, in degrees.
const MIN_SPAN: f64 = 0.02;

/// Bounds that frame every pin with a margin, or the world when empty.
pub fn fleet_bounds<'a>(pins: impl Iterator<Item = &'a Pin>) -> Bounds {
    let mut lon = [f64::INFINITY, f64::NEG_INFINITY];
    let mut lat = [f64::INFINITY, f64::NEG_INFINITY];
    for pin in pins.filter(|p| p.lon.is_finite() && p.lat.is_finite()) {
        lon = [lon[0].min(pin.lon), lon[1].max(pin.lon)];
        lat = [lat[0].min(pin.lat), lat[1].max(pin.lat)];
    }
    if lon[0] > lon[1] {
        return WORLD;
    }

    let pad = |range: [f64; 2], limit: f64| {
        let span = (range[1] - range[0]).max(MIN_SPAN);
        let mid = (range[0] + range[1]) / 2.0;
        let half = span * 0.6;
        [(mid - half).max(-limit), (mid + half).min(limit)]
    };
    (pad(lon, 180.0), pad(lat, 90.0))
}

// ── Screen ───────────────────────────────────────────────────────────

pub struct MapScreen {
    focused: bool,
    markers: MarkerReconciler<PinLayer>,
    snapshot: Option<Arc<Snapshot>>,
    selected: Option<EntityId>,
    fit_fleet: bool,
    last_diff: (usize, usize, usize),
}

impl MapScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            markers: MarkerReconciler::new(PinLayer::default()),
            snapshot: None,
            selected: None,
            fit_fleet: true,
            last_diff: (0, 0, 0),
        }
    }

    fn apply_diff(&mut self, diff: &MarkerDiff) {
        self.markers.apply(diff);
        self.last_diff = (diff.to_add.len(), diff.to_update.len(), diff.to_remove.len());
        self.drop_stale_selection();
    }

    fn drop_stale_selection(&mut self) {
        if self
            .selected
            .as_ref()
            .is_some_and(|id| self.markers.record(id).is_none())
        {
            self.selected = None;
        }
    }

    /// Step the selection through pins in layer order.
    fn cycle(&mut self, forward: bool) {
        let ids: Vec<&EntityId> = self.markers.ids().collect();
        if ids.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|sel| ids.iter().position(|id| *id == sel));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => ids.len() - 1,
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
        };
        self.selected = ids.get(next).map(|id| (*id).clone());
    }

    fn selected_device(&self) -> Option<&Arc<Device>> {
        let id = self.selected.as_ref()?;
        self.snapshot.as_ref()?.device(id)
    }

    fn bounds(&self) -> Bounds {
        if self.fit_fleet {
            fleet_bounds(self.markers.surface().pins())
        } else {
            WORLD
        }
    }

    fn paint_pins(&self, ctx: &mut Context<'_>) {
        ctx.draw(&Map {
            resolution: MapResolution::High,
            color: theme::MAP_LAND,
        });
        ctx.layer();

        let mut selected_pin = None;
        for pin in self.markers.surface().pins() {
            if self.selected.as_ref() == Some(&pin.id) {
                selected_pin = Some(pin);
                continue;
            }
            ctx.print(
                pin.lon,
                pin.lat,
                Span::styled("●", Style::default().fg(theme::fill(pin.tier))),
            );
        }
        // Drawn last so it sits on top.
        if let Some(pin) = selected_pin {
            ctx.print(
                pin.lon,
                pin.lat,
                Line::from(vec![
                    Span::styled("◉ ", Style::default().fg(theme::fill(pin.tier))),
                    Span::styled(
                        pin.name.clone(),
                        Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
                    ),
                ]),
            );
        }
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Bin ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(false));

        let Some(device) = self.selected_device() else {
            let mut lines = vec![
                Line::from(Span::styled("No bin selected", theme::key_hint())),
                Line::from(""),
            ];
            for tier in [
                FillTier::Critical,
                FillTier::High,
                FillTier::Medium,
                FillTier::Low,
                FillTier::Offline,
            ] {
                let count = self.markers.surface().pins().filter(|p| p.tier == tier).count();
                lines.push(Line::from(vec![
                    Span::styled("● ", Style::default().fg(theme::fill(tier))),
                    Span::styled(format!("{tier:<9}"), theme::table_row()),
                    Span::styled(count.to_string(), theme::key_hint()),
                ]));
            }
            frame.render_widget(Paragraph::new(lines).block(block), area);
            return;
        };

        let label = |text: &'static str| Span::styled(format!("{text:<12}"), theme::key_hint());
        let value = |text: String| Span::styled(text, theme::table_row());
        let reading = |v: Option<f64>, unit: &str| v.map_or_else(|| "-".into(), |v| format!("{v:.1}{unit}"));
        let fill_tier = device.fill_tier();

        let mut fill = vec![label("Fill")];
        fill.extend(level_bar(device.fill_level, 10, theme::fill(fill_tier)));
        let mut battery = vec![label("Battery")];
        battery.extend(level_bar(device.battery_level, 10, theme::battery(device.battery_tier())));

        let lines = vec![
            Line::from(Span::styled(device.name.clone(), theme::title_style())),
            Line::from(Span::styled(device.id.to_string(), theme::key_hint())),
            Line::from(""),
            Line::from(vec![label("Address"), value(device.location.address.clone())]),
            Line::from(vec![
                label("Position"),
                value(format!(
                    "{:.4}, {:.4}",
                    device.location.latitude, device.location.longitude
                )),
            ]),
            Line::from(vec![label("Status"), value(device.status.to_string())]),
            Line::from(vec![
                label("Tier"),
                Span::styled(fill_tier.to_string(), Style::default().fg(theme::fill(fill_tier))),
            ]),
            Line::from(fill),
            Line::from(battery),
            Line::from(vec![label("Temperature"), value(reading(device.temperature, "°C"))]),
            Line::from(vec![label("Humidity"), value(reading(device.humidity, "%"))]),
            Line::from(vec![label("Updated"), value(local_time(device.last_updated))]),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl Component for MapScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Down | KeyCode::Right | KeyCode::Char('j' | 'n') => self.cycle(true),
            KeyCode::Up | KeyCode::Left | KeyCode::Char('k' | 'p') => self.cycle(false),
            KeyCode::Char('f') => self.fit_fleet = !self.fit_fleet,
            KeyCode::Esc => self.selected = None,
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::MarkersChanged(diff) => self.apply_diff(diff),
            Action::SnapshotUpdated(snapshot) => {
                // Diffs can be missed (late join, lagged bridge); the
                // snapshot is authoritative for which pins exist.
                let diff = self.markers.sync(&snapshot.devices);
                if !diff.is_membership_unchanged() {
                    self.last_diff = (diff.to_add.len(), diff.to_update.len(), diff.to_remove.len());
                }
                self.snapshot = Some(Arc::clone(snapshot));
                self.drop_stale_selection();
            }
            Action::LocateBin(id) => {
                if self.markers.record(id).is_some() {
                    self.selected = Some(id.clone());
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let (added, updated, removed) = self.last_diff;
        let view = if self.fit_fleet { "fleet" } else { "world" };
        let block = Block::default()
            .title(format!(
                " Map · {} bins · {view} · +{added} ~{updated} -{removed} ",
                self.markers.len()
            ))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border(self.focused));

        let cols = Layout::horizontal([Constraint::Min(30), Constraint::Length(36)]).split(area);
        let (x_bounds, y_bounds) = self.bounds();
        let canvas = Canvas::default()
            .block(block)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| self.paint_pins(ctx));
        frame.render_widget(canvas, cols[0]);
        self.render_details(frame, cols[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("j/k", "select bin"), ("Esc", "clear"), ("f", "fleet/world")]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use binwatch_core::{DeviceStatus, reconcile};

    use super::*;
    use crate::fixtures::{device, snapshot};

    fn arcs(devices: Vec<Device>) -> Vec<Arc<Device>> {
        devices.into_iter().map(Arc::new).collect()
    }

    fn pin_ids(screen: &MapScreen) -> Vec<String> {
        screen
            .markers
            .surface()
            .pins()
            .map(|p| p.id.to_string())
            .collect()
    }

    #[test]
    fn diffs_keep_surviving_pins_and_drop_vanished_ones() {
        let mut screen = MapScreen::new();
        let first = arcs(vec![
            device("a", 10.0, DeviceStatus::Online),
            device("b", 20.0, DeviceStatus::Online),
            device("c", 30.0, DeviceStatus::Online),
        ]);
        let diff = reconcile(std::iter::empty(), &first);
        screen.update(&Action::MarkersChanged(Arc::new(diff))).unwrap();
        assert_eq!(screen.markers.surface().created(), 3);

        let second = arcs(vec![
            device("b", 95.0, DeviceStatus::Online),
            device("c", 30.0, DeviceStatus::Online),
            device("d", 40.0, DeviceStatus::Online),
        ]);
        let diff = reconcile(first.iter().map(|d| &d.id), &second);
        screen.update(&Action::MarkersChanged(Arc::new(diff))).unwrap();

        assert_eq!(pin_ids(&screen), vec!["b", "c", "d"]);
        // Only "d" is new; "b" and "c" were updated in place.
        assert_eq!(screen.markers.surface().created(), 4);
        let b = screen
            .markers
            .surface()
            .pins()
            .find(|p| p.id == EntityId::from("b"))
            .unwrap();
        assert_eq!(b.tier, FillTier::Critical);
        assert_eq!(screen.last_diff, (1, 2, 1));
    }

    #[test]
    fn selection_is_cleared_when_its_bin_disappears() {
        let mut screen = MapScreen::new();
        let devices = arcs(vec![device("a", 10.0, DeviceStatus::Online)]);
        screen
            .update(&Action::MarkersChanged(Arc::new(reconcile(
                std::iter::empty(),
                &devices,
            ))))
            .unwrap();
        screen.update(&Action::LocateBin(EntityId::from("a"))).unwrap();
        assert_eq!(screen.selected, Some(EntityId::from("a")));

        let diff = reconcile(devices.iter().map(|d| &d.id), &[]);
        screen.update(&Action::MarkersChanged(Arc::new(diff))).unwrap();
        assert_eq!(screen.selected, None);
    }

    #[test]
    fn late_join_catches_up_from_snapshot() {
        let mut screen = MapScreen::new();
        let snap = snapshot(
            vec![
                device("a", 10.0, DeviceStatus::Online),
                device("b", 99.0, DeviceStatus::Offline),
            ],
            vec![],
        );
        screen.update(&Action::SnapshotUpdated(Arc::clone(&snap))).unwrap();
        assert_eq!(screen.markers.len(), 2);

        // The diff from the same poll arrives afterwards and must not duplicate pins.
        let diff = reconcile(std::iter::empty(), &snap.devices);
        screen.update(&Action::MarkersChanged(Arc::new(diff))).unwrap();
        assert_eq!(screen.markers.len(), 2);
        assert_eq!(screen.markers.surface().created(), 2);
    }

    #[test]
    fn snapshot_removes_pins_whose_diff_was_missed() {
        let mut screen = MapScreen::new();
        let first = arcs(vec![
            device("a", 10.0, DeviceStatus::Online),
            device("b", 20.0, DeviceStatus::Online),
        ]);
        screen
            .update(&Action::MarkersChanged(Arc::new(reconcile(
                std::iter::empty(),
                &first,
            ))))
            .unwrap();
        screen.update(&Action::LocateBin(EntityId::from("a"))).unwrap();

        // The diff removing "a" never arrives; only the current snapshot does.
        let snap = snapshot(vec![device("b", 20.0, DeviceStatus::Online)], vec![]);
        screen.update(&Action::SnapshotUpdated(Arc::clone(&snap))).unwrap();
        assert_eq!(pin_ids(&screen), vec!["b"]);
        assert_eq!(screen.selected, None);

        // The following poll diffs against [b] and leaves the map as is.
        let diff = reconcile(snap.devices.iter().map(|d| &d.id), &snap.devices);
        screen.update(&Action::MarkersChanged(Arc::new(diff))).unwrap();
        assert_eq!(pin_ids(&screen), vec!["b"]);
        assert_eq!(screen.markers.surface().created(), 2);
    }

    #[test]
    fn cycling_wraps_through_pins() {
        let mut screen = MapScreen::new();
        let snap = snapshot(
            vec![
                device("a", 10.0, DeviceStatus::Online),
                device("b", 20.0, DeviceStatus::Online),
            ],
            vec![],
        );
        screen.update(&Action::SnapshotUpdated(snap)).unwrap();

        screen.handle_key_event(KeyEvent::from(KeyCode::Char('j'))).unwrap();
        assert_eq!(screen.selected, Some(EntityId::from("a")));
        screen.handle_key_event(KeyEvent::from(KeyCode::Char('j'))).unwrap();
        assert_eq!(screen.selected, Some(EntityId::from("b")));
        screen.handle_key_event(KeyEvent::from(KeyCode::Char('j'))).unwrap();
        assert_eq!(screen.selected, Some(EntityId::from("a")));
        screen.handle_key_event(KeyEvent::from(KeyCode::Char('k'))).unwrap();
        assert_eq!(screen.selected, Some(EntityId::from("b")));
        assert_eq!(screen.selected_device().map(|d| d.name.as_str()), Some("Bin b"));
    }

    #[test]
    fn fleet_bounds_frame_all_pins() {
        let pins = [
            Pin {
                id: EntityId::from("a"),
                name: "a".into(),
                lon: -74.0,
                lat: 40.0,
                tier: FillTier::Low,
            },
            Pin {
                id: EntityId::from("b"),
                name: "b".into(),
                lon: -73.0,
                lat: 41.0,
                tier: FillTier::Low,
            },
        ];
        let (x, y) = fleet_bounds(pins.iter());
        assert!(x[0] < -74.0 && x[1] > -73.0, "{x:?}");
        assert!(y[0] < 40.0 && y[1] > 41.0, "{y:?}");

        assert_eq!(fleet_bounds(std::iter::empty()), WORLD);
    }
}
