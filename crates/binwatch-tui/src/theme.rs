//! Palette and semantic styles. Tier colours come from the shared
//! [`Hue`] table so the TUI and CLI agree on what "critical" looks like.

use ratatui::style::{Color, Modifier, Style};

use binwatch_core::{BatteryTier, FillTier, Hue, Priority};

// ── Chrome ────────────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29
pub const MAP_LAND: Color = Color::Rgb(68, 71, 90); // #44475a

// ── Tier colours ──────────────────────────────────────────────────────

pub const fn hue(hue: Hue) -> Color {
    let (r, g, b) = hue.rgb();
    Color::Rgb(r, g, b)
}

pub const SUCCESS: Color = hue(Hue::Green);
pub const WARNING: Color = hue(Hue::Yellow);
pub const ERROR: Color = hue(Hue::Red);

pub fn fill(tier: FillTier) -> Color {
    hue(tier.hue())
}

pub fn battery(tier: BatteryTier) -> Color {
    hue(tier.hue())
}

pub fn priority(priority: Priority) -> Color {
    match priority {
        Priority::Critical => hue(Hue::Red),
        Priority::High => hue(Hue::Orange),
        Priority::Medium => hue(Hue::Yellow),
        Priority::Low | Priority::Other => DIM_WHITE,
    }
}

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

pub fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(BORDER_GRAY)
    }
}

pub fn table_header() -> Style {
    Style::default()
        .fg(CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}
