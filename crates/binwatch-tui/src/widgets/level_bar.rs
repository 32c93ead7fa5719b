//! Percentage bars for fill and battery readings.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

use binwatch_core::clamp_percent;

use crate::theme;

/// Number of filled cells for `value` in a bar `width` cells wide.
/// The value is clamped to 0..=100 first; the reading itself is untouched.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn filled_cells(value: f64, width: u16) -> u16 {
    let cells = (clamp_percent(value) / 100.0 * f64::from(width)).round() as u16;
    cells.min(width)
}

/// `████░░░░  42%` as styled spans.
pub fn level_bar(value: f64, width: u16, color: Color) -> Vec<Span<'static>> {
    let filled = filled_cells(value, width);
    vec![
        Span::styled(
            "█".repeat(usize::from(filled)),
            Style::default().fg(color),
        ),
        Span::styled(
            "░".repeat(usize::from(width - filled)),
            Style::default().fg(theme::BORDER_GRAY),
        ),
        Span::styled(
            format!(" {:>3.0}%", clamp_percent(value)),
            Style::default().fg(color),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_clamp_for_display() {
        assert_eq!(filled_cells(150.0, 10), 10);
        assert_eq!(filled_cells(-20.0, 10), 0);
        assert_eq!(filled_cells(f64::NAN, 10), 0);
        assert_eq!(filled_cells(44.0, 10), 4);
        assert_eq!(filled_cells(45.0, 10), 5);
    }

    #[test]
    fn label_shows_clamped_percentage() {
        let spans = level_bar(123.4, 4, theme::ERROR);
        assert_eq!(spans[0].content, "████");
        assert_eq!(spans[1].content, "");
        assert_eq!(spans[2].content, " 100%");
    }
}
