//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use binwatch_core::{BatteryTier, FillTier, Hue, Priority};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Applies the shared tier palette, or nothing when color is off.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: &ColorMode) -> Self {
        Self {
            enabled: should_color(mode),
        }
    }

    pub fn hue(self, hue: Hue, text: &str) -> String {
        if !self.enabled {
            return text.to_owned();
        }
        let (r, g, b) = hue.rgb();
        text.truecolor(r, g, b).to_string()
    }

    pub fn fill(self, tier: FillTier, text: &str) -> String {
        self.hue(tier.hue(), text)
    }

    pub fn battery(self, tier: BatteryTier, text: &str) -> String {
        self.hue(tier.hue(), text)
    }

    pub fn priority(self, priority: Priority, text: &str) -> String {
        match priority {
            Priority::Critical => self.hue(Hue::Red, text),
            Priority::High => self.hue(Hue::Orange, text),
            Priority::Medium => self.hue(Hue::Yellow, text),
            Priority::Low | Priority::Other => text.to_owned(),
        }
    }

    pub fn dim(self, text: &str) -> String {
        if self.enabled {
            text.dimmed().to_string()
        } else {
            text.to_owned()
        }
    }

    pub fn bold(self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json_pretty(data)?,
        OutputFormat::JsonCompact => render_json_compact(data)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted
/// string, since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json_pretty(data)?,
        OutputFormat::JsonCompact => render_json_compact(data)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(
    data: &T,
) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(
    data: &T,
) -> Result<String, CliError> {
    Ok(serde_json::to_string(data)?)
}

pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

// ── Small value formatters ───────────────────────────────────────────

/// `42%`, clamped for display only.
pub fn percent(value: f64) -> String {
    format!("{:.0}%", binwatch_core::clamp_percent(value))
}

/// `▇▇▇▇░░░░░░ 42%` style bar, ten cells wide.
pub fn bar(value: f64) -> String {
    let clamped = binwatch_core::clamp_percent(value);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    let filled = (clamped / 10.0).round() as usize;
    format!("{}{} {}", "▇".repeat(filled), "░".repeat(10 - filled), percent(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_clamps_out_of_range_values() {
        assert_eq!(bar(150.0), "▇▇▇▇▇▇▇▇▇▇ 100%");
        assert_eq!(bar(-5.0), "░░░░░░░░░░ 0%");
        assert_eq!(bar(44.0), "▇▇▇▇░░░░░░ 44%");
    }

    #[test]
    fn painter_without_color_is_identity() {
        let p = Painter::new(&ColorMode::Never);
        assert_eq!(p.fill(FillTier::Critical, "95%"), "95%");
        assert_eq!(p.bold("x"), "x");
    }

    #[test]
    fn painter_with_color_emits_truecolor() {
        let p = Painter::new(&ColorMode::Always);
        let painted = p.fill(FillTier::Critical, "95%");
        assert!(painted.contains("38;2;239;68;68"), "{painted:?}");
    }
}
