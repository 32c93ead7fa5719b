//! Aggregate statistics, with an optional client-side cross-check.

use serde::Serialize;
use tabled::Tabled;

use binwatch_core::{ConsistencyReport, Monitor, Stats, consistency};

use crate::cli::{GlobalOpts, StatsArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

#[derive(Serialize)]
struct StatsView<'a> {
    #[serde(flatten)]
    stats: &'a Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<ConsistencyReport>,
}

#[derive(Tabled)]
struct DiscrepancyRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Backend")]
    declared: String,
    #[tabled(rename = "Computed")]
    computed: String,
}

fn detail(view: &StatsView<'_>, painter: Painter) -> String {
    let s = view.stats;
    let mut lines = vec![
        format!("Total bins:      {}", s.total_bins),
        format!("Full bins:       {}", s.full_bins),
        format!("Offline bins:    {}", s.offline_bins),
        format!("Low battery:     {}", s.low_battery_bins),
        format!("Average fill:    {:.1}%", s.avg_fill_level),
        format!("Unread alerts:   {}", s.unread_notifications),
        format!("Last updated:    {}", util::timestamp(&s.last_updated)),
    ];

    if let Some(report) = &view.check {
        lines.push(String::new());
        if report.is_consistent() {
            lines.push(painter.hue(binwatch_core::Hue::Green, "Consistent with device list"));
        } else {
            lines.push(painter.hue(
                binwatch_core::Hue::Orange,
                &format!("{} field(s) disagree with the device list:", report.discrepancies.len()),
            ));
            let rows: Vec<DiscrepancyRow> = report
                .discrepancies
                .iter()
                .map(|d| DiscrepancyRow {
                    field: d.field.to_string(),
                    declared: trim_number(d.declared),
                    computed: trim_number(d.computed),
                })
                .collect();
            lines.push(
                tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string(),
            );
        }
    }
    lines.join("\n")
}

/// `3` for whole numbers, `41.5` otherwise.
fn trim_number(v: f64) -> String {
    if v.fract().abs() < f64::EPSILON {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn plain(view: &StatsView<'_>) -> String {
    let s = view.stats;
    let mut lines = vec![
        format!("total_bins={}", s.total_bins),
        format!("full_bins={}", s.full_bins),
        format!("offline_bins={}", s.offline_bins),
        format!("low_battery_bins={}", s.low_battery_bins),
        format!("avg_fill_level={:.1}", s.avg_fill_level),
        format!("unread_notifications={}", s.unread_notifications),
    ];
    if let Some(report) = &view.check {
        lines.push(format!("consistent={}", report.is_consistent()));
    }
    lines.join("\n")
}

pub async fn handle(monitor: &Monitor, args: StatsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Stats and devices come from the same poll so the check compares
    // like with like.
    let snapshot = monitor.poll_now().await?;
    let view = StatsView {
        stats: &snapshot.stats,
        check: args.check.then(|| consistency::check(&snapshot)),
    };

    let painter = Painter::new(&global.color_mode());
    let out = output::render_single(&global.format(), &view, |v| detail(v, painter), plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_print_without_decimals() {
        assert_eq!(trim_number(3.0), "3");
        assert_eq!(trim_number(41.6), "41.6");
    }
}
