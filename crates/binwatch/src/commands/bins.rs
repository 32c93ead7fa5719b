//! Bin command handlers.

use serde::Serialize;
use tabled::Tabled;

use binwatch_core::{BatteryTier, Device, EntityId, FillTier, Monitor};

use crate::cli::{BinsArgs, BinsCommand, GlobalOpts, TierFilter};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Serialized view ─────────────────────────────────────────────────

/// A device plus its derived tiers, for structured output.
#[derive(Serialize)]
struct BinView<'a> {
    #[serde(flatten)]
    device: &'a Device,
    fill_tier: FillTier,
    battery_tier: BatteryTier,
    color: String,
}

impl<'a> From<&'a Device> for BinView<'a> {
    fn from(device: &'a Device) -> Self {
        let fill_tier = device.fill_tier();
        Self {
            device,
            fill_tier,
            battery_tier: device.battery_tier(),
            color: fill_tier.hue().hex(),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct BinRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fill")]
    fill: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Battery")]
    battery: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Address")]
    address: String,
}

fn row(view: &BinView<'_>, painter: Painter) -> BinRow {
    let d = view.device;
    BinRow {
        id: d.id.to_string(),
        name: d.name.clone(),
        fill: painter.fill(view.fill_tier, &output::bar(d.fill_level)),
        tier: painter.fill(view.fill_tier, &view.fill_tier.to_string()),
        battery: painter.battery(view.battery_tier, &output::percent(d.battery_level)),
        status: d.status.to_string(),
        address: d.location.address.clone(),
    }
}

fn detail(view: &BinView<'_>, painter: Painter) -> String {
    let d = view.device;
    [
        format!("ID:          {}", d.id),
        format!("Name:        {}", d.name),
        format!("Status:      {}", d.status),
        format!(
            "Fill:        {} ({})",
            painter.fill(view.fill_tier, &output::bar(d.fill_level)),
            view.fill_tier
        ),
        format!(
            "Battery:     {} ({})",
            painter.battery(view.battery_tier, &output::percent(d.battery_level)),
            view.battery_tier
        ),
        format!("Temperature: {}", util::reading(d.temperature, "°C")),
        format!("Humidity:    {}", util::reading(d.humidity, "%")),
        format!("Address:     {}", d.location.address),
        format!(
            "Position:    {:.5}, {:.5}",
            d.location.latitude, d.location.longitude
        ),
        format!("Updated:     {}", util::timestamp(&d.last_updated)),
    ]
    .join("\n")
}

// ── Filters ─────────────────────────────────────────────────────────

impl From<TierFilter> for FillTier {
    fn from(filter: TierFilter) -> Self {
        match filter {
            TierFilter::Critical => Self::Critical,
            TierFilter::High => Self::High,
            TierFilter::Medium => Self::Medium,
            TierFilter::Low => Self::Low,
            TierFilter::Offline => Self::Offline,
        }
    }
}

fn matches(device: &Device, tier: Option<FillTier>, low_battery: bool) -> bool {
    tier.is_none_or(|t| device.fill_tier() == t)
        && (!low_battery || device.battery_tier() == BatteryTier::Low)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(monitor: &Monitor, args: BinsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let painter = Painter::new(&global.color_mode());
    let format = global.format();

    let out = match args.command {
        BinsCommand::List { tier, low_battery } => {
            let snapshot = monitor.poll_now().await?;
            let tier = tier.map(FillTier::from);
            let views: Vec<BinView<'_>> = snapshot
                .devices
                .iter()
                .filter(|d| matches(d, tier, low_battery))
                .map(|d| BinView::from(&**d))
                .collect();
            output::render_list(
                &format,
                &views,
                |v| row(v, painter),
                |v| v.device.id.to_string(),
            )?
        }
        BinsCommand::Show { id } => {
            let device = monitor
                .device(&EntityId::from(id.as_str()))
                .await
                .map_err(|e| CliError::not_found_or(e, "bin", &id, "bins list"))?;
            let view = BinView::from(&device);
            output::render_single(
                &format,
                &view,
                |v| detail(v, painter),
                |v| v.device.id.to_string(),
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use binwatch_core::{DeviceStatus, Location};

    use super::*;

    fn device(fill: f64, battery: f64, status: DeviceStatus) -> Device {
        Device {
            id: EntityId::from("b1"),
            name: "Main St".into(),
            location: Location {
                latitude: 40.7,
                longitude: -74.0,
                address: "1 Main St".into(),
            },
            fill_level: fill,
            battery_level: battery,
            status,
            temperature: Some(18.5),
            humidity: None,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn tier_and_battery_filters_combine() {
        let full_low = device(95.0, 15.0, DeviceStatus::Online);
        assert!(matches(&full_low, Some(FillTier::Critical), true));
        assert!(!matches(&full_low, Some(FillTier::High), false));

        let offline = device(95.0, 80.0, DeviceStatus::Offline);
        assert!(matches(&offline, Some(FillTier::Offline), false));
        assert!(!matches(&offline, None, true));
    }

    #[test]
    fn view_carries_tier_colour() {
        let d = device(75.0, 50.0, DeviceStatus::Online);
        let view = BinView::from(&d);
        assert_eq!(view.fill_tier, FillTier::High);
        assert_eq!(view.color, "#f59e0b");
    }
}
