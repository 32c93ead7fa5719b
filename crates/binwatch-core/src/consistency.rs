// ── Client-side stats consistency check ──
//
// The backend's stats are authoritative and are never replaced by local
// numbers. This module only recomputes what it can from the device list
// and reports where the two disagree, for logs and `stats --check`.
//
// Counting rules:
//   full        online and fill >= 90 (i.e. classified Critical)
//   offline     status == offline
//   low battery battery <= 20
//   average     mean fill, rounded to one decimal

use serde::Serialize;
use strum::Display;

use crate::classify::{BatteryTier, FillTier};
use crate::model::{Device, DeviceStatus};
use crate::store::Snapshot;

const AVG_TOLERANCE: f64 = 0.051;

/// Aggregates recomputed from a device list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStats {
    pub total_bins: u32,
    pub full_bins: u32,
    pub offline_bins: u32,
    pub low_battery_bins: u32,
    pub avg_fill_level: f64,
}

impl ComputedStats {
    pub fn from_devices<'a, I>(devices: I) -> Self
    where
        I: IntoIterator<Item = &'a Device>,
    {
        let mut out = Self {
            total_bins: 0,
            full_bins: 0,
            offline_bins: 0,
            low_battery_bins: 0,
            avg_fill_level: 0.0,
        };
        let mut fill_sum = 0.0;
        for device in devices {
            out.total_bins += 1;
            fill_sum += device.fill_level;
            if device.fill_tier() == FillTier::Critical {
                out.full_bins += 1;
            }
            if device.status == DeviceStatus::Offline {
                out.offline_bins += 1;
            }
            if device.battery_tier() == BatteryTier::Low {
                out.low_battery_bins += 1;
            }
        }
        if out.total_bins > 0 {
            let mean = fill_sum / f64::from(out.total_bins);
            out.avg_fill_level = (mean * 10.0).round() / 10.0;
        }
        out
    }
}

/// Which aggregate disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatField {
    TotalBins,
    FullBins,
    OfflineBins,
    LowBatteryBins,
    AvgFillLevel,
}

/// One disagreement between backend-declared and recomputed values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub field: StatField,
    pub declared: f64,
    pub computed: f64,
}

/// Outcome of comparing a snapshot's stats with its own device list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub computed: ComputedStats,
    pub discrepancies: Vec<Discrepancy>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
    }

    pub fn field(&self, field: StatField) -> Option<&Discrepancy> {
        self.discrepancies.iter().find(|d| d.field == field)
    }
}

/// Recompute what can be recomputed and compare.
pub fn check(snapshot: &Snapshot) -> ConsistencyReport {
    let computed = ComputedStats::from_devices(snapshot.devices.iter().map(|d| &**d));
    let stats = &snapshot.stats;

    let counts = [
        (StatField::TotalBins, stats.total_bins, computed.total_bins),
        (StatField::FullBins, stats.full_bins, computed.full_bins),
        (StatField::OfflineBins, stats.offline_bins, computed.offline_bins),
        (
            StatField::LowBatteryBins,
            stats.low_battery_bins,
            computed.low_battery_bins,
        ),
    ];

    let mut discrepancies: Vec<Discrepancy> = counts
        .into_iter()
        .filter(|(_, declared, computed)| declared != computed)
        .map(|(field, declared, computed)| Discrepancy {
            field,
            declared: f64::from(declared),
            computed: f64::from(computed),
        })
        .collect();

    if computed.total_bins > 0
        && (stats.avg_fill_level - computed.avg_fill_level).abs() > AVG_TOLERANCE
    {
        discrepancies.push(Discrepancy {
            field: StatField::AvgFillLevel,
            declared: stats.avg_fill_level,
            computed: computed.avg_fill_level,
        });
    }

    ConsistencyReport {
        computed,
        discrepancies,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{EntityId, Location, Stats};

    fn device(id: u64, fill: f64, battery: f64, status: DeviceStatus) -> Device {
        Device {
            id: EntityId::from(id),
            name: format!("Bin {id}"),
            location: Location {
                latitude: 40.7,
                longitude: -74.0,
                address: String::new(),
            },
            fill_level: fill,
            battery_level: battery,
            status,
            temperature: None,
            humidity: None,
            last_updated: Utc::now(),
        }
    }

    fn stats(total: u32, full: u32, offline: u32, low: u32, avg: f64) -> Stats {
        Stats {
            total_bins: total,
            full_bins: full,
            offline_bins: offline,
            low_battery_bins: low,
            avg_fill_level: avg,
            unread_notifications: 0,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn single_critical_bin_matches_declared_full_count() {
        let snap = Snapshot::new(
            vec![device(1, 95.0, 80.0, DeviceStatus::Online)],
            Vec::new(),
            stats(1, 1, 0, 0, 95.0),
            Utc::now(),
        );
        assert_eq!(snap.devices[0].fill_tier(), FillTier::Critical);
        let report = check(&snap);
        assert!(report.is_consistent(), "{report:?}");
        assert_eq!(report.computed.full_bins, snap.stats.full_bins);
    }

    #[test]
    fn offline_full_bin_is_reported_not_counted() {
        // Backend counts fill >= 90 regardless of status.
        let snap = Snapshot::new(
            vec![
                device(1, 95.0, 80.0, DeviceStatus::Online),
                device(2, 97.0, 10.0, DeviceStatus::Offline),
            ],
            Vec::new(),
            stats(2, 2, 1, 1, 96.0),
            Utc::now(),
        );
        let report = check(&snap);
        assert_eq!(
            report.discrepancies,
            vec![Discrepancy {
                field: StatField::FullBins,
                declared: 2.0,
                computed: 1.0,
            }]
        );
    }

    #[test]
    fn average_is_rounded_before_comparison() {
        let snap = Snapshot::new(
            vec![
                device(1, 10.0, 80.0, DeviceStatus::Online),
                device(2, 20.05, 80.0, DeviceStatus::Online),
            ],
            Vec::new(),
            stats(2, 0, 0, 0, 15.0),
            Utc::now(),
        );
        let report = check(&snap);
        assert!(report.field(StatField::AvgFillLevel).is_none(), "{report:?}");
    }

    #[test]
    fn stale_totals_are_flagged() {
        let snap = Snapshot::new(
            vec![device(1, 40.0, 15.0, DeviceStatus::Online)],
            Vec::new(),
            stats(3, 0, 0, 0, 40.0),
            Utc::now(),
        );
        let report = check(&snap);
        assert!(report.field(StatField::TotalBins).is_some());
        assert!(report.field(StatField::LowBatteryBins).is_some());
        assert_eq!(report.discrepancies.len(), 2);
    }

    #[test]
    fn empty_fleet_skips_average() {
        let snap = Snapshot::new(Vec::new(), Vec::new(), stats(0, 0, 0, 0, 0.0), Utc::now());
        assert!(check(&snap).is_consistent());
    }
}
