// ── Telemetry classification ──
//
// Maps continuous readings onto the discrete tiers that drive colours,
// icons and alert filters. Thresholds are inclusive lower bounds and are
// applied to the raw value: out-of-range readings are classified, never
// clamped. Clamping is for drawing bars only.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::model::DeviceStatus;

pub const CRITICAL_FILL: f64 = 90.0;
pub const HIGH_FILL: f64 = 70.0;
pub const MEDIUM_FILL: f64 = 50.0;
pub const LOW_BATTERY: f64 = 20.0;

/// Named palette entries shared by every surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Hue {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Gray,
}

impl Hue {
    /// 24-bit RGB value.
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Red => (0xef, 0x44, 0x44),
            Self::Orange => (0xf5, 0x9e, 0x0b),
            Self::Yellow => (0xea, 0xb3, 0x08),
            Self::Green => (0x22, 0xc5, 0x5e),
            Self::Blue => (0x3b, 0x82, 0xf6),
            Self::Gray => (0x6b, 0x72, 0x80),
        }
    }

    /// `#rrggbb` form, for serialized output.
    pub fn hex(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Fill severity, most severe first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FillTier {
    Critical,
    High,
    Medium,
    Low,
    Offline,
}

impl FillTier {
    pub const fn hue(self) -> Hue {
        match self {
            Self::Critical => Hue::Red,
            Self::High => Hue::Orange,
            Self::Medium => Hue::Yellow,
            Self::Low => Hue::Green,
            Self::Offline => Hue::Gray,
        }
    }

    /// Whether this tier should raise attention on the dashboard.
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

/// Battery severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BatteryTier {
    Low,
    Normal,
}

impl BatteryTier {
    pub const fn hue(self) -> Hue {
        match self {
            Self::Low => Hue::Red,
            Self::Normal => Hue::Blue,
        }
    }
}

/// Classify a fill reading.
///
/// Any status other than online yields [`FillTier::Offline`] regardless of
/// the reading. NaN compares false against every threshold and lands in
/// [`FillTier::Low`].
pub fn classify_fill(fill_level: f64, status: DeviceStatus) -> FillTier {
    if !status.is_online() {
        return FillTier::Offline;
    }
    if fill_level >= CRITICAL_FILL {
        FillTier::Critical
    } else if fill_level >= HIGH_FILL {
        FillTier::High
    } else if fill_level >= MEDIUM_FILL {
        FillTier::Medium
    } else {
        FillTier::Low
    }
}

/// Classify a battery reading. Exactly 20 is low.
pub fn classify_battery(battery_level: f64) -> BatteryTier {
    if battery_level <= LOW_BATTERY {
        BatteryTier::Low
    } else {
        BatteryTier::Normal
    }
}

/// Clamp a percentage into `0.0..=100.0` for bar widths and labels.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
