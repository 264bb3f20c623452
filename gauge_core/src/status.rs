//! Charge status and capacity-level classification.
//!
//! Stateless threshold rules; nothing here remembers the previous result.

use crate::error::GaugeError;

/// C-rate noise band: |crate| <= 4 LSB (~0.8 %/hr) counts as "no current".
pub const CRATE_NOISE_LSB: i16 = 4;
/// Minimum SOC for a resting battery to be reported full.
pub const FULL_SOC_PCT: u8 = 95;
pub const CAP_FULL_PCT: u8 = 99;
pub const CAP_CRITICAL_PCT: u8 = 5;
pub const CAP_LOW_PCT: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    Charging,
    Discharging,
    Full,
    NotCharging,
    Unknown,
}

impl ChargeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChargeStatus::Charging => "Charging",
            ChargeStatus::Discharging => "Discharging",
            ChargeStatus::Full => "Full",
            ChargeStatus::NotCharging => "Not charging",
            ChargeStatus::Unknown => "Unknown",
        }
    }

    /// External power is considered present while charging or held full.
    pub fn ac_online(self) -> bool {
        matches!(self, ChargeStatus::Charging | ChargeStatus::Full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityLevel {
    Full,
    Normal,
    Low,
    Critical,
    Unknown,
}

impl CapacityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CapacityLevel::Full => "Full",
            CapacityLevel::Normal => "Normal",
            CapacityLevel::Low => "Low",
            CapacityLevel::Critical => "Critical",
            CapacityLevel::Unknown => "Unknown",
        }
    }
}

/// Classify charge status from the C-rate, reading the SOC only inside the
/// noise band.
///
/// A failed C-rate read yields `Unknown`. A failed SOC read inside the band
/// yields `NotCharging`, since "full" cannot be confirmed.
pub fn classify_status<F>(crate_raw: Result<i16, GaugeError>, charge_percent: F) -> ChargeStatus
where
    F: FnOnce() -> Result<u8, GaugeError>,
{
    let Ok(crate_raw) = crate_raw else {
        return ChargeStatus::Unknown;
    };
    if crate_raw > CRATE_NOISE_LSB {
        return ChargeStatus::Charging;
    }
    if crate_raw < -CRATE_NOISE_LSB {
        return ChargeStatus::Discharging;
    }
    match charge_percent() {
        Ok(pct) if pct >= FULL_SOC_PCT => ChargeStatus::Full,
        _ => ChargeStatus::NotCharging,
    }
}

/// Bucket the SOC into a capacity level. A `Full` status wins over the
/// percentage thresholds.
pub fn classify_capacity_level(
    charge_percent: Result<u8, GaugeError>,
    status: ChargeStatus,
) -> CapacityLevel {
    let Ok(pct) = charge_percent else {
        return CapacityLevel::Unknown;
    };
    if status == ChargeStatus::Full || pct >= CAP_FULL_PCT {
        CapacityLevel::Full
    } else if pct <= CAP_CRITICAL_PCT {
        CapacityLevel::Critical
    } else if pct <= CAP_LOW_PCT {
        CapacityLevel::Low
    } else {
        CapacityLevel::Normal
    }
}
