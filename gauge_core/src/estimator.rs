//! Derived battery quantities: current, remaining charge/energy and
//! time-to-empty/full.
//!
//! All functions are pure over the design capacity and one set of readings.
//!
//! C-rate LSB is 0.208 %/hr of design capacity, so
//! `I(µA) = design_uah * crate * 0.208 / 100 = design_uah * crate * 52 / 25000`,
//! and the time to move `pct` percent of capacity at `crate` LSB is
//! `pct / (crate * 0.208) h = 225000 * pct / (crate * 13) s` (rounded constant).

use crate::config::DesignCapacity;
use crate::fixed_point::{mul_div_trunc_i64, narrow_u32, percent_of_u32};
use crate::telemetry::Telemetry;

pub const CRATE_LSB_NUM: i64 = 52;
pub const CRATE_LSB_DEN: i64 = 25_000;
pub const TIME_CONST_NUM: i64 = 225_000;
pub const TIME_CONST_DEN: i64 = 13;
/// Minimum |crate| (exclusive) for a time estimate to be reported.
pub const TIME_RATE_THRESHOLD_LSB: i16 = 10;
/// Empirical multiplier on time-to-empty, fitted to observed discharge
/// curves. Not applied to time-to-full.
pub const TTE_TUNING_FACTOR: u32 = 8;

/// Quantities derived from one set of readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedEstimates {
    pub current_ua: i64,
    pub time_to_empty_s: Option<u32>,
    pub time_to_full_s: Option<u32>,
    pub energy_now_uwh: u32,
    pub charge_now_uah: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimator {
    design: DesignCapacity,
    tte_tuning_factor: u32,
}

impl Estimator {
    pub fn new(design: DesignCapacity) -> Self {
        Self {
            design,
            tte_tuning_factor: TTE_TUNING_FACTOR,
        }
    }

    /// Override the time-to-empty calibration multiplier.
    pub fn with_tte_tuning_factor(mut self, factor: u32) -> Self {
        self.tte_tuning_factor = factor;
        self
    }

    pub fn design(&self) -> &DesignCapacity {
        &self.design
    }

    pub fn tte_tuning_factor(&self) -> u32 {
        self.tte_tuning_factor
    }

    /// Signed battery current in µA; positive while charging.
    pub fn current_ua(&self, crate_raw: i16) -> i64 {
        let cap = i64::from(self.design.charge_full_design_uah());
        mul_div_trunc_i64(
            cap * i64::from(crate_raw),
            CRATE_LSB_NUM,
            CRATE_LSB_DEN,
        )
    }

    /// Seconds until empty, or `None` unless discharging faster than the
    /// rate threshold.
    pub fn time_to_empty_s(&self, crate_raw: i16, charge_percent: u8) -> Option<u32> {
        if crate_raw >= -TIME_RATE_THRESHOLD_LSB {
            return None;
        }
        let rate = i64::from(crate_raw).abs();
        let num = TIME_CONST_NUM * i64::from(charge_percent) * i64::from(self.tte_tuning_factor);
        Some(narrow_u32(num / (rate * TIME_CONST_DEN)))
    }

    /// Seconds until full, or `None` unless charging faster than the rate
    /// threshold.
    pub fn time_to_full_s(&self, crate_raw: i16, charge_percent: u8) -> Option<u32> {
        if crate_raw <= TIME_RATE_THRESHOLD_LSB {
            return None;
        }
        let remaining = 100 - i64::from(charge_percent.min(100));
        Some(narrow_u32(
            TIME_CONST_NUM * remaining / (i64::from(crate_raw) * TIME_CONST_DEN),
        ))
    }

    pub fn charge_now_uah(&self, charge_percent: u8) -> u32 {
        percent_of_u32(charge_percent, self.design.charge_full_design_uah())
    }

    pub fn energy_now_uwh(&self, charge_percent: u8) -> u32 {
        percent_of_u32(charge_percent, self.design.energy_full_design_uwh())
    }

    pub fn estimate(&self, t: &Telemetry) -> DerivedEstimates {
        DerivedEstimates {
            current_ua: self.current_ua(t.crate_raw),
            time_to_empty_s: self.time_to_empty_s(t.crate_raw, t.charge_percent),
            time_to_full_s: self.time_to_full_s(t.crate_raw, t.charge_percent),
            energy_now_uwh: self.energy_now_uwh(t.charge_percent),
            charge_now_uah: self.charge_now_uah(t.charge_percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn est() -> Estimator {
        Estimator::new(DesignCapacity::from_charge(5_000_000))
    }

    #[test]
    fn current_sign_follows_crate() {
        // 5 Ah * 0.208 % = 10.4 mA per LSB
        assert_eq!(est().current_ua(1), 10_400);
        assert_eq!(est().current_ua(-1), -10_400);
        assert_eq!(est().current_ua(0), 0);
    }

    #[test]
    fn current_truncates_toward_zero() {
        let e = Estimator::new(DesignCapacity::from_charge(1_000));
        // 1000 * 3 * 52 / 25000 = 6.24
        assert_eq!(e.current_ua(3), 6);
        assert_eq!(e.current_ua(-3), -6);
    }

    #[test]
    fn time_to_empty_boundary() {
        assert_eq!(est().time_to_empty_s(-10, 50), None);
        assert!(est().time_to_empty_s(-11, 50).is_some());
        assert_eq!(
            est().time_to_empty_s(-20, 50),
            Some((225_000u64 * 50 * 8 / (20 * 13)) as u32)
        );
    }

    #[test]
    fn time_to_full_boundary_and_no_tuning() {
        assert_eq!(est().time_to_full_s(10, 50), None);
        assert_eq!(
            est().time_to_full_s(20, 50),
            Some((225_000u64 * 50 / (20 * 13)) as u32)
        );
        assert_eq!(est().time_to_full_s(20, 100), Some(0));
    }

    #[test]
    fn tuning_factor_is_overridable() {
        let e = est().with_tte_tuning_factor(1);
        assert_eq!(e.time_to_empty_s(-20, 50), Some(225_000 * 50 / (20 * 13)));
        assert_eq!(e.time_to_full_s(20, 50), est().time_to_full_s(20, 50));
    }

    #[test]
    fn extreme_negative_crate_does_not_overflow() {
        assert_eq!(
            est().time_to_empty_s(i16::MIN, 100),
            Some((225_000u64 * 100 * 8 / (32_768 * 13)) as u32)
        );
        assert_eq!(est().current_ua(i16::MIN), -340_787_200);
    }
}
