//! Runtime configuration for the gauge engine.
//!
//! These are resolved, immutable values. Parsing and validation of the TOML
//! file lives in `gauge_config`; `conversions` bridges the two.

use std::time::Duration;

/// Upper bound for the design charge capacity (µAh).
pub const MAX_CHARGE_UAH: u32 = 10_000_000;
/// Upper bound for the design energy (µWh).
pub const MAX_ENERGY_UWH: u32 = 18_500_000;
/// Used when neither µAh nor a usable legacy mAh value is configured.
pub const DEFAULT_CHARGE_UAH: u32 = 5_000_000;
/// Legacy mAh values are accepted only below this bound.
pub const LEGACY_MAH_LIMIT: u32 = 20_000;
/// Nominal Li-ion cell voltage ×10, used to derive energy from charge.
pub const NOMINAL_DECIVOLTS: u64 = 37;

/// Heartbeat period when an alert line drives refreshes.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(300);
/// Poll period when refreshes rely on the timer alone.
pub const DEFAULT_POLL: Duration = Duration::from_secs(30);

/// Design charge and energy capacity, clamped at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignCapacity {
    charge_full_design_uah: u32,
    energy_full_design_uwh: u32,
}

impl Default for DesignCapacity {
    fn default() -> Self {
        Self::from_charge(DEFAULT_CHARGE_UAH)
    }
}

impl DesignCapacity {
    /// Clamp both values into their supported ranges.
    pub fn new(charge_uah: u32, energy_uwh: u32) -> Self {
        Self {
            charge_full_design_uah: charge_uah.clamp(1, MAX_CHARGE_UAH),
            energy_full_design_uwh: energy_uwh.clamp(1, MAX_ENERGY_UWH),
        }
    }

    /// Derive the energy from the charge at the nominal 3.7 V.
    pub fn from_charge(charge_uah: u32) -> Self {
        let charge = charge_uah.clamp(1, MAX_CHARGE_UAH);
        Self::new(charge, energy_from_charge(charge))
    }

    /// Resolve from the optional sources a device description can supply.
    ///
    /// Precedence: explicit µAh, then legacy mAh in (0, 20000) ×1000, then the
    /// 5000 mAh default. Energy: explicit non-zero µWh, else derived at 3.7 V.
    pub fn resolve(
        charge_uah: Option<u32>,
        legacy_mah: Option<u32>,
        energy_uwh: Option<u32>,
    ) -> Self {
        let mut charge = charge_uah.unwrap_or(0);
        if charge_uah.is_none() {
            if let Some(mah) = legacy_mah
                && mah > 0
                && mah < LEGACY_MAH_LIMIT
            {
                charge = mah * 1000;
            }
        }
        if charge == 0 {
            tracing::warn!(
                default_uah = DEFAULT_CHARGE_UAH,
                "design capacity not configured, using default"
            );
            charge = DEFAULT_CHARGE_UAH;
        }
        let charge = charge.min(MAX_CHARGE_UAH);

        let energy = match energy_uwh {
            Some(uwh) if uwh > 0 => uwh,
            _ => energy_from_charge(charge),
        };
        Self::new(charge, energy)
    }

    #[inline]
    pub fn charge_full_design_uah(&self) -> u32 {
        self.charge_full_design_uah
    }

    #[inline]
    pub fn energy_full_design_uwh(&self) -> u32 {
        self.energy_full_design_uwh
    }
}

#[inline]
fn energy_from_charge(charge_uah: u32) -> u32 {
    let uwh = u64::from(charge_uah) * NOMINAL_DECIVOLTS / 10;
    u32::try_from(uwh).unwrap_or(u32::MAX)
}

/// Tick interval selection. Picked once when the monitor starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPolicy {
    /// Long interval used when an alert line is available.
    pub heartbeat: Duration,
    /// Short interval used when the timer is the only trigger.
    pub poll: Duration,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            heartbeat: DEFAULT_HEARTBEAT,
            poll: DEFAULT_POLL,
        }
    }
}

impl IntervalPolicy {
    #[inline]
    pub fn interval(&self, alert_available: bool) -> Duration {
        if alert_available {
            self.heartbeat
        } else {
            self.poll
        }
    }
}

/// How long the alert thread blocks per wait before rechecking shutdown.
pub const DEFAULT_ALERT_WAIT: Duration = Duration::from_millis(500);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_charge_is_clamped() {
        let d = DesignCapacity::resolve(Some(15_000_000), None, None);
        assert_eq!(d.charge_full_design_uah(), MAX_CHARGE_UAH);
        // 10 Ah * 3.7 V = 37 Wh, clamped
        assert_eq!(d.energy_full_design_uwh(), MAX_ENERGY_UWH);
    }

    #[test]
    fn legacy_mah_fallback() {
        let d = DesignCapacity::resolve(None, Some(3000), None);
        assert_eq!(d.charge_full_design_uah(), 3_000_000);
        assert_eq!(d.energy_full_design_uwh(), 11_100_000);
    }

    #[test]
    fn out_of_range_legacy_uses_default() {
        let d = DesignCapacity::resolve(None, Some(25_000), None);
        assert_eq!(d.charge_full_design_uah(), DEFAULT_CHARGE_UAH);
        let d = DesignCapacity::resolve(None, Some(0), None);
        assert_eq!(d.charge_full_design_uah(), DEFAULT_CHARGE_UAH);
    }

    #[test]
    fn explicit_zero_charge_falls_back_to_default() {
        let d = DesignCapacity::resolve(Some(0), Some(3000), None);
        assert_eq!(d.charge_full_design_uah(), DEFAULT_CHARGE_UAH);
    }

    #[test]
    fn zero_energy_is_derived() {
        let d = DesignCapacity::resolve(Some(2_000_000), None, Some(0));
        assert_eq!(d.energy_full_design_uwh(), 7_400_000);
        let d = DesignCapacity::resolve(Some(2_000_000), None, Some(9_000_000));
        assert_eq!(d.energy_full_design_uwh(), 9_000_000);
    }

    #[test]
    fn new_clamps_to_at_least_one() {
        let d = DesignCapacity::new(0, 0);
        assert_eq!(d.charge_full_design_uah(), 1);
        assert_eq!(d.energy_full_design_uwh(), 1);
    }

    #[test]
    fn interval_policy_is_selected_by_alert_availability() {
        let p = IntervalPolicy::default();
        assert_eq!(p.interval(true), Duration::from_secs(300));
        assert_eq!(p.interval(false), Duration::from_secs(30));
    }
}
