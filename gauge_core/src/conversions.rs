//! `From` implementations bridging `gauge_config` types to `gauge_core` types.

use std::time::Duration;

use crate::config::{DesignCapacity, IntervalPolicy};

// ── DesignCapacity ───────────────────────────────────────────────────────────

impl From<&gauge_config::Battery> for DesignCapacity {
    fn from(c: &gauge_config::Battery) -> Self {
        Self::resolve(
            c.charge_full_design_uah,
            c.battery_capacity_mah,
            c.energy_full_design_uwh,
        )
    }
}

// ── IntervalPolicy ───────────────────────────────────────────────────────────

impl From<&gauge_config::Refresh> for IntervalPolicy {
    fn from(c: &gauge_config::Refresh) -> Self {
        Self {
            heartbeat: Duration::from_secs(c.heartbeat_s),
            poll: Duration::from_secs(c.poll_s),
        }
    }
}

/// Alert wait per blocking call on the ALRT line.
pub fn alert_wait(c: &gauge_config::Refresh) -> Duration {
    Duration::from_millis(c.alert_wait_ms)
}
