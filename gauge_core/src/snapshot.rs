//! Per-pass snapshot assembly and the publication boundary.

use gauge_traits::RegisterReader;

use crate::config::DesignCapacity;
use crate::error::GaugeError;
use crate::estimator::{DerivedEstimates, Estimator};
use crate::status::{CapacityLevel, ChargeStatus, classify_capacity_level, classify_status};
use crate::telemetry::{Telemetry, TelemetryEngine};

/// Static identity reported alongside every snapshot.
pub const MODEL_NAME: &str = "MAX17048";
pub const MANUFACTURER: &str = "Maxim Integrated";
pub const TECHNOLOGY: &str = "LiPo";

/// Everything published for one refresh pass. Built from a single set of
/// register reads and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub telemetry: Telemetry,
    pub status: ChargeStatus,
    pub capacity_level: CapacityLevel,
    pub estimates: DerivedEstimates,
    pub ac_online: bool,
    pub design: DesignCapacity,
}

impl Snapshot {
    /// Assemble a snapshot from readings already taken.
    pub fn from_telemetry(telemetry: Telemetry, estimator: &Estimator) -> Self {
        let status = classify_status(Ok(telemetry.crate_raw), || Ok(telemetry.charge_percent));
        let capacity_level = classify_capacity_level(Ok(telemetry.charge_percent), status);
        Self {
            telemetry,
            status,
            capacity_level,
            estimates: estimator.estimate(&telemetry),
            ac_online: status.ac_online(),
            design: *estimator.design(),
        }
    }

    /// Read VCELL, SOC and CRATE once each and derive the rest from them.
    ///
    /// Any failed read fails the whole capture; no snapshot mixes fresh and
    /// stale values.
    pub fn capture<R: RegisterReader>(
        engine: &mut TelemetryEngine<R>,
        estimator: &Estimator,
    ) -> Result<Self, GaugeError> {
        let telemetry = engine.read_all()?;
        Ok(Self::from_telemetry(telemetry, estimator))
    }
}

/// Sink for "telemetry changed" notifications.
///
/// Called once per completed refresh pass from the monitor's worker thread.
/// Best-effort: publishing cannot fail the pass.
pub trait Publisher {
    fn publish(&mut self, snapshot: &Snapshot);
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, snapshot: &Snapshot) {
        (**self).publish(snapshot);
    }
}
