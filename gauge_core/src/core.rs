//! On-demand property access.
//!
//! `Gauge` answers one property at a time, reading only the registers that
//! property needs. A transport failure fails just that property; quantities
//! read earlier stay valid. For a consistent multi-property view use
//! [`Gauge::snapshot`].

use gauge_traits::{Register, RegisterReader};

use crate::config::DesignCapacity;
use crate::error::GaugeError;
use crate::estimator::Estimator;
use crate::snapshot::Snapshot;
use crate::status::{CapacityLevel, ChargeStatus, classify_capacity_level, classify_status};
use crate::telemetry::TelemetryEngine;

pub struct Gauge<R> {
    engine: TelemetryEngine<R>,
    estimator: Estimator,
}

impl<R: RegisterReader> Gauge<R> {
    pub fn new(reader: R, design: DesignCapacity) -> Self {
        Self::with_estimator(reader, Estimator::new(design))
    }

    pub fn with_estimator(reader: R, estimator: Estimator) -> Self {
        Self {
            engine: TelemetryEngine::new(reader),
            estimator,
        }
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn design(&self) -> &DesignCapacity {
        self.estimator.design()
    }

    pub fn reader_mut(&mut self) -> &mut R {
        self.engine.reader_mut()
    }

    pub fn into_reader(self) -> R {
        self.engine.into_inner()
    }

    pub fn voltage_now_uv(&mut self) -> Result<i64, GaugeError> {
        self.engine.read_voltage()
    }

    /// State of charge in whole percent.
    pub fn capacity(&mut self) -> Result<u8, GaugeError> {
        self.engine.read_charge_percent()
    }

    pub fn crate_raw(&mut self) -> Result<i16, GaugeError> {
        self.engine.read_crate()
    }

    /// Never fails; unreadable inputs yield `ChargeStatus::Unknown`.
    pub fn status(&mut self) -> ChargeStatus {
        let crate_raw = self.engine.read_crate();
        classify_status(crate_raw, || self.engine.read_charge_percent())
    }

    pub fn capacity_level(&mut self) -> CapacityLevel {
        let pct = self.engine.read_charge_percent();
        let status = self.status();
        classify_capacity_level(pct, status)
    }

    pub fn ac_online(&mut self) -> bool {
        self.status().ac_online()
    }

    pub fn current_now_ua(&mut self) -> Result<i64, GaugeError> {
        let crate_raw = self.engine.read_crate()?;
        Ok(self.estimator.current_ua(crate_raw))
    }

    /// `Err(GaugeError::NoData)` unless discharging beyond the rate threshold.
    ///
    /// SOC is only read once the rate qualifies.
    pub fn time_to_empty_now_s(&mut self) -> Result<u32, GaugeError> {
        let crate_raw = self.engine.read_crate()?;
        if self.estimator.time_to_empty_s(crate_raw, 0).is_none() {
            return Err(GaugeError::NoData);
        }
        let pct = self.engine.read_charge_percent()?;
        self.estimator
            .time_to_empty_s(crate_raw, pct)
            .ok_or(GaugeError::NoData)
    }

    /// `Err(GaugeError::NoData)` unless charging beyond the rate threshold.
    pub fn time_to_full_now_s(&mut self) -> Result<u32, GaugeError> {
        let crate_raw = self.engine.read_crate()?;
        if self.estimator.time_to_full_s(crate_raw, 0).is_none() {
            return Err(GaugeError::NoData);
        }
        let pct = self.engine.read_charge_percent()?;
        self.estimator
            .time_to_full_s(crate_raw, pct)
            .ok_or(GaugeError::NoData)
    }

    pub fn charge_now_uah(&mut self) -> Result<u32, GaugeError> {
        let pct = self.engine.read_charge_percent()?;
        Ok(self.estimator.charge_now_uah(pct))
    }

    pub fn energy_now_uwh(&mut self) -> Result<u32, GaugeError> {
        let pct = self.engine.read_charge_percent()?;
        Ok(self.estimator.energy_now_uwh(pct))
    }

    /// Read-and-clear STATUS, releasing the ALRT line. Returns the flags.
    pub fn acknowledge_alert(&mut self) -> Result<u16, GaugeError> {
        self.engine.read_raw(Register::Status)
    }

    /// One consistent snapshot from a single read of each telemetry register.
    pub fn snapshot(&mut self) -> Result<Snapshot, GaugeError> {
        Snapshot::capture(&mut self.engine, &self.estimator)
    }
}
