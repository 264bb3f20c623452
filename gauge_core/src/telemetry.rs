//! Raw register code → physical quantity conversions.
//!
//! The pure `*_from_raw` functions carry the arithmetic; `TelemetryEngine`
//! pairs them with a register reader and maps transport failures to
//! `GaugeError`. Nothing is cached: every call reads the chip again.

use gauge_traits::{Register, RegisterReader};

use crate::error::GaugeError;
use crate::fixed_point::mul_div_trunc_i64;
use crate::hw_error::map_transport_error;

/// VCELL scale: 78.125 µV/LSB = 625/8.
pub const VCELL_LSB_NUM: i64 = 625;
pub const VCELL_LSB_DEN: i64 = 8;
/// SOC scale: 1/256 % per LSB.
pub const SOC_LSB_INV: u16 = 256;
/// Largest state of charge ever reported.
pub const SOC_MAX_PCT: u8 = 100;

/// Cell voltage in µV, truncating.
#[inline]
pub fn voltage_uv_from_raw(raw: u16) -> i64 {
    mul_div_trunc_i64(i64::from(raw), VCELL_LSB_NUM, VCELL_LSB_DEN)
}

/// Whole-percent state of charge, floored and clamped to 100.
///
/// The chip can report slightly above 100% after calibration drift; that is
/// clamped, not rejected.
#[inline]
pub fn charge_percent_from_raw(raw: u16) -> u8 {
    let pct = raw / SOC_LSB_INV;
    u8::try_from(pct).unwrap_or(u8::MAX).min(SOC_MAX_PCT)
}

/// C-rate code sign-extended from the 16-bit register (0.208 %/hr per LSB).
#[inline]
pub fn crate_from_raw(raw: u16) -> i16 {
    raw as i16
}

/// One consistent set of converted register readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telemetry {
    pub voltage_uv: i64,
    pub charge_percent: u8,
    pub crate_raw: i16,
}

/// Register-backed conversion layer.
pub struct TelemetryEngine<R> {
    reader: R,
}

impl<R: RegisterReader> TelemetryEngine<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read one register, mapping trait-boundary errors to `GaugeError`.
    pub fn read_raw(&mut self, register: Register) -> Result<u16, GaugeError> {
        self.reader
            .read(register)
            .map_err(|e| map_transport_error(register, &*e))
    }

    pub fn read_voltage(&mut self) -> Result<i64, GaugeError> {
        self.read_raw(Register::Vcell).map(voltage_uv_from_raw)
    }

    pub fn read_charge_percent(&mut self) -> Result<u8, GaugeError> {
        self.read_raw(Register::Soc).map(charge_percent_from_raw)
    }

    pub fn read_crate(&mut self) -> Result<i16, GaugeError> {
        self.read_raw(Register::Crate).map(crate_from_raw)
    }

    /// Read VCELL, SOC and CRATE once each, in that order.
    ///
    /// The three reads are not atomic with respect to the chip; the gauge may
    /// update between them.
    pub fn read_all(&mut self) -> Result<Telemetry, GaugeError> {
        let voltage_uv = self.read_voltage()?;
        let charge_percent = self.read_charge_percent()?;
        let crate_raw = self.read_crate()?;
        Ok(Telemetry {
            voltage_uv,
            charge_percent,
            crate_raw,
        })
    }
}
