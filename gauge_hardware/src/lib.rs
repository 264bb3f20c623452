pub mod error;
#[cfg(feature = "hardware")]
pub mod max17048;

use gauge_traits::{Register, RegisterReader};

use crate::error::HwError;

/// Power-on value of the CONFIG register (RCOMP 0x97, 3% alert threshold).
const CONFIG_POR: u16 = 0x971C;
/// Power-on value of VALRT (alerts disabled: min 0 V, max 5.1 V).
const VALRT_POR: u16 = 0x00FF;

/// Empty-cell and full-cell voltages used for synthetic traces, in µV.
const SIM_EMPTY_UV: u32 = 3_300_000;
const SIM_FULL_UV: u32 = 4_200_000;

/// One set of telemetry register codes as the chip would report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimFrame {
    pub vcell: u16,
    pub soc: u16,
    pub crate_raw: i16,
}

impl SimFrame {
    /// Frame for a whole-percent state of charge with a linear OCV curve.
    pub fn at_percent(pct: u8, crate_raw: i16) -> Self {
        let pct = u32::from(pct.min(100));
        let uv = SIM_EMPTY_UV + (SIM_FULL_UV - SIM_EMPTY_UV) * pct / 100;
        // 78.125 µV/LSB
        let vcell = u16::try_from(uv * 8 / 625).unwrap_or(u16::MAX);
        Self {
            vcell,
            soc: (pct * 256) as u16,
            crate_raw,
        }
    }
}

/// Simulated MAX17048 replaying a trace of register frames.
///
/// The trace advances by one frame every time VCELL is sampled, which is the
/// first register read of each refresh pass. After the last frame the trace
/// wraps around.
pub struct SimulatedGauge {
    frames: Vec<SimFrame>,
    idx: usize,
    started: bool,
    status: u16,
    failing: Vec<Register>,
}

impl Default for SimulatedGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGauge {
    /// A slowly discharging cell starting at 80%.
    pub fn new() -> Self {
        Self::discharging(80, -40)
    }

    /// Synthetic trace from `start_pct` down to 0% at a constant rate.
    pub fn discharging(start_pct: u8, crate_raw: i16) -> Self {
        let frames = (0..=start_pct.min(100))
            .rev()
            .map(|pct| SimFrame::at_percent(pct, crate_raw))
            .collect();
        Self::from_frames(frames)
    }

    /// Synthetic trace from `start_pct` up to 100% at a constant rate.
    pub fn charging(start_pct: u8, crate_raw: i16) -> Self {
        let frames = (start_pct.min(100)..=100)
            .map(|pct| SimFrame::at_percent(pct, crate_raw))
            .collect();
        Self::from_frames(frames)
    }

    pub fn from_frames(frames: Vec<SimFrame>) -> Self {
        Self {
            frames,
            idx: 0,
            started: false,
            status: 0,
            failing: Vec::new(),
        }
    }

    /// Frame that subsequent SOC/CRATE reads will report.
    pub fn current(&self) -> Option<&SimFrame> {
        self.frames.get(self.idx)
    }

    /// Latch alert flags into STATUS, as the chip does before pulling ALRT low.
    pub fn raise_alert(&mut self, flags: u16) {
        self.status |= flags;
    }

    /// Make every read of `register` fail until [`SimulatedGauge::heal`] is called.
    pub fn fail_register(&mut self, register: Register) {
        if !self.failing.contains(&register) {
            self.failing.push(register);
        }
    }

    pub fn heal(&mut self) {
        self.failing.clear();
    }

    fn frame(&self) -> Result<SimFrame, HwError> {
        self.frames.get(self.idx).copied().ok_or(HwError::EmptyTrace)
    }
}

impl RegisterReader for SimulatedGauge {
    fn read(
        &mut self,
        register: Register,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if self.failing.contains(&register) {
            return Err(HwError::Injected(register.addr()).into());
        }
        let raw = match register {
            Register::Vcell => {
                if self.started && !self.frames.is_empty() {
                    self.idx = (self.idx + 1) % self.frames.len();
                }
                self.started = true;
                self.frame()?.vcell
            }
            Register::Soc => self.frame()?.soc,
            Register::Crate => self.frame()?.crate_raw as u16,
            Register::Status => std::mem::take(&mut self.status),
            Register::Config => CONFIG_POR,
            Register::Valrt => VALRT_POR,
        };
        tracing::trace!(register = %register, raw, "simulated register read");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vcell_read_advances_trace() {
        let mut gauge = SimulatedGauge::discharging(2, -20);
        let first = gauge.read(Register::Vcell).unwrap();
        assert_eq!(gauge.read(Register::Soc).unwrap(), 2 * 256);
        let second = gauge.read(Register::Vcell).unwrap();
        assert!(second < first);
        assert_eq!(gauge.read(Register::Soc).unwrap(), 256);
    }

    #[test]
    fn status_is_read_and_clear() {
        let mut gauge = SimulatedGauge::new();
        gauge.raise_alert(0x0400);
        assert_eq!(gauge.read(Register::Status).unwrap(), 0x0400);
        assert_eq!(gauge.read(Register::Status).unwrap(), 0);
    }

    #[test]
    fn crate_is_reported_as_raw_twos_complement() {
        let mut gauge = SimulatedGauge::from_frames(vec![SimFrame {
            vcell: 0,
            soc: 0,
            crate_raw: -1,
        }]);
        assert_eq!(gauge.read(Register::Crate).unwrap(), 0xFFFF);
    }
}
