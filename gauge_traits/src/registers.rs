//! MAX17048 register map.

use std::fmt;

/// Symbolic register ids. Addresses are 8-bit, values 16-bit big-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    /// Cell voltage, 78.125 µV/LSB.
    Vcell = 0x02,
    /// State of charge, 1/256 %/LSB.
    Soc = 0x04,
    Config = 0x0C,
    Valrt = 0x14,
    /// Signed charge rate, 0.208 %/hr per LSB.
    Crate = 0x16,
    /// Alert flags; reading it releases the ALRT pin.
    Status = 0x1A,
}

impl Register {
    /// Registers sampled on every refresh pass, in read order.
    pub const TELEMETRY: [Register; 3] = [Register::Vcell, Register::Soc, Register::Crate];

    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::Vcell => "VCELL",
            Register::Soc => "SOC",
            Register::Config => "CONFIG",
            Register::Valrt => "VALRT",
            Register::Crate => "CRATE",
            Register::Status => "STATUS",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.addr())
    }
}
