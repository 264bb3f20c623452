//! MAX17048 over Linux I²C with an optional ALRT GPIO line.
use std::time::Duration;

use gauge_traits::{AlertSource, Register, RegisterReader};
use rppal::gpio::{Gpio, InputPin, Trigger};
use rppal::i2c::I2c;
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// Fixed 7-bit slave address of the MAX17048.
pub const DEFAULT_ADDRESS: u16 = 0x36;

pub struct Max17048 {
    i2c: I2c,
}

impl Max17048 {
    pub fn new(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        debug!(bus, address, "max17048 opened");
        Ok(Self { i2c })
    }

    /// Read one register; the chip sends MSB first.
    pub fn read_register(&mut self, register: Register) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(&[register.addr()], &mut buf)
            .map_err(|e| match e {
                rppal::i2c::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                    HwError::Timeout
                }
                other => HwError::I2c(other.to_string()),
            })?;
        let raw = u16::from_be_bytes(buf);
        trace!(register = %register, raw, "max17048 read");
        Ok(raw)
    }
}

impl RegisterReader for Max17048 {
    fn read(
        &mut self,
        register: Register,
    ) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_register(register)?)
    }
}

/// ALRT is open-drain, active low; it stays asserted until STATUS is read.
pub struct AlertPin {
    pin: InputPin,
}

impl AlertPin {
    pub fn new(bcm_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = gpio
            .get(bcm_pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pullup();
        pin.set_interrupt(Trigger::FallingEdge)
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        debug!(pin = bcm_pin, "alert line armed");
        Ok(Self { pin })
    }
}

impl AlertSource for AlertPin {
    fn wait(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let level = self
            .pin
            .poll_interrupt(true, Some(timeout))
            .map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(level.is_some())
    }
}
