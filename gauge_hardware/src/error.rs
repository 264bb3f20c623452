use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("i2c read timeout")]
    Timeout,
    #[error("simulated gauge has no register trace loaded")]
    EmptyTrace,
    #[error("injected fault on register 0x{0:02X}")]
    Injected(u8),
}

pub type Result<T> = std::result::Result<T, HwError>;
