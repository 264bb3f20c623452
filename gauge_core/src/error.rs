use gauge_traits::Register;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GaugeError {
    /// Register read failed on the bus.
    #[error("transport error reading {register}: {message}")]
    Transport { register: Register, message: String },
    /// Register read timed out on the bus.
    #[error("transport timeout reading {register}")]
    TransportTimeout { register: Register },
    /// The quantity is well-defined as absent (e.g. time-to-empty while charging).
    #[error("no data")]
    NoData,
}

impl GaugeError {
    /// True for failures of the register transport (as opposed to absent data).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GaugeError::Transport { .. } | GaugeError::TransportTimeout { .. }
        )
    }

    /// Register whose read failed, if this is a transport error.
    pub fn register(&self) -> Option<Register> {
        match self {
            GaugeError::Transport { register, .. } | GaugeError::TransportTimeout { register } => {
                Some(*register)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing register reader")]
    MissingReader,
    #[error("missing publisher")]
    MissingPublisher,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
