//! Hardware-facing seams for the fuel-gauge stack.
//!
//! Everything that touches a bus or an interrupt line goes through these
//! traits so the core stays testable with scripted implementations.
pub mod clock;
pub mod registers;

pub use clock::{Clock, MonotonicClock};
pub use registers::Register;

/// Synchronous 16-bit register access.
///
/// Implementations return the register value already in host order; a read
/// either completes or fails immediately, retries belong to the implementor.
pub trait RegisterReader {
    fn read(
        &mut self,
        register: Register,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Blocking view of the gauge's ALRT line.
pub trait AlertSource {
    /// Block until the alert asserts or `timeout` expires.
    ///
    /// Returns `Ok(true)` when an alert edge was observed, `Ok(false)` on timeout.
    fn wait(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

impl<R: RegisterReader + ?Sized> RegisterReader for Box<R> {
    fn read(
        &mut self,
        register: Register,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(register)
    }
}

impl<A: AlertSource + ?Sized> AlertSource for Box<A> {
    fn wait(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).wait(timeout)
    }
}
