//! Test and helper doubles for gauge_core.
//!
//! All doubles share their state behind `Arc`s, so a test can keep a clone
//! after moving the double itself into a monitor thread.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel as xch;
use gauge_traits::{AlertSource, Register, RegisterReader};

use crate::snapshot::{Publisher, Snapshot};

#[derive(Default)]
struct Script {
    values: HashMap<Register, u16>,
    failing: HashMap<Register, String>,
    reads: HashMap<Register, u32>,
}

/// Register reader with fixed per-register values and injectable failures.
///
/// Optionally gated: every VCELL read (the start of a refresh pass) announces
/// itself on `entered` and then blocks until the gate releases it.
#[derive(Clone, Default)]
pub struct ScriptedReader {
    script: Arc<Mutex<Script>>,
    gate: Option<(xch::Sender<()>, xch::Receiver<()>)>,
}

/// Test-side controls for a gated [`ScriptedReader`].
pub struct PassGate {
    entered: xch::Receiver<()>,
    release: xch::Sender<()>,
}

impl PassGate {
    /// Wait until a pass has started reading registers.
    pub fn wait_entered(&self, timeout: Duration) -> bool {
        self.entered.recv_timeout(timeout).is_ok()
    }

    /// Let one blocked pass continue.
    pub fn release(&self) {
        let _ = self.release.send(());
    }
}

impl ScriptedReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader whose VCELL reads block on the returned gate.
    pub fn gated() -> (Self, PassGate) {
        let (entered_tx, entered_rx) = xch::unbounded();
        let (release_tx, release_rx) = xch::unbounded();
        let reader = Self {
            script: Arc::default(),
            gate: Some((entered_tx, release_rx)),
        };
        let gate = PassGate {
            entered: entered_rx,
            release: release_tx,
        };
        (reader, gate)
    }

    /// Set the raw code returned for `register`.
    pub fn with(self, register: Register, raw: u16) -> Self {
        self.set(register, raw);
        self
    }

    /// Convenience for the three telemetry registers.
    pub fn with_telemetry(self, vcell: u16, soc: u16, crate_raw: i16) -> Self {
        self.with(Register::Vcell, vcell)
            .with(Register::Soc, soc)
            .with(Register::Crate, crate_raw as u16)
    }

    pub fn set(&self, register: Register, raw: u16) {
        self.lock().values.insert(register, raw);
    }

    pub fn fail(&self, register: Register, message: &str) {
        self.lock().failing.insert(register, message.to_string());
    }

    pub fn heal(&self, register: Register) {
        self.lock().failing.remove(&register);
    }

    /// Number of read attempts on `register`, failed ones included.
    pub fn reads(&self, register: Register) -> u32 {
        self.lock().reads.get(&register).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegisterReader for ScriptedReader {
    fn read(
        &mut self,
        register: Register,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        if register == Register::Vcell
            && let Some((entered, release)) = &self.gate
        {
            let _ = entered.send(());
            let _ = release.recv();
        }
        let mut script = self.lock();
        *script.reads.entry(register).or_insert(0) += 1;
        if let Some(msg) = script.failing.get(&register) {
            return Err(msg.clone().into());
        }
        Ok(script.values.get(&register).copied().unwrap_or(0))
    }
}

/// Publisher that keeps every snapshot and signals each publish.
#[derive(Clone)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<Snapshot>>>,
    tx: xch::Sender<Snapshot>,
    rx: xch::Receiver<Snapshot>,
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        let (tx, rx) = xch::unbounded();
        Self {
            published: Arc::default(),
            tx,
            rx,
        }
    }
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.snapshots().len()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Block until the next publish or `timeout`.
    pub fn wait_next(&self, timeout: Duration) -> Option<Snapshot> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, snapshot: &Snapshot) {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*snapshot);
        let _ = self.tx.send(*snapshot);
    }
}

/// Alert line driven by a channel: each `()` sent is one alert edge.
pub struct ChannelAlert {
    rx: xch::Receiver<()>,
}

impl ChannelAlert {
    pub fn new() -> (Self, xch::Sender<()>) {
        let (tx, rx) = xch::unbounded();
        (Self { rx }, tx)
    }
}

impl AlertSource for ChannelAlert {
    fn wait(
        &mut self,
        timeout: Duration,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => Ok(true),
            Err(xch::RecvTimeoutError::Timeout) => Ok(false),
            Err(xch::RecvTimeoutError::Disconnected) => {
                // No more alerts can arrive; behave like an idle line.
                std::thread::sleep(timeout);
                Ok(false)
            }
        }
    }
}

/// Placeholder alert type for monitors without an ALRT line.
pub struct NoAlert;

impl AlertSource for NoAlert {
    fn wait(
        &mut self,
        timeout: Duration,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        std::thread::sleep(timeout);
        Ok(false)
    }
}
