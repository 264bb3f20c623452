//! Snapshot rendering and the stdout publisher used by `monitor`.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gauge_core::snapshot::{MANUFACTURER, MODEL_NAME, Publisher, Snapshot, TECHNOLOGY};
use serde_json::json;

/// Power-supply style property object for one snapshot.
pub fn snapshot_json(s: &Snapshot) -> serde_json::Value {
    json!({
        "status": s.status.as_str(),
        "present": true,
        "technology": TECHNOLOGY,
        "model_name": MODEL_NAME,
        "manufacturer": MANUFACTURER,
        "voltage_now_uv": s.telemetry.voltage_uv,
        "capacity": s.telemetry.charge_percent,
        "capacity_level": s.capacity_level.as_str(),
        "current_now_ua": s.estimates.current_ua,
        "time_to_empty_now_s": s.estimates.time_to_empty_s,
        "time_to_full_now_s": s.estimates.time_to_full_s,
        "charge_full_design_uah": s.design.charge_full_design_uah(),
        "charge_now_uah": s.estimates.charge_now_uah,
        "energy_full_design_uwh": s.design.energy_full_design_uwh(),
        "energy_full_uwh": s.design.energy_full_design_uwh(),
        "energy_now_uwh": s.estimates.energy_now_uwh,
        "ac_online": s.ac_online,
    })
}

/// One-line human summary, e.g. `Discharging 60% 3.750 V -208.0 mA level=Normal tte=346153s`.
pub fn snapshot_line(s: &Snapshot) -> String {
    let mut line = format!(
        "{} {}% {}.{:03} V {:.1} mA level={}",
        s.status.as_str(),
        s.telemetry.charge_percent,
        s.telemetry.voltage_uv / 1_000_000,
        (s.telemetry.voltage_uv % 1_000_000) / 1_000,
        s.estimates.current_ua as f64 / 1000.0,
        s.capacity_level.as_str(),
    );
    if let Some(t) = s.estimates.time_to_empty_s {
        line.push_str(&format!(" tte={t}s"));
    }
    if let Some(t) = s.estimates.time_to_full_s {
        line.push_str(&format!(" ttf={t}s"));
    }
    if s.ac_online {
        line.push_str(" ac=online");
    }
    line
}

pub fn render(s: &Snapshot, json: bool) -> String {
    if json {
        snapshot_json(s).to_string()
    } else {
        snapshot_line(s)
    }
}

/// Writes each snapshot as one line to stdout and counts publishes.
pub struct StdoutPublisher {
    json: bool,
    published: Arc<AtomicU64>,
}

impl StdoutPublisher {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared publish counter, readable after the publisher moves to the worker.
    pub fn counter(&self) -> Arc<AtomicU64> {
        self.published.clone()
    }
}

impl Publisher for StdoutPublisher {
    fn publish(&mut self, snapshot: &Snapshot) {
        let line = render(snapshot, self.json);
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "failed to write snapshot");
        }
        self.published.fetch_add(1, Ordering::Relaxed);
    }
}
