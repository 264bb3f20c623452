#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and register-trace parsing for the fuel-gauge monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The register-trace CSV loader enforces exact headers and reports the
//!   offending row number on parse failures.
use serde::Deserialize;

/// One recorded register frame.
///
/// Expected headers:
/// vcell,soc,crate
///
/// Example:
/// vcell,soc,crate
/// 53248,20480,-40
/// 53200,20400,-40
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RegisterTraceRow {
    /// Raw VCELL code (78.125 µV per LSB)
    pub vcell: u16,
    /// Raw SOC code (1/256 % per LSB)
    pub soc: u16,
    /// Raw CRATE code, signed
    #[serde(rename = "crate")]
    pub crate_raw: i16,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Battery {
    /// Design charge in µAh. Wins over the legacy mAh value when set.
    pub charge_full_design_uah: Option<u32>,
    /// Legacy design capacity in mAh, accepted only in (0, 20000).
    pub battery_capacity_mah: Option<u32>,
    /// Design energy in µWh; absent or 0 derives it from the charge at 3.7 V.
    pub energy_full_design_uwh: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Device {
    pub i2c_bus: u8,
    /// 7-bit I²C address of the gauge
    pub address: u16,
    /// GPIO (BCM) wired to ALRT; absence selects the poll interval
    pub alert_pin: Option<u8>,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x36,
            alert_pin: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Refresh {
    /// Tick interval when the alert line is wired (s)
    pub heartbeat_s: u64,
    /// Tick interval without an alert line (s)
    pub poll_s: u64,
    /// How long one alert wait blocks before rechecking shutdown (ms)
    pub alert_wait_ms: u64,
}

impl Default for Refresh {
    fn default() -> Self {
        Self {
            heartbeat_s: 300,
            poll_s: 30,
            alert_wait_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub battery: Battery,
    pub device: Device,
    pub refresh: Refresh,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_register_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<RegisterTraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open register trace {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["vcell", "soc", "crate"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "register trace CSV must have headers 'vcell,soc,crate', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<RegisterTraceRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    if rows.is_empty() {
        eyre::bail!("register trace {:?} has no rows", path);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if !(0x08..=0x77).contains(&self.device.address) {
            eyre::bail!(
                "device.address must be a 7-bit address in 0x08..=0x77, got {:#04x}",
                self.device.address
            );
        }

        // Refresh
        if self.refresh.heartbeat_s == 0 {
            eyre::bail!("refresh.heartbeat_s must be >= 1");
        }
        if self.refresh.poll_s == 0 {
            eyre::bail!("refresh.poll_s must be >= 1");
        }
        if self.refresh.heartbeat_s < self.refresh.poll_s {
            eyre::bail!("refresh.heartbeat_s must be >= refresh.poll_s");
        }
        if self.refresh.alert_wait_ms == 0 {
            eyre::bail!("refresh.alert_wait_ms must be >= 1");
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rotation:?}");
        }

        // Battery values are clamped downstream rather than rejected.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_toml("").unwrap();
        assert_eq!(cfg.device.address, 0x36);
        assert_eq!(cfg.device.i2c_bus, 1);
        assert_eq!(cfg.refresh.heartbeat_s, 300);
        assert_eq!(cfg.refresh.poll_s, 30);
        assert!(cfg.battery.charge_full_design_uah.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn hex_address_parses() {
        let cfg = load_toml("[device]\naddress = 0x36\nalert_pin = 17\n").unwrap();
        assert_eq!(cfg.device.address, 0x36);
        assert_eq!(cfg.device.alert_pin, Some(17));
    }
}
