use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[battery]
battery_capacity_mah = 3000

[refresh]
heartbeat_s = 1
poll_s = 1
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_trace(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("trace.csv");
    // 97% at rest, then charging at 20%
    fs::write(&path, "vcell,soc,crate\n53500,24832,0\n52000,12800,40\n").unwrap();
    path
}

fn parse_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("stdout line must be JSON"))
        .collect()
}

#[rstest]
fn read_json_has_power_supply_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = write_trace(&dir);

    let out = Command::cargo_bin("gauge_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--trace")
        .arg(&trace)
        .arg("--json")
        .arg("read")
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = parse_lines(&out.stdout);
    assert_eq!(lines.len(), 1);
    let v = &lines[0];
    for key in [
        "status",
        "present",
        "technology",
        "model_name",
        "manufacturer",
        "voltage_now_uv",
        "capacity",
        "capacity_level",
        "current_now_ua",
        "time_to_empty_now_s",
        "time_to_full_now_s",
        "charge_full_design_uah",
        "charge_now_uah",
        "energy_full_design_uwh",
        "energy_full_uwh",
        "energy_now_uwh",
        "ac_online",
    ] {
        assert!(v.get(key).is_some(), "missing key {key} in {v}");
    }
    assert_eq!(v["status"], "Full");
    assert_eq!(v["capacity"], 97);
    assert_eq!(v["capacity_level"], "Full");
    assert_eq!(v["ac_online"], true);
    assert_eq!(v["charge_full_design_uah"], 3_000_000);
    assert_eq!(v["energy_full_design_uwh"], 11_100_000);
    assert_eq!(v["charge_now_uah"], 2_910_000);
    assert!(v["time_to_empty_now_s"].is_null());
    assert!(v["time_to_full_now_s"].is_null());
}

#[rstest]
fn monitor_json_emits_one_object_per_pass() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let trace = write_trace(&dir);

    let out = Command::cargo_bin("gauge_cli")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("--trace")
        .arg(&trace)
        .arg("--json")
        .args(["monitor", "--max-passes", "2"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = parse_lines(&out.stdout);
    assert!(lines.len() >= 2);
    assert_eq!(lines[0]["status"], "Full");
    assert_eq!(lines[1]["status"], "Charging");
    assert_eq!(lines[1]["capacity"], 50);
    // 3 Ah * 40 * 52 / 25000
    assert_eq!(lines[1]["current_now_ua"], 249_600);
    assert_eq!(lines[1]["time_to_full_now_s"], 225_000 * 50 / (40 * 13));
}

#[rstest]
fn self_check_json_lists_registers() {
    let out = Command::cargo_bin("gauge_cli")
        .unwrap()
        .arg("--json")
        .arg("self-check")
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = parse_lines(&out.stdout);
    let names: Vec<&str> = lines
        .iter()
        .filter_map(|v| v["register"].as_str())
        .collect();
    assert_eq!(names, ["VCELL", "SOC", "CRATE", "CONFIG"]);
    assert!(lines.iter().all(|v| v["ok"] == true));
}
