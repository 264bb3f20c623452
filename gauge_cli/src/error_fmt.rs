//! Human-readable error descriptions and structured JSON error formatting.

use gauge_core::error::{BuildError, GaugeError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingReader => {
                "What happened: No register reader was provided to the monitor.\nLikely causes: The gauge backend failed to initialize or was not wired into the builder.\nHow to fix: Ensure the I2C device (or trace) opens successfully and is passed via with_reader(...).".to_string()
            }
            BuildError::MissingPublisher => {
                "What happened: No publisher was provided to the monitor.\nLikely causes: The output sink was not wired into the builder.\nHow to fix: Pass a publisher via with_publisher(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Zero or out-of-range values under [refresh].\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GaugeError>() {
        return match ge {
            GaugeError::TransportTimeout { register } => format!(
                "What happened: Reading {register} from the fuel gauge timed out.\nLikely causes: Gauge not powered, SDA/SCL wiring, or bus contention.\nHow to fix: Check the wiring and run `gauge self-check`; verify [device].i2c_bus and address."
            ),
            GaugeError::Transport { register, message } => format!(
                "What happened: Reading {register} from the fuel gauge failed ({message}).\nLikely causes: Wrong I2C address, missing pull-ups, or the gauge is not present.\nHow to fix: Run `i2cdetect` for the bus, check [device].address (default 0x36), then `gauge self-check`."
            ),
            GaugeError::NoData => {
                "What happened: The requested estimate is not available right now.\nLikely causes: The battery is not charging or discharging fast enough.\nHow to fix: Nothing; try again later.".to_string()
            }
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open i2c") || lower.contains("open alert pin") {
        return "What happened: Failed to open the gauge hardware.\nLikely causes: I2C not enabled, wrong bus number, or insufficient permissions.\nHow to fix: Enable I2C, fix [device] in the config, and ensure the process can access /dev/i2c-* and GPIO.".to_string();
    }

    if lower.contains("register trace csv must have headers") {
        return "Invalid headers in register trace CSV. Expected 'vcell,soc,crate'.".to_string();
    }

    if lower.contains("parse config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid.\nDetails: {msg}\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 build/config, 3 transport, 4 transport timeout, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<GaugeError>() {
        Some(GaugeError::Transport { .. }) => 3,
        Some(GaugeError::TransportTimeout { .. }) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<GaugeError>() {
        Some(GaugeError::Transport { .. }) => "Transport",
        Some(GaugeError::TransportTimeout { .. }) => "TransportTimeout",
        Some(GaugeError::NoData) => "NoData",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let register = err
        .downcast_ref::<GaugeError>()
        .and_then(GaugeError::register);
    let obj = match register {
        Some(r) => json!({
            "reason": reason_name(err),
            "register": r.name(),
            "message": humanize(err),
        }),
        None => json!({ "reason": reason_name(err), "message": humanize(err) }),
    };
    obj.to_string()
}
