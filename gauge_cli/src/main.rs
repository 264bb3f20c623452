mod cli;
mod error_fmt;
mod publish;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use gauge_core::config::{DesignCapacity, IntervalPolicy};
use gauge_core::conversions::alert_wait;
use gauge_core::telemetry::TelemetryEngine;
use gauge_core::{Gauge, Monitor};
use gauge_hardware::{SimFrame, SimulatedGauge};
use gauge_traits::{AlertSource, Register, RegisterReader};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE, log_level};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::publish::{StdoutPublisher, render};

type Reader = Box<dyn RegisterReader + Send>;
type Alert = Box<dyn AlertSource + Send>;

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(&cli, &cfg)?;

    match cli.cmd {
        Commands::Health => {
            println!("ok");
            Ok(())
        }
        Commands::Read => {
            let (reader, _alert) = open_backend(&cfg, cli.trace.as_deref())?;
            let mut gauge = Gauge::new(reader, DesignCapacity::from(&cfg.battery));
            let snapshot = gauge.snapshot()?;
            println!("{}", render(&snapshot, cli.json));
            Ok(())
        }
        Commands::SelfCheck => {
            let (reader, _alert) = open_backend(&cfg, cli.trace.as_deref())?;
            self_check(reader, cli.json)
        }
        Commands::Monitor { max_passes } => {
            let (reader, alert) = open_backend(&cfg, cli.trace.as_deref())?;
            run_monitor(&cfg, reader, alert, max_passes, cli.json)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<gauge_config::Config> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .wrap_err_with(|| format!("read config {}", p.display()))?;
            gauge_config::load_toml(&text)
                .wrap_err_with(|| format!("parse config {}", p.display()))?
        }
        None => gauge_config::Config::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, cfg: &gauge_config::Config) -> Result<()> {
    let level = log_level(cli.log_level.as_deref(), cfg.logging.level.as_deref());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let file = match cfg.logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))
}

/// Pick the register source: a replayed trace, the real chip, or the built-in simulation.
fn open_backend(
    cfg: &gauge_config::Config,
    trace: Option<&Path>,
) -> Result<(Reader, Option<Alert>)> {
    if let Some(path) = trace {
        let rows = gauge_config::load_register_trace_csv(path)?;
        tracing::info!(rows = rows.len(), path = %path.display(), "replaying register trace");
        let frames = rows
            .into_iter()
            .map(|r| SimFrame {
                vcell: r.vcell,
                soc: r.soc,
                crate_raw: r.crate_raw,
            })
            .collect();
        return Ok((Box::new(SimulatedGauge::from_frames(frames)), None));
    }
    open_device(cfg)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_device(cfg: &gauge_config::Config) -> Result<(Reader, Option<Alert>)> {
    use gauge_hardware::max17048::{AlertPin, Max17048};

    let dev = &cfg.device;
    let gauge = Max17048::new(dev.i2c_bus, dev.address).map_err(|e| {
        eyre::eyre!(
            "open i2c bus {} address {:#04x}: {e}",
            dev.i2c_bus,
            dev.address
        )
    })?;
    let alert: Option<Alert> = match dev.alert_pin {
        Some(pin) => match AlertPin::new(pin) {
            Ok(p) => Some(Box::new(p)),
            Err(e) => {
                // Polling still works without the line.
                tracing::warn!(pin, error = %e, "open alert pin failed; falling back to polling");
                None
            }
        },
        None => None,
    };
    tracing::info!(
        bus = dev.i2c_bus,
        address = dev.address,
        alert = alert.is_some(),
        "MAX17048 opened"
    );
    Ok((Box::new(gauge), alert))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_device(_cfg: &gauge_config::Config) -> Result<(Reader, Option<Alert>)> {
    tracing::info!("hardware support not compiled in; using simulated gauge");
    Ok((Box::new(SimulatedGauge::new()), None))
}

fn self_check(reader: Reader, json: bool) -> Result<()> {
    let mut engine = TelemetryEngine::new(reader);
    let mut first_err = None;
    let mut results = Vec::new();
    for register in Register::TELEMETRY.into_iter().chain([Register::Config]) {
        match engine.read_raw(register) {
            Ok(raw) => results.push((register, Ok(raw))),
            Err(e) => {
                results.push((register, Err(e.to_string())));
                first_err.get_or_insert(e);
            }
        }
    }

    for (register, res) in &results {
        if json {
            let v = match res {
                Ok(raw) => serde_json::json!({ "register": register.name(), "ok": true, "raw": raw }),
                Err(msg) => {
                    serde_json::json!({ "register": register.name(), "ok": false, "error": msg })
                }
            };
            println!("{v}");
        } else {
            match res {
                Ok(raw) => println!("{register} = {raw:#06x} ok"),
                Err(msg) => println!("{register} FAILED: {msg}"),
            }
        }
    }

    match first_err {
        Some(e) => Err(e.into()),
        None => {
            if !json {
                println!("ok");
            }
            Ok(())
        }
    }
}

fn run_monitor(
    cfg: &gauge_config::Config,
    reader: Reader,
    alert: Option<Alert>,
    max_passes: Option<u64>,
    json: bool,
) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let publisher = StdoutPublisher::new(json);
    let published = publisher.counter();
    let mut builder = Monitor::builder()
        .with_reader(reader)
        .with_publisher(publisher)
        .with_design(DesignCapacity::from(&cfg.battery))
        .with_intervals(IntervalPolicy::from(&cfg.refresh))
        .with_alert_wait(alert_wait(&cfg.refresh));
    if let Some(alert) = alert {
        builder = builder.with_alert(alert);
    }
    let monitor = builder.try_build()?;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("interrupt received, stopping monitor");
            break;
        }
        if let Some(max) = max_passes
            && published.load(Ordering::Relaxed) >= max
        {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let stats = monitor.shutdown();
    tracing::info!(
        started = stats.started,
        completed = stats.completed,
        failed = stats.failed,
        coalesced = stats.coalesced,
        "monitor stopped"
    );
    Ok(())
}
