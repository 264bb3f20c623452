//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "gauge", version, about = "MAX17048 fuel-gauge monitor")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replay a register trace CSV (strict header vcell,soc,crate) instead of the chip
    #[arg(long, value_name = "CSV")]
    pub trace: Option<PathBuf>,

    /// Print snapshots and errors as JSON lines, and log as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refresh monitor and print one line per published snapshot
    Monitor {
        /// Exit after this many snapshots have been published
        #[arg(long, value_name = "N")]
        max_passes: Option<u64>,
    },
    /// Take one snapshot and print it
    Read,
    /// Read every register once and report which ones respond
    SelfCheck,
    /// Validate the configuration and print "ok"
    Health,
}

/// Log level used when `RUST_LOG` is unset: `--log-level`, then
/// `[logging].level`, then `info`.
pub fn log_level<'a>(cli: Option<&'a str>, config: Option<&'a str>) -> &'a str {
    cli.or(config).unwrap_or("info")
}
