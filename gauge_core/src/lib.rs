#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core fuel-gauge logic (hardware-agnostic).
//!
//! This crate turns raw MAX17048 register codes into battery telemetry. All
//! hardware interactions go through `gauge_traits::RegisterReader` and
//! `gauge_traits::AlertSource`.
//!
//! ## Architecture
//!
//! - **Telemetry**: raw VCELL/SOC/CRATE reads and unit conversion (`telemetry`)
//! - **Status**: charge status and capacity level classification (`status`)
//! - **Estimator**: current, time-to-empty/full, charge and energy (`estimator`)
//! - **Snapshot**: one consistent reading plus derived values (`snapshot`)
//! - **Scheduler**: tick/alert coalescing state machine (`scheduler`)
//! - **Runner**: worker and alert threads around the scheduler (`runner`)
//! - **Gauge**: on-demand property reads (`core`)
//!
//! ## Fixed-Point Arithmetic
//!
//! All conversions are integer-only with truncation toward zero, see
//! `fixed_point`. Voltages are µV, currents µA, charge µAh, energy µWh.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod estimator;
pub mod fixed_point;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
pub mod status;
pub mod telemetry;

pub use crate::builder::MonitorBuilder;
pub use crate::config::{DesignCapacity, IntervalPolicy};
pub use crate::core::Gauge;
pub use crate::error::{BuildError, GaugeError, Result};
pub use crate::estimator::{DerivedEstimates, Estimator};
pub use crate::runner::{Monitor, TriggerHandle};
pub use crate::scheduler::{
    Dispatch, RefreshScheduler, RefreshTrigger, SchedulerState, SchedulerStats,
};
pub use crate::snapshot::{Publisher, Snapshot};
pub use crate::status::{CapacityLevel, ChargeStatus};
pub use crate::telemetry::{Telemetry, TelemetryEngine};
