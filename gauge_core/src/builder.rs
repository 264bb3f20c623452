//! Builder for a running [`Monitor`].
//!
//! Collects the reader, publisher, optional alert line and configuration,
//! validates them, and picks the tick interval from the alert availability.

use std::time::Duration;

use gauge_traits::clock::{Clock, MonotonicClock};
use gauge_traits::{AlertSource, RegisterReader};

use crate::config::{DEFAULT_ALERT_WAIT, DesignCapacity, IntervalPolicy};
use crate::core::Gauge;
use crate::error::{BuildError, Result};
use crate::estimator::Estimator;
use crate::runner::Monitor;
use crate::snapshot::Publisher;

type BoxedReader = Box<dyn RegisterReader + Send>;
type BoxedPublisher = Box<dyn Publisher + Send>;
type BoxedAlert = Box<dyn AlertSource + Send>;

pub struct MonitorBuilder {
    reader: Option<BoxedReader>,
    publisher: Option<BoxedPublisher>,
    alert: Option<BoxedAlert>,
    design: DesignCapacity,
    policy: IntervalPolicy,
    alert_wait: Duration,
    tte_tuning_factor: Option<u32>,
    clock: Option<Box<dyn Clock + Send>>,
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self {
            reader: None,
            publisher: None,
            alert: None,
            design: DesignCapacity::default(),
            policy: IntervalPolicy::default(),
            alert_wait: DEFAULT_ALERT_WAIT,
            tte_tuning_factor: None,
            clock: None,
        }
    }
}

impl Monitor {
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::default()
    }
}

impl MonitorBuilder {
    pub fn with_reader(mut self, reader: impl RegisterReader + Send + 'static) -> Self {
        self.reader = Some(Box::new(reader));
        self
    }

    pub fn with_publisher(mut self, publisher: impl Publisher + Send + 'static) -> Self {
        self.publisher = Some(Box::new(publisher));
        self
    }

    /// Attach the ALRT line. Its presence switches the tick to the heartbeat interval.
    pub fn with_alert(mut self, alert: impl AlertSource + Send + 'static) -> Self {
        self.alert = Some(Box::new(alert));
        self
    }

    pub fn with_design(mut self, design: DesignCapacity) -> Self {
        self.design = design;
        self
    }

    pub fn with_intervals(mut self, policy: IntervalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_alert_wait(mut self, wait: Duration) -> Self {
        self.alert_wait = wait;
        self
    }

    pub fn with_tte_tuning_factor(mut self, factor: u32) -> Self {
        self.tte_tuning_factor = Some(factor);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validate and start the monitor threads.
    pub fn try_build(self) -> Result<Monitor> {
        let reader = self
            .reader
            .ok_or_else(|| eyre::Report::new(BuildError::MissingReader))?;
        let publisher = self
            .publisher
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPublisher))?;
        if self.policy.heartbeat.is_zero() || self.policy.poll.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "refresh intervals must be non-zero",
            )));
        }
        if self.alert.is_some() && self.alert_wait.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "alert wait must be non-zero",
            )));
        }

        let mut estimator = Estimator::new(self.design);
        if let Some(factor) = self.tte_tuning_factor {
            estimator = estimator.with_tte_tuning_factor(factor);
        }
        let interval = self.policy.interval(self.alert.is_some());
        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));

        Ok(Monitor::spawn(
            Gauge::with_estimator(reader, estimator),
            publisher,
            self.alert,
            interval,
            self.alert_wait,
            clock,
        ))
    }
}
