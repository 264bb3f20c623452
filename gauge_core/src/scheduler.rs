//! Refresh scheduling state machine.
//!
//! Merges periodic ticks and hardware alerts into at most one refresh pass
//! at a time. Triggers that arrive while a pass is running are dropped: the
//! running pass reads the chip after they fired, so it already covers them.
//! Alerts dropped this way still owe a STATUS read; the running pass drains
//! them with `take_pending_acks` before it may complete.

use std::time::Duration;

/// What asked for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Periodic timer expiry.
    Tick,
    /// Gauge pulled ALRT low; STATUS must be read to release it.
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    RefreshInFlight,
    Stopped,
}

/// Decision for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Run a pass now. `acknowledge_alert` is set for alert-driven passes.
    Start { acknowledge_alert: bool },
    /// A pass is already running; the trigger was dropped. A dropped alert
    /// is acknowledged by the running pass.
    Coalesced,
    /// Shut down; nothing will run.
    Stopped,
}

/// Counters for observability and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub started: u64,
    pub coalesced: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug)]
pub struct RefreshScheduler {
    state: SchedulerState,
    interval: Duration,
    stats: SchedulerStats,
    pending_acks: u32,
}

impl RefreshScheduler {
    /// `interval` is fixed for the scheduler's lifetime.
    pub fn new(interval: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            interval,
            stats: SchedulerStats::default(),
            pending_acks: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn on_trigger(&mut self, trigger: RefreshTrigger) -> Dispatch {
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::RefreshInFlight;
                self.stats.started += 1;
                Dispatch::Start {
                    acknowledge_alert: trigger == RefreshTrigger::Alert,
                }
            }
            SchedulerState::RefreshInFlight => {
                self.stats.coalesced += 1;
                if trigger == RefreshTrigger::Alert {
                    self.pending_acks += 1;
                }
                tracing::debug!(?trigger, "refresh in flight, trigger coalesced");
                Dispatch::Coalesced
            }
            SchedulerState::Stopped => Dispatch::Stopped,
        }
    }

    /// Alerts coalesced into the running pass that still need STATUS read.
    /// Resets the count.
    pub fn take_pending_acks(&mut self) -> u32 {
        std::mem::take(&mut self.pending_acks)
    }

    /// Undo a `Start` whose pass never reached the worker. Counts neither a
    /// started nor a failed pass.
    pub fn cancel_dispatch(&mut self) {
        if self.state == SchedulerState::RefreshInFlight {
            self.state = SchedulerState::Idle;
            self.stats.started = self.stats.started.saturating_sub(1);
        }
        self.pending_acks = 0;
    }

    /// Finish the running pass. Returns the delay until the next tick, or
    /// `None` once stopped.
    pub fn complete(&mut self, published: bool) -> Option<Duration> {
        if published {
            self.stats.completed += 1;
        } else {
            self.stats.failed += 1;
        }
        match self.state {
            SchedulerState::RefreshInFlight => {
                self.state = SchedulerState::Idle;
                Some(self.interval)
            }
            SchedulerState::Idle => {
                debug_assert!(false, "complete() without a pass in flight");
                Some(self.interval)
            }
            SchedulerState::Stopped => None,
        }
    }

    /// Enter the terminal state. Returns true if a pass is still running and
    /// the caller must wait for it.
    pub fn stop(&mut self) -> bool {
        let in_flight = self.state == SchedulerState::RefreshInFlight;
        self.state = SchedulerState::Stopped;
        in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(30);

    #[test]
    fn tick_starts_and_complete_rearms() {
        let mut s = RefreshScheduler::new(INTERVAL);
        assert_eq!(
            s.on_trigger(RefreshTrigger::Tick),
            Dispatch::Start {
                acknowledge_alert: false
            }
        );
        assert_eq!(s.state(), SchedulerState::RefreshInFlight);
        assert_eq!(s.complete(true), Some(INTERVAL));
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn alert_requests_acknowledgement() {
        let mut s = RefreshScheduler::new(INTERVAL);
        assert_eq!(
            s.on_trigger(RefreshTrigger::Alert),
            Dispatch::Start {
                acknowledge_alert: true
            }
        );
    }

    #[test]
    fn triggers_during_pass_are_dropped() {
        let mut s = RefreshScheduler::new(INTERVAL);
        s.on_trigger(RefreshTrigger::Tick);
        assert_eq!(s.on_trigger(RefreshTrigger::Alert), Dispatch::Coalesced);
        assert_eq!(s.on_trigger(RefreshTrigger::Alert), Dispatch::Coalesced);
        assert_eq!(s.on_trigger(RefreshTrigger::Tick), Dispatch::Coalesced);
        s.complete(true);
        assert_eq!(s.stats().coalesced, 3);
        assert_eq!(s.stats().started, 1);
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn coalesced_alerts_are_owed_an_acknowledgement() {
        let mut s = RefreshScheduler::new(INTERVAL);
        s.on_trigger(RefreshTrigger::Tick);
        s.on_trigger(RefreshTrigger::Alert);
        s.on_trigger(RefreshTrigger::Tick);
        s.on_trigger(RefreshTrigger::Alert);
        assert_eq!(s.take_pending_acks(), 2);
        assert_eq!(s.take_pending_acks(), 0);
        s.complete(true);
        s.on_trigger(RefreshTrigger::Alert);
        assert_eq!(s.take_pending_acks(), 0, "starting alert acks itself");
    }

    #[test]
    fn cancelled_dispatch_is_not_a_failure() {
        let mut s = RefreshScheduler::new(INTERVAL);
        s.on_trigger(RefreshTrigger::Alert);
        s.cancel_dispatch();
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.stats(), SchedulerStats::default());
    }

    #[test]
    fn failed_pass_still_returns_to_idle() {
        let mut s = RefreshScheduler::new(INTERVAL);
        s.on_trigger(RefreshTrigger::Alert);
        assert_eq!(s.complete(false), Some(INTERVAL));
        assert_eq!(s.stats().failed, 1);
        assert_eq!(s.state(), SchedulerState::Idle);
    }

    #[test]
    fn stop_is_terminal() {
        let mut s = RefreshScheduler::new(INTERVAL);
        assert!(!s.stop());
        assert_eq!(s.on_trigger(RefreshTrigger::Tick), Dispatch::Stopped);
        assert_eq!(s.on_trigger(RefreshTrigger::Alert), Dispatch::Stopped);
    }

    #[test]
    fn stop_during_pass_reports_in_flight_and_cancels_rearm() {
        let mut s = RefreshScheduler::new(INTERVAL);
        s.on_trigger(RefreshTrigger::Tick);
        assert!(s.stop());
        assert_eq!(s.complete(true), None);
        assert_eq!(s.state(), SchedulerState::Stopped);
    }
}
