//! Background refresh monitor.
//!
//! Spawns a worker thread that owns the register reader and the publisher and
//! runs refresh passes, plus an optional alert thread that blocks on the
//! gauge's ALRT line. Both trigger sources go through one shared
//! `RefreshScheduler`, so at most one pass runs at a time.
//!
//! The worker is also the tick source: it waits on a deadline that is re-armed
//! after every completed pass.
//!
//! Each `Monitor` joins its threads on shutdown or drop; a pass that is
//! already running finishes (and publishes) first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use gauge_traits::clock::Clock;
use gauge_traits::{AlertSource, RegisterReader};

use crate::core::Gauge;
use crate::scheduler::{
    Dispatch, RefreshScheduler, RefreshTrigger, SchedulerState, SchedulerStats,
};
use crate::snapshot::Publisher;

struct Shared {
    scheduler: Mutex<RefreshScheduler>,
    job_tx: xch::Sender<RefreshTrigger>,
}

impl Shared {
    fn scheduler(&self) -> MutexGuard<'_, RefreshScheduler> {
        // The scheduler has no invariants a panicking holder could break halfway.
        self.scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, trigger: RefreshTrigger) -> Dispatch {
        self.scheduler().on_trigger(trigger)
    }
}

/// Cloneable handle for feeding triggers into a running monitor.
#[derive(Clone)]
pub struct TriggerHandle {
    shared: Arc<Shared>,
}

impl TriggerHandle {
    /// Offer a trigger. Starts a pass on the worker when idle; otherwise the
    /// trigger is coalesced or ignored after shutdown.
    pub fn trigger(&self, trigger: RefreshTrigger) -> Dispatch {
        let mut scheduler = self.shared.scheduler();
        let dispatch = scheduler.on_trigger(trigger);
        if matches!(dispatch, Dispatch::Start { .. })
            && self.shared.job_tx.try_send(trigger).is_err()
        {
            // Worker is gone; undo the transition so state stays truthful.
            scheduler.cancel_dispatch();
            return Dispatch::Stopped;
        }
        dispatch
    }
}

pub struct Monitor {
    shared: Arc<Shared>,
    shutdown: Arc<AtomicBool>,
    stop_tx: Option<xch::Sender<()>>,
    worker: Option<JoinHandle<()>>,
    alert: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Start the worker (and the alert thread when `alert` is given).
    ///
    /// The tick interval is `interval`, fixed for the monitor's lifetime. The
    /// first tick fires one interval after start.
    pub fn spawn<R, P, A, C>(
        gauge: Gauge<R>,
        publisher: P,
        alert: Option<A>,
        interval: Duration,
        alert_wait: Duration,
        clock: C,
    ) -> Self
    where
        R: RegisterReader + Send + 'static,
        P: Publisher + Send + 'static,
        A: AlertSource + Send + 'static,
        C: Clock + Send + 'static,
    {
        // A pass in flight blocks new dispatches, so one slot is enough.
        let (job_tx, job_rx) = xch::bounded(1);
        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let shared = Arc::new(Shared {
            scheduler: Mutex::new(RefreshScheduler::new(interval)),
            job_tx,
        });
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let mut worker = Worker {
                    gauge,
                    publisher,
                    shared,
                    clock,
                };
                worker.run(&job_rx, &stop_rx);
            })
        };

        let alert = alert.map(|source| {
            let handle = TriggerHandle {
                shared: shared.clone(),
            };
            let shutdown = shutdown.clone();
            std::thread::spawn(move || alert_loop(source, &handle, &shutdown, alert_wait))
        });

        tracing::info!(
            interval_s = interval.as_secs(),
            alert = alert.is_some(),
            "refresh monitor started"
        );

        Self {
            shared,
            shutdown,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            alert,
        }
    }

    pub fn handle(&self) -> TriggerHandle {
        TriggerHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn trigger(&self, trigger: RefreshTrigger) -> Dispatch {
        self.handle().trigger(trigger)
    }

    pub fn state(&self) -> SchedulerState {
        self.shared.scheduler().state()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.shared.scheduler().stats()
    }

    pub fn interval(&self) -> Duration {
        self.shared.scheduler().interval()
    }

    /// Stop scheduling, wait for any running pass, and join the threads.
    pub fn shutdown(mut self) -> SchedulerStats {
        self.stop_and_join();
        self.stats()
    }

    fn stop_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let in_flight = self.shared.scheduler().stop();
        if in_flight {
            tracing::debug!("shutdown waiting for in-flight refresh pass");
        }
        // Disconnecting the stop channel wakes the worker's select.
        drop(self.stop_tx.take());

        if let Some(handle) = self.worker.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("refresh worker joined"),
                Err(e) => tracing::warn!(?e, "refresh worker panicked during shutdown"),
            }
        }
        // The alert thread notices the flag after at most one wait timeout.
        if let Some(handle) = self.alert.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("alert thread joined"),
                Err(e) => tracing::warn!(?e, "alert thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        if self.worker.is_some() || self.alert.is_some() {
            self.stop_and_join();
        }
    }
}

struct Worker<R, P, C> {
    gauge: Gauge<R>,
    publisher: P,
    shared: Arc<Shared>,
    clock: C,
}

impl<R, P, C> Worker<R, P, C>
where
    R: RegisterReader,
    P: Publisher,
    C: Clock,
{
    fn run(&mut self, job_rx: &xch::Receiver<RefreshTrigger>, stop_rx: &xch::Receiver<()>) {
        let interval = self.shared.scheduler().interval();
        let mut deadline = Some(self.clock.deadline_after(interval));

        loop {
            let timer = match deadline {
                Some(at) => xch::at(at),
                None => xch::never(),
            };
            xch::select! {
                recv(stop_rx) -> _ => break,
                recv(job_rx) -> msg => {
                    let Ok(trigger) = msg else { break };
                    if self.shared.scheduler().state() == SchedulerState::Stopped {
                        break;
                    }
                    match self.run_pass(trigger) {
                        Some(next) => deadline = Some(next),
                        None => break,
                    }
                }
                recv(timer) -> _ => {
                    match self.shared.dispatch(RefreshTrigger::Tick) {
                        Dispatch::Start { .. } => match self.run_pass(RefreshTrigger::Tick) {
                            Some(next) => deadline = Some(next),
                            None => break,
                        },
                        // An alert pass is queued for us and will re-arm the timer.
                        Dispatch::Coalesced => deadline = None,
                        Dispatch::Stopped => break,
                    }
                }
            }
        }
        tracing::trace!("refresh worker exiting cleanly");
    }

    /// One refresh pass. Returns the next tick deadline, or `None` once stopped.
    fn run_pass(&mut self, trigger: RefreshTrigger) -> Option<Instant> {
        let started = self.clock.now();

        if trigger == RefreshTrigger::Alert {
            self.acknowledge_alert();
        }

        let published = match self.gauge.snapshot() {
            Ok(snapshot) => {
                self.publisher.publish(&snapshot);
                tracing::debug!(
                    ?trigger,
                    voltage_uv = snapshot.telemetry.voltage_uv,
                    percent = snapshot.telemetry.charge_percent,
                    crate_raw = snapshot.telemetry.crate_raw,
                    status = snapshot.status.as_str(),
                    elapsed_ms = self.clock.ms_since(started),
                    "refresh pass published"
                );
                true
            }
            Err(e) => {
                tracing::warn!(?trigger, error = %e, "refresh pass failed, nothing published");
                false
            }
        };

        // Drain acks owed by alerts coalesced into this pass. The final empty
        // check and `complete` share one lock.
        let next = loop {
            let mut scheduler = self.shared.scheduler();
            let pending = scheduler.take_pending_acks();
            if pending == 0 {
                break scheduler.complete(published);
            }
            drop(scheduler);
            tracing::debug!(pending, "acknowledging alerts coalesced into pass");
            for _ in 0..pending {
                self.acknowledge_alert();
            }
        };
        next.map(|d| self.clock.deadline_after(d))
    }

    /// Read-and-clear STATUS so the gauge releases ALRT.
    fn acknowledge_alert(&mut self) {
        match self.gauge.acknowledge_alert() {
            Ok(flags) => tracing::debug!(flags, "alert acknowledged"),
            Err(e) => tracing::warn!(error = %e, "failed to acknowledge alert"),
        }
    }
}

fn alert_loop<A: AlertSource>(
    mut source: A,
    handle: &TriggerHandle,
    shutdown: &AtomicBool,
    wait: Duration,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::debug!("alert thread received shutdown signal");
            break;
        }
        match source.wait(wait) {
            Ok(true) => {
                if handle.trigger(RefreshTrigger::Alert) == Dispatch::Stopped {
                    break;
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "alert wait failed");
                // Back off so a broken line does not spin.
                std::thread::sleep(wait);
            }
        }
    }
    tracing::trace!("alert thread exiting cleanly");
}
