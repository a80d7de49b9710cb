//! Scheduler: drives the monitor's cadences until shutdown.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use healthwatch_core::Config;

use crate::monitor::Monitor;

/// The periodic cycle types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    CollectMetrics,
    ScheduledCheck,
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleKind::CollectMetrics => f.write_str("collect_metrics"),
            CycleKind::ScheduledCheck => f.write_str("scheduled_check"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    RunningCycle(CycleKind),
}

/// A fixed-interval cadence, first due one interval after creation.
#[derive(Debug, Clone, Copy)]
struct Cadence {
    interval: Duration,
    next_due: Instant,
}

impl Cadence {
    fn starting_at(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Missed runs are not replayed.
    fn reschedule(&mut self, now: Instant) {
        self.next_due = now + self.interval;
    }
}

/// Runs metrics collection and scheduled checks on their own cadences,
/// checking what is due once per tick.
pub struct Scheduler {
    monitor: Monitor,
    tick: Duration,
    metrics: Cadence,
    checks: Cadence,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(
        monitor: Monitor,
        tick: Duration,
        metrics_interval: Duration,
        check_interval: Duration,
    ) -> Self {
        let now = Instant::now();
        Self {
            monitor,
            tick,
            metrics: Cadence::starting_at(metrics_interval, now),
            checks: Cadence::starting_at(check_interval, now),
            state: SchedulerState::Idle,
        }
    }

    pub fn from_config(monitor: Monitor, config: &Config) -> Self {
        Self::new(
            monitor,
            config.scheduler.tick_interval(),
            config.metrics.collection_interval(),
            config.scheduler.check_interval(),
        )
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// Loop until `shutdown` flips (or its sender is dropped).
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            tick_secs = self.tick.as_secs(),
            metrics_secs = self.metrics.interval.as_secs(),
            check_secs = self.checks.interval.as_secs(),
            "health monitor loop started"
        );

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    info!("health monitor loop shutting down");
                    break;
                }
            }
        }
    }

    /// Run every cycle that is due now, metrics first. Returns the cycles
    /// that were started, whether or not they succeeded.
    pub async fn tick(&mut self) -> Vec<CycleKind> {
        let mut ran = Vec::new();

        let now = Instant::now();
        if self.metrics.is_due(now) {
            self.metrics.reschedule(now);
            self.run_cycle(CycleKind::CollectMetrics).await;
            ran.push(CycleKind::CollectMetrics);
        }

        let now = Instant::now();
        if self.checks.is_due(now) {
            self.checks.reschedule(now);
            self.run_cycle(CycleKind::ScheduledCheck).await;
            ran.push(CycleKind::ScheduledCheck);
        }

        ran
    }

    /// Run one cycle, containing both errors and panics. Returns whether it
    /// completed successfully.
    async fn run_cycle(&mut self, kind: CycleKind) -> bool {
        self.state = SchedulerState::RunningCycle(kind);
        debug!(cycle = %kind, "cycle started");

        let ok = match kind {
            CycleKind::CollectMetrics => contain(kind, self.monitor.collect_metrics()).await,
            CycleKind::ScheduledCheck => contain(kind, self.monitor.scheduled_check()).await,
        };

        self.state = SchedulerState::Idle;
        ok
    }
}

async fn contain<T>(kind: CycleKind, cycle: impl Future<Output = anyhow::Result<T>>) -> bool {
    match AssertUnwindSafe(cycle).catch_unwind().await {
        Ok(Ok(_)) => {
            debug!(cycle = %kind, "cycle finished");
            true
        }
        Ok(Err(e)) => {
            error!(cycle = %kind, error = %format!("{e:#}"), "cycle failed");
            false
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(cycle = %kind, panic = %message, "cycle panicked");
            false
        }
    }
}
