//! Scheduler Wrapper
//!
//! Re-invokes the mode controller on a fixed cadence. Each tick runs in its own
//! task so a panic inside the controller or an adapter surfaces as a join error
//! here instead of unwinding through the process.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::controller::{ModeController, TickReport};
use super::shutdown::ShutdownSignal;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period between tick starts
    pub cadence: Duration,
    /// Extra pause after a faulted tick
    pub fault_cooldown: Duration,
    /// Stop after this many ticks (None = until shutdown)
    pub max_ticks: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(30),
            fault_cooldown: Duration::from_secs(15),
            max_ticks: None,
        }
    }
}

/// Counters for a finished scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub ticks: u64,
    /// Ticks that ended with a controller error
    pub errors: u64,
    /// Ticks that panicked or were aborted
    pub faults: u64,
    pub orders_accepted: u64,
}

pub struct Scheduler {
    config: SchedulerConfig,
    controller: Arc<Mutex<ModeController>>,
    shutdown: ShutdownSignal,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, controller: ModeController) -> Self {
        Self {
            config,
            controller: Arc::new(Mutex::new(controller)),
            shutdown: ShutdownSignal::never(),
        }
    }

    /// Stop between ticks once `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Tick until shutdown or `max_ticks`. Never returns an error: every
    /// failure is logged and the next tick starts from scratch.
    pub async fn run(&self) -> SchedulerSummary {
        let mut summary = SchedulerSummary::default();

        tracing::info!(
            "Starting scheduler - cadence: {:?}, fault cooldown: {:?}",
            self.config.cadence,
            self.config.fault_cooldown
        );

        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            let started = Instant::now();
            summary.ticks += 1;

            match self.tick_isolated(summary.ticks).await {
                TickOutcome::Completed(report) => {
                    summary.orders_accepted += u64::from(report.orders_accepted());
                }
                TickOutcome::Failed => summary.errors += 1,
                TickOutcome::Faulted => {
                    summary.faults += 1;
                    if self.shutdown.sleep(self.config.fault_cooldown).await {
                        break;
                    }
                }
            }

            if self.config.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }

            let wait = self.config.cadence.saturating_sub(started.elapsed());
            if self.shutdown.sleep(wait).await {
                break;
            }
        }

        tracing::info!(
            "Scheduler stopped after {} ticks ({} errors, {} faults, {} orders accepted)",
            summary.ticks,
            summary.errors,
            summary.faults,
            summary.orders_accepted
        );
        summary
    }

    /// Run one tick in a separate task
    async fn tick_isolated(&self, tick: u64) -> TickOutcome {
        let controller = Arc::clone(&self.controller);
        let handle = tokio::spawn(async move { controller.lock().await.tick().await });

        match handle.await {
            Ok(Ok(report)) => {
                tracing::debug!("tick {} finished: {:?}", tick, report);
                TickOutcome::Completed(report)
            }
            Ok(Err(e)) => {
                // Contained: the next tick re-reads everything
                tracing::error!("tick {} failed: {}", tick, e);
                TickOutcome::Failed
            }
            Err(e) if e.is_panic() => {
                tracing::error!(
                    "tick {} panicked, cooling down for {:?}",
                    tick,
                    self.config.fault_cooldown
                );
                TickOutcome::Faulted
            }
            Err(e) => {
                tracing::error!("tick {} aborted: {}", tick, e);
                TickOutcome::Faulted
            }
        }
    }
}

enum TickOutcome {
    Completed(TickReport),
    /// Controller returned an error
    Failed,
    /// Task panicked or was cancelled
    Faulted,
}
