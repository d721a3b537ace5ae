//! Fixed-interval driver for the reconciliation engine.
//!
//! ```text
//! Idle -> Running -> Idle -> Running -> ... -> Stopped
//! ```
//!
//! The interval is measured from the end of one cycle to the start of the
//! next, so the real cadence is interval + cycle duration. Cancellation is
//! only observed while idle: a cycle that has started always runs to
//! completion.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::{CycleOutcome, ReconcileEngine};

pub struct Scheduler {
    engine: ReconcileEngine,
    interval: Duration,
}

impl Scheduler {
    pub fn new(engine: ReconcileEngine, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Run a single cycle.
    pub async fn run_once(&self) -> CycleOutcome {
        self.engine.run_cycle().await
    }

    /// Run cycles until `shutdown` is cancelled. Returns the number of
    /// cycles executed.
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        let mut cycles = 0;
        tracing::info!(interval = ?self.interval, "Scheduler started");

        while !shutdown.is_cancelled() {
            self.engine.run_cycle().await;
            cycles += 1;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(cycles, "Scheduler stopped");
        cycles
    }

    /// Move the scheduler onto its own task.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<u64> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
