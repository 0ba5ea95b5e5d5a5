use std::future::Future;

use tokio::time::{Duration, MissedTickBehavior};

use crate::error::TrackerError;
use crate::types::models::TokenMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Once,
    Every(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
    Cancelled,
}

/// Drives the aggregation once or on a fixed period.
///
/// Iterations never overlap: the job is awaited inside the tick and ticks missed
/// while it runs are skipped. Shutdown is only observed between iterations, so
/// an in-flight aggregation always completes and is emitted.
pub struct Scheduler {
    mode: RunMode,
    state: SchedulerState,
    iterations: u64,
}

impl Scheduler {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            state: SchedulerState::Idle,
            iterations: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Runs `job` and hands each record to `emit`. In one-shot mode a job error is
    /// returned; in repeating mode it is logged and the next tick proceeds.
    pub async fn run<J, Fut, E, S>(&mut self, mut job: J, mut emit: E, shutdown: S) -> Result<(), TrackerError>
    where
        J: FnMut() -> Fut,
        Fut: Future<Output = Result<TokenMetrics, TrackerError>>,
        E: FnMut(u64, &TokenMetrics),
        S: Future<Output = ()>,
    {
        self.state = SchedulerState::Running;

        let period = match self.mode {
            RunMode::Once => {
                let result = job().await;
                self.state = SchedulerState::Stopped;
                let metrics = result?;
                self.iterations += 1;
                emit(self.iterations, &metrics);
                return Ok(());
            }
            RunMode::Every(period) => period,
        };

        tracing::info!("Watching with a {:?} interval", period);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested after {} iterations", self.iterations);
                    self.state = SchedulerState::Cancelled;
                    return Ok(());
                }
                _ = ticker.tick() => {
                    match job().await {
                        Ok(metrics) => {
                            self.iterations += 1;
                            emit(self.iterations, &metrics);
                        }
                        Err(e) => tracing::error!("Update failed: {}", e),
                    }
                }
            }
        }
    }
}
