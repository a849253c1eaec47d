// file: src/pipeline/scheduler.rs
// description: fixed-interval driver for reconciliation cycles with explicit start and stop
// reference: https://docs.rs/tokio/latest/tokio/time/struct.Interval.html

use crate::config::SchedulerConfig;
use crate::pipeline::orchestrator::CycleRunner;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub struct CycleScheduler {
    runner: Arc<CycleRunner>,
    interval: Duration,
    run_on_start: bool,
}

/// Handle to a running scheduler. Dropping it without `stop` leaves the task running.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl CycleScheduler {
    pub fn new(runner: Arc<CycleRunner>, interval: Duration, run_on_start: bool) -> Self {
        Self {
            runner,
            interval,
            run_on_start,
        }
    }

    pub fn from_config(runner: Arc<CycleRunner>, config: &SchedulerConfig) -> Self {
        Self::new(runner, config.interval(), config.run_on_start)
    }

    /// Spawns the periodic driver. Cycles never overlap: a tick that arrives while
    /// a cycle runs waits for it, and missed ticks are delayed rather than bursted.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = if self.run_on_start {
                tokio::time::interval(self.interval)
            } else {
                tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval)
            };
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "Scheduler started: one cycle every {}s",
                self.interval.as_secs()
            );
            let mut completed = 0usize;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                match self.runner.run_cycle().await {
                    Ok(report) => {
                        completed += 1;
                        info!(
                            "Scheduled cycle {} finished: {} files, {} changes",
                            report.cycle_id,
                            report.inventory.len(),
                            report.changes.len()
                        );
                    }
                    Err(e) if e.is_cycle_abort() => {
                        error!("Scheduled cycle aborted, retrying next tick: {}", e);
                    }
                    Err(e) => warn!("Scheduled cycle failed: {}", e),
                }

                if *shutdown_rx.borrow() {
                    break;
                }
            }

            info!("Scheduler stopped after {} cycles", completed);
            completed
        });

        SchedulerHandle { shutdown, task }
    }
}

impl SchedulerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals shutdown and waits for the in-flight cycle, if any, to finish.
    /// Returns the number of cycles that completed.
    pub async fn stop(self) -> usize {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(completed) => completed,
            Err(e) => {
                error!("Scheduler task ended abnormally: {}", e);
                0
            }
        }
    }
}
