///! Scheduled task manager - Centralize all periodic tasks
///!
///! This module manages the scheduled background tasks:
///! - Relay poll tick (every 10 seconds); the tick itself refreshes the
///!   feeds whenever they are older than the refresh interval

use super::relay::{RelayUpdater, TickReport};
use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Configuration for scheduled tasks
#[derive(Debug, Clone)]
pub struct ScheduledTaskConfig {
    /// Interval between poll ticks (in seconds)
    pub tick_interval_secs: u64,
}

impl Default for ScheduledTaskConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10,
        }
    }
}

/// Scheduled task manager
pub struct ScheduledTaskManager {
    config: ScheduledTaskConfig,
    task_handles: Vec<JoinHandle<()>>,
}

impl ScheduledTaskManager {
    /// Create a new scheduled task manager
    pub fn new(config: ScheduledTaskConfig) -> Self {
        Self {
            config,
            task_handles: Vec::new(),
        }
    }

    /// Start the relay poll task, which owns `updater` from now on
    pub fn start_relay_poll_task(&mut self, updater: RelayUpdater) {
        let tick = Duration::from_secs(self.config.tick_interval_secs.max(1));

        tracing::info!("Scheduling relay poll task (tick: {}s)", tick.as_secs());

        let handle = tokio::spawn(async move {
            Self::relay_poll_loop(updater, tick).await;
        });
        self.task_handles.push(handle);
    }

    /// Relay poll loop; the first tick runs immediately
    async fn relay_poll_loop(mut updater: RelayUpdater, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let report = updater.tick(Utc::now()).await;
            Self::log_tick(&report);
        }
    }

    fn log_tick(report: &TickReport) {
        let announced = report.windows_announced + report.downlinks_announced;
        if announced > 0 || report.publish_failures > 0 {
            tracing::info!(
                "Poll tick: {} windows, {} downlinks announced, {} suppressed, {} publish failures ({} given up)",
                report.windows_announced,
                report.downlinks_announced,
                report.downlinks_suppressed,
                report.publish_failures,
                report.publish_abandoned
            );
        } else {
            tracing::trace!("Poll tick: nothing to announce");
        }
    }

    /// Number of running tasks
    pub fn task_count(&self) -> usize {
        self.task_handles.len()
    }

    /// Gracefully shutdown all tasks
    pub async fn shutdown(self) {
        tracing::info!("Shutting down scheduled task manager...");

        for handle in self.task_handles {
            handle.abort();
            let _ = handle.await;
        }

        tracing::info!("All scheduled tasks stopped");
    }
}
