use crate::application::services::sync_engine::SyncEngine;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Startup,
    Manual,
    Interval,
    Reconnect,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Startup => "startup",
            SyncTrigger::Manual => "manual",
            SyncTrigger::Interval => "interval",
            SyncTrigger::Reconnect => "reconnect",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides when the engine runs: on request, on a timer, and when the
/// connectivity signal flips from offline to online. Nothing runs while offline.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    connectivity: watch::Receiver<bool>,
    interval: Option<Duration>,
    wake: Arc<Notify>,
    cancel: CancellationToken,
}

pub struct SchedulerHandle {
    wake: Arc<Notify>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Requests a pass. Requests made while one is running collapse into one.
    pub fn trigger(&self) {
        self.wake.notify_one();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the loop and any in-flight pass, then waits for the task.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            tracing::warn!(target: "sync::scheduler", error = %err, "scheduler task ended abnormally");
        }
    }
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>, connectivity: watch::Receiver<bool>) -> Self {
        let cancel = engine.shutdown_token().child_token();
        Self {
            engine,
            connectivity,
            interval: None,
            wake: Arc::new(Notify::new()),
            cancel,
        }
    }

    pub fn with_interval(mut self, period: Duration) -> Self {
        self.interval = Some(period);
        self
    }

    pub fn spawn(self) -> SchedulerHandle {
        let wake = Arc::clone(&self.wake);
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());
        SchedulerHandle { wake, cancel, task }
    }

    async fn run(mut self) {
        let mut ticker = self.interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        let mut online = *self.connectivity.borrow_and_update();
        let mut signal_open = true;

        tracing::info!(
            target: "sync::scheduler",
            online,
            interval_secs = self.interval.map(|period| period.as_secs()),
            "sync scheduler started"
        );

        if online {
            self.run_pass(SyncTrigger::Startup).await;
        }

        loop {
            let trigger = tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.wake.notified() => SyncTrigger::Manual,
                _ = next_tick(&mut ticker) => SyncTrigger::Interval,
                changed = self.connectivity.changed(), if signal_open => {
                    if changed.is_err() {
                        tracing::debug!(target: "sync::scheduler", "connectivity signal closed; keeping last state");
                        signal_open = false;
                        continue;
                    }
                    let now_online = *self.connectivity.borrow_and_update();
                    let reconnected = now_online && !online;
                    online = now_online;
                    tracing::debug!(target: "sync::scheduler", online, "connectivity changed");
                    if !reconnected {
                        continue;
                    }
                    SyncTrigger::Reconnect
                }
            };

            if !online {
                tracing::debug!(target: "sync::scheduler", %trigger, "offline; pass skipped");
                continue;
            }
            self.run_pass(trigger).await;
        }

        tracing::info!(target: "sync::scheduler", "sync scheduler stopped");
    }

    async fn run_pass(&self, trigger: SyncTrigger) {
        let cancel = self.cancel.child_token();
        match self.engine.sync_all_with(&cancel, trigger.as_str()).await {
            Ok(report) if report.coalesced => {
                tracing::debug!(target: "sync::scheduler", %trigger, "joined in-flight pass");
            }
            Ok(report) => {
                tracing::debug!(
                    target: "sync::scheduler",
                    %trigger,
                    synced = report.synced,
                    failed = report.failed,
                    "scheduled pass finished"
                );
            }
            Err(err) => {
                tracing::error!(target: "sync::scheduler", %trigger, error = %err, "scheduled pass failed");
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
