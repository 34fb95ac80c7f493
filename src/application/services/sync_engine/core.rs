use crate::application::ports::RemoteDatastore;
use crate::application::services::id_reconciliation::IdentifierMap;
use crate::application::services::mutation_queue::MutationQueue;
use crate::domain::entities::{QueueEntry, SyncEntryError, SyncReport, SyncStatus};
use crate::domain::value_objects::{EntityId, QueueEntryId};
use crate::infrastructure::sync::{PassOutcomeMetadata, PassOutcomeStatus, SyncMetrics};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub remote_timeout: Duration,
    pub photo_bucket: String,
    pub max_passes_per_trigger: u32,
}

impl SyncSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            remote_timeout: config.remote_timeout(),
            photo_bucket: config.photo_bucket.clone(),
            max_passes_per_trigger: config.max_passes_per_trigger.max(1),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(30),
            photo_bucket: "plant-photos".to_string(),
            max_passes_per_trigger: 4,
        }
    }
}

/// What happened to one entry that did not error out.
pub(super) enum EntryOutcome {
    Applied,
    /// A create whose remote id was already known; replayed after a crash.
    AlreadyApplied,
    /// Part of the entry reached the remote; the rest stays queued and later
    /// entries for the same entity wait for it.
    Deferred(String),
}

/// Replays queued mutations against the remote datastore.
///
/// Only one pass runs at a time. A `sync_all` that arrives while a pass is in
/// flight returns immediately with a coalesced report and the running call
/// picks up whatever was enqueued in the meantime.
pub struct SyncEngine {
    pub(super) queue: MutationQueue,
    pub(super) id_map: IdentifierMap,
    pub(super) remote: Arc<dyn RemoteDatastore>,
    pub(super) settings: SyncSettings,
    gate: Mutex<()>,
    pub(super) rerun_requested: AtomicBool,
    status: RwLock<SyncStatus>,
    metrics: Arc<SyncMetrics>,
    shutdown: CancellationToken,
}

impl SyncEngine {
    pub fn new(
        queue: MutationQueue,
        id_map: IdentifierMap,
        remote: Arc<dyn RemoteDatastore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            queue,
            id_map,
            remote,
            settings,
            gate: Mutex::new(()),
            rerun_requested: AtomicBool::new(false),
            status: RwLock::new(SyncStatus::default()),
            metrics: Arc::new(SyncMetrics::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SyncMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<SyncMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn queue(&self) -> &MutationQueue {
        &self.queue
    }

    pub fn id_map(&self) -> &IdentifierMap {
        &self.id_map
    }

    /// Token cancelled by [`SyncEngine::shutdown`]; child tokens stop with it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn status(&self) -> SyncStatus {
        let mut status = self.status.read().await.clone();
        if let Ok(pending) = self.queue.count().await {
            status.pending = pending;
        }
        status
    }

    pub async fn sync_all(&self) -> Result<SyncReport, AppError> {
        let cancel = self.shutdown.child_token();
        self.sync_all_with(&cancel, "manual").await
    }

    /// Runs a pass over every queued entry. `trigger` only labels logs and metrics.
    pub async fn sync_all_with(
        &self,
        cancel: &CancellationToken,
        trigger: &str,
    ) -> Result<SyncReport, AppError> {
        let mut report = {
            let Ok(_guard) = self.gate.try_lock() else {
                self.rerun_requested.store(true, Ordering::SeqCst);
                tracing::debug!(target: "sync::engine", trigger, "sync already running; coalescing");
                let pending = self.queue.count().await?;
                return Ok(SyncReport::coalesced(pending));
            };
            self.run_pass(cancel, trigger).await?
        };
        self.run_owed_passes(cancel, trigger, &mut report).await?;
        Ok(report)
    }

    /// A caller turned away after the last rerun check but before the gate
    /// opened was told its work was handed over. Run that work here unless
    /// another caller already holds the gate.
    pub(super) async fn run_owed_passes(
        &self,
        cancel: &CancellationToken,
        trigger: &str,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        while !report.cancelled && self.rerun_requested.load(Ordering::SeqCst) {
            let Ok(_guard) = self.gate.try_lock() else {
                break;
            };
            tracing::debug!(target: "sync::engine", trigger, "running follow-up owed to a coalesced trigger");
            let follow_up = self.run_pass(cancel, trigger).await?;
            report.absorb(follow_up);
        }
        Ok(())
    }

    /// Must be called with the gate held.
    async fn run_pass(
        &self,
        cancel: &CancellationToken,
        trigger: &str,
    ) -> Result<SyncReport, AppError> {
        self.status.write().await.is_syncing = true;
        let started = Instant::now();
        tracing::info!(target: "sync::engine", trigger, "sync started");

        let result = async {
            let report = self.drain(cancel).await?;
            let pending = self.queue.count().await?;
            Ok::<_, AppError>(report.finish(pending))
        }
        .await;

        let elapsed = started.elapsed();
        self.finish(&result, trigger, elapsed).await;
        result
    }

    async fn drain(&self, cancel: &CancellationToken) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::default();
        let mut attempted: HashSet<QueueEntryId> = HashSet::new();
        let mut blocked: HashSet<EntityId> = HashSet::new();
        let mut passes = 0u32;

        loop {
            self.rerun_requested.store(false, Ordering::SeqCst);
            passes += 1;

            let snapshot: Vec<QueueEntry> = self
                .queue
                .peek_all()
                .await?
                .into_iter()
                .filter(|entry| !attempted.contains(&entry.id))
                .collect();
            tracing::debug!(
                target: "sync::engine",
                pass = passes,
                entries = snapshot.len(),
                "sync pass snapshot"
            );

            for entry in snapshot {
                if cancel.is_cancelled() {
                    tracing::info!(
                        target: "sync::engine",
                        synced = report.synced,
                        "sync cancelled between entries"
                    );
                    report.cancelled = true;
                    return Ok(report);
                }
                attempted.insert(entry.id.clone());
                self.process_entry(entry, &mut report, &mut blocked).await?;
            }

            if !self.rerun_requested.swap(false, Ordering::SeqCst) {
                break;
            }
            if passes >= self.settings.max_passes_per_trigger {
                tracing::debug!(
                    target: "sync::engine",
                    passes,
                    "follow-up pass limit reached; remaining entries wait for the next trigger"
                );
                break;
            }
        }

        Ok(report)
    }

    async fn process_entry(
        &self,
        entry: QueueEntry,
        report: &mut SyncReport,
        blocked: &mut HashSet<EntityId>,
    ) -> Result<(), AppError> {
        let referenced = entry.referenced_ids();
        if let Some(blocker) = referenced.iter().find(|id| blocked.contains(*id)) {
            let message = format!("blocked by earlier failure on `{blocker}`");
            tracing::debug!(target: "sync::engine", id = %entry.id, %message);
            report.record_failure(entry_error(&entry, message));
            if let Some(target) = entry.target_id() {
                blocked.insert(target);
            }
            return Ok(());
        }

        match self.apply(&entry).await {
            Ok(EntryOutcome::Applied) | Ok(EntryOutcome::AlreadyApplied) => {
                self.queue.remove(&entry.id).await?;
                report.record_synced();
                tracing::debug!(
                    target: "sync::engine",
                    id = %entry.id,
                    entity_type = %entry.entity_type,
                    operation = entry.operation_label(),
                    "entry synced"
                );
            }
            Ok(EntryOutcome::Deferred(reason)) => {
                tracing::warn!(
                    target: "sync::engine",
                    id = %entry.id,
                    entity_type = %entry.entity_type,
                    %reason,
                    "entry partially synced; remainder stays queued"
                );
                report.record_failure(entry_error(&entry, reason));
                if let Some(target) = entry.target_id() {
                    blocked.insert(target);
                }
            }
            Err(err) => {
                tracing::warn!(
                    target: "sync::engine",
                    id = %entry.id,
                    entity_type = %entry.entity_type,
                    operation = entry.operation_label(),
                    transient = err.is_transient(),
                    error = %err,
                    "entry failed to sync"
                );
                report.record_failure(entry_error(&entry, err.to_string()));
                if let Some(target) = entry.target_id() {
                    blocked.insert(target);
                }
            }
        }
        Ok(())
    }

    async fn finish(
        &self,
        result: &Result<SyncReport, AppError>,
        trigger: &str,
        elapsed: Duration,
    ) {
        {
            let mut status = self.status.write().await;
            status.is_syncing = false;
            match result {
                Ok(report) => {
                    status.pending = report.pending;
                    status.last_pass_failed = report.failed;
                    if report.success && !report.cancelled {
                        status.last_sync = Some(Utc::now().timestamp_millis());
                    }
                }
                Err(_) => status.sync_errors += 1,
            }
        }

        let (outcome, meta) = match result {
            Ok(report) => (
                if report.success && !report.cancelled {
                    PassOutcomeStatus::Success
                } else {
                    PassOutcomeStatus::Failure
                },
                PassOutcomeMetadata {
                    trigger: Some(trigger.to_string()),
                    duration_ms: Some(elapsed.as_millis() as u64),
                    synced_count: report.synced,
                    failed_count: report.failed,
                    pending_count: Some(report.pending),
                },
            ),
            Err(_) => (
                PassOutcomeStatus::Failure,
                PassOutcomeMetadata {
                    trigger: Some(trigger.to_string()),
                    duration_ms: Some(elapsed.as_millis() as u64),
                    ..PassOutcomeMetadata::default()
                },
            ),
        };
        self.metrics.record(outcome, &meta);

        match result {
            Ok(report) => tracing::info!(
                target: "sync::engine",
                trigger,
                synced = report.synced,
                failed = report.failed,
                pending = report.pending,
                cancelled = report.cancelled,
                elapsed_ms = elapsed.as_millis() as u64,
                "sync finished"
            ),
            Err(err) => tracing::error!(
                target: "sync::engine",
                trigger,
                error = %err,
                "sync aborted"
            ),
        }
    }

    /// Bounds a remote call by the configured timeout.
    pub(super) async fn timed<T, F>(&self, operation: &str, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.settings.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{operation} did not complete within {:?}",
                self.settings.remote_timeout
            ))),
        }
    }
}

fn entry_error(entry: &QueueEntry, error: String) -> SyncEntryError {
    SyncEntryError {
        id: entry.id.clone(),
        entity_type: entry.entity_type,
        operation: entry.operation,
        error,
    }
}
