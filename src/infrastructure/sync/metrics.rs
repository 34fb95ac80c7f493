use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub successful_passes: u64,
    pub failed_passes: u64,
    pub consecutive_failed_passes: u64,
    pub entries_synced: u64,
    pub entries_failed: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<PassOutcomeStatus>,
    pub last_trigger: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub last_synced_count: Option<u32>,
    pub last_failed_count: Option<u32>,
    pub last_pending_count: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PassOutcomeMetadata {
    pub trigger: Option<String>,
    pub duration_ms: Option<u64>,
    pub synced_count: u32,
    pub failed_count: u32,
    pub pending_count: Option<usize>,
}

#[derive(Default, Clone)]
struct LastPassMetadata {
    last_outcome: Option<PassOutcomeStatus>,
    trigger: Option<String>,
    duration_ms: Option<u64>,
    synced_count: Option<u32>,
    failed_count: Option<u32>,
    pending_count: Option<usize>,
}

/// Counters describing sync passes over the lifetime of one engine.
pub struct SyncMetrics {
    passes: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    consecutive_failure: AtomicU64,
    entries_synced: AtomicU64,
    entries_failed: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    metadata: Mutex<LastPassMetadata>,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            entries_synced: AtomicU64::new(0),
            entries_failed: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastPassMetadata::default()),
        }
    }

    pub fn record(
        &self,
        status: PassOutcomeStatus,
        meta: &PassOutcomeMetadata,
    ) -> SyncMetricsSnapshot {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.entries_synced
            .fetch_add(u64::from(meta.synced_count), Ordering::Relaxed);
        self.entries_failed
            .fetch_add(u64::from(meta.failed_count), Ordering::Relaxed);

        match status {
            PassOutcomeStatus::Success => {
                self.success.fetch_add(1, Ordering::Relaxed);
                self.last_success_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.store(0, Ordering::Relaxed);
            }
            PassOutcomeStatus::Failure => {
                self.failure.fetch_add(1, Ordering::Relaxed);
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Ok(mut guard) = self.metadata.lock() {
            guard.last_outcome = Some(status);
            guard.trigger = meta.trigger.clone();
            guard.duration_ms = meta.duration_ms;
            guard.synced_count = Some(meta.synced_count);
            guard.failed_count = Some(meta.failed_count);
            guard.pending_count = meta.pending_count;
        }

        self.snapshot()
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| LastPassMetadata::default());

        SyncMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            successful_passes: self.success.load(Ordering::Relaxed),
            failed_passes: self.failure.load(Ordering::Relaxed),
            consecutive_failed_passes: self.consecutive_failure.load(Ordering::Relaxed),
            entries_synced: self.entries_synced.load(Ordering::Relaxed),
            entries_failed: self.entries_failed.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: metadata.last_outcome,
            last_trigger: metadata.trigger,
            last_duration_ms: metadata.duration_ms,
            last_synced_count: metadata.synced_count,
            last_failed_count: metadata.failed_count,
            last_pending_count: metadata.pending_count,
        }
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
