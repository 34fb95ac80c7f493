use serde::{Deserialize, Serialize};

/// Snapshot shown by the "N pending" indicator and the retry banner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub pending: usize,
    pub last_sync: Option<i64>,
    pub last_pass_failed: u32,
    pub sync_errors: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueHealth {
    pub pending: usize,
    pub persistence_failures: u64,
    pub last_persist_error: Option<String>,
}

impl QueueHealth {
    pub fn is_durable(&self) -> bool {
        self.last_persist_error.is_none()
    }
}
