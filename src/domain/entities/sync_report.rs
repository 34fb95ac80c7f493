use crate::domain::value_objects::{EntityType, MutationOperation, QueueEntryId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncEntryError {
    pub id: QueueEntryId,
    pub entity_type: EntityType,
    pub operation: Option<MutationOperation>,
    pub error: String,
}

/// Outcome of one `sync_all` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncReport {
    pub success: bool,
    pub synced: u32,
    pub failed: u32,
    pub errors: Vec<SyncEntryError>,
    /// Entries still queued once the call returned.
    pub pending: usize,
    /// The call found a pass in flight and handed its work to it.
    pub coalesced: bool,
    pub cancelled: bool,
}

impl SyncReport {
    pub fn coalesced(pending: usize) -> Self {
        Self {
            success: true,
            pending,
            coalesced: true,
            ..Self::default()
        }
    }

    pub fn record_synced(&mut self) {
        self.synced += 1;
    }

    pub fn record_failure(&mut self, error: SyncEntryError) {
        self.failed += 1;
        self.errors.push(error);
    }

    /// Folds a later pass run by the same call into this report.
    pub fn absorb(&mut self, later: SyncReport) {
        self.synced += later.synced;
        self.failed += later.failed;
        self.errors.extend(later.errors);
        self.success = self.failed == 0;
        self.pending = later.pending;
        self.cancelled = later.cancelled;
    }

    pub fn finish(mut self, pending: usize) -> Self {
        self.success = self.failed == 0;
        self.pending = pending;
        self
    }
}
