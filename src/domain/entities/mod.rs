pub mod cache_entry;
pub mod queue_entry;
pub mod sync_report;
pub mod sync_status;

pub use cache_entry::CacheEntry;
pub use queue_entry::QueueEntry;
pub use sync_report::{SyncEntryError, SyncReport};
pub use sync_status::{QueueHealth, SyncStatus};
