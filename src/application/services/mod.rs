pub mod id_reconciliation;
pub mod local_store;
pub mod mutation_queue;
pub mod sync_engine;
pub mod sync_scheduler;

pub use id_reconciliation::IdentifierMap;
pub use local_store::{LocalStore, StoreKey};
pub use mutation_queue::MutationQueue;
pub use sync_engine::{SyncEngine, SyncSettings};
pub use sync_scheduler::{SchedulerHandle, SyncScheduler, SyncTrigger};
