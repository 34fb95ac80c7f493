pub mod entities;
pub mod value_objects;

pub use entities::{CacheEntry, QueueEntry, SyncReport};
pub use value_objects::{EntityId, EntityType, MutationOperation, MutationPayload, QueueEntryId};
