pub mod embedded_image;
pub mod entity_id;
pub mod entity_type;
pub mod mutation_operation;
pub mod payload;
pub mod queue_entry_id;

pub use embedded_image::{EmbeddedImage, EmbeddedImageError};
pub use entity_id::{EntityId, TEMPORARY_ID_PREFIX};
pub use entity_type::EntityType;
pub use mutation_operation::MutationOperation;
pub use payload::{ID_FIELD, MutationPayload, OFFLINE_FLAG_FIELD, PHOTO_URL_FIELD};
pub use queue_entry_id::QueueEntryId;
