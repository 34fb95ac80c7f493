pub mod core;
pub mod handlers;

pub use self::core::{SyncEngine, SyncSettings};
pub use self::handlers::{PENDING_SEGMENT, object_path};
