pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod runtime;
pub mod shared;

pub use application::ports::{KeyValueStore, Record, RemoteDatastore};
pub use application::services::{
    IdentifierMap, LocalStore, MutationQueue, SchedulerHandle, SyncEngine, SyncScheduler,
    SyncSettings, SyncTrigger,
};
pub use domain::entities::{CacheEntry, QueueEntry, QueueHealth, SyncReport, SyncStatus};
pub use domain::value_objects::{EntityId, EntityType, MutationOperation, MutationPayload};
pub use runtime::SyncRuntime;
pub use shared::{AppConfig, AppError, Result};

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plantcare_sync=debug,sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
