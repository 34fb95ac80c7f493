use crate::application::ports::{KeyValueStore, RemoteDatastore};
use crate::application::services::{
    IdentifierMap, LocalStore, MutationQueue, SchedulerHandle, SyncEngine, SyncScheduler,
    SyncSettings,
};
use crate::domain::entities::{CacheEntry, QueueEntry, QueueHealth, SyncReport, SyncStatus};
use crate::domain::value_objects::{EntityType, MutationOperation, MutationPayload};
use crate::infrastructure::database::Database;
use crate::infrastructure::storage::SqliteKeyValueStore;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the app shell needs to queue mutations and keep them syncing.
#[derive(Clone)]
pub struct SyncRuntime {
    pub config: Arc<AppConfig>,
    pub store: LocalStore,
    pub queue: MutationQueue,
    pub id_map: IdentifierMap,
    pub engine: Arc<SyncEngine>,
}

impl SyncRuntime {
    /// Opens the SQLite store described by `config` and loads persisted state.
    pub async fn new(config: AppConfig, remote: Arc<dyn RemoteDatastore>) -> anyhow::Result<Self> {
        config.validate().map_err(anyhow::Error::msg)?;
        let pool = Database::initialize(&config.database).await?;
        let backend: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(pool));
        Ok(Self::with_backend(config, backend, remote).await?)
    }

    pub async fn with_backend(
        config: AppConfig,
        backend: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteDatastore>,
    ) -> Result<Self, AppError> {
        let store = LocalStore::new(backend, config.storage.namespace.clone());
        let queue = MutationQueue::init(store.clone()).await?;
        let id_map = IdentifierMap::load(store.clone()).await?;
        let engine = Arc::new(SyncEngine::new(
            queue.clone(),
            id_map.clone(),
            remote,
            SyncSettings::from_config(&config.sync),
        ));

        tracing::info!(
            target: "sync::runtime",
            namespace = %config.storage.namespace,
            auto_sync = config.sync.auto_sync,
            "sync runtime ready"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            queue,
            id_map,
            engine,
        })
    }

    pub async fn enqueue(
        &self,
        entity_type: EntityType,
        operation: Option<MutationOperation>,
        payload: MutationPayload,
    ) -> Result<QueueEntry, AppError> {
        self.queue.enqueue(entity_type, operation, payload).await
    }

    pub async fn sync_all(&self) -> Result<SyncReport, AppError> {
        self.engine.sync_all().await
    }

    pub async fn status(&self) -> SyncStatus {
        self.engine.status().await
    }

    pub async fn queue_health(&self) -> Result<QueueHealth, AppError> {
        self.queue.health().await
    }

    /// Starts background passes. The interval only applies with `auto_sync`.
    pub fn start_scheduler(&self, connectivity: watch::Receiver<bool>) -> SchedulerHandle {
        let scheduler = SyncScheduler::new(Arc::clone(&self.engine), connectivity);
        let scheduler = if self.config.sync.auto_sync {
            scheduler.with_interval(self.config.sync.interval())
        } else {
            scheduler
        };
        scheduler.spawn()
    }

    pub async fn cache<T: Serialize + Sync>(&self, key: &str, data: &T) -> bool {
        self.store.save(key, data).await
    }

    /// Cached value if younger than the configured `cache_ttl`.
    pub async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        self.store
            .load_fresh(key, self.config.storage.cache_max_age())
            .await
    }

    /// Cancels running passes and flushes the queue.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.engine.shutdown();
        self.queue.shutdown().await
    }
}
