use crate::application::ports::KeyValueStore;
use crate::domain::entities::CacheEntry;
use crate::shared::error::AppError;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Keys under the store namespace. Only `Cache` is reachable through the
/// public soft-state API; the queue and id map are written by their owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey<'a> {
    Queue,
    IdMap,
    Cache(&'a str),
}

/// Namespaced, timestamped persistence on top of a [`KeyValueStore`].
///
/// The `save`/`load`/`remove` family never surfaces errors: losing a cache entry
/// is not fatal. Callers that need to know about write failures use
/// [`LocalStore::write_entry`].
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn save<T: Serialize + Sync>(&self, key: &str, data: &T) -> bool {
        match self.write_entry(StoreKey::Cache(key), data).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: "sync::store", key, error = %err, "cache save failed");
                false
            }
        }
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.read_entry(StoreKey::Cache(key)).await {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(target: "sync::store", key, error = %err, "cache load failed");
                None
            }
        }
    }

    /// Like [`LocalStore::load`] but treats entries older than `max_age` as missing.
    pub async fn load_fresh<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: Duration,
    ) -> Option<CacheEntry<T>> {
        let now = Utc::now().timestamp_millis();
        self.load(key)
            .await
            .filter(|entry: &CacheEntry<T>| !entry.is_older_than(max_age, now))
    }

    pub async fn remove(&self, key: &str) -> bool {
        match self.backend.delete(&self.storage_key(StoreKey::Cache(key))).await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(target: "sync::store", key, error = %err, "cache remove failed");
                false
            }
        }
    }

    /// Wipes every key under this namespace, queue and id map included.
    pub async fn clear_all_under_namespace(&self) -> bool {
        match self.backend.delete_prefix(&self.prefix()).await {
            Ok(removed) => {
                tracing::info!(
                    target: "sync::store",
                    namespace = %self.namespace,
                    removed,
                    "local store cleared"
                );
                true
            }
            Err(err) => {
                tracing::warn!(target: "sync::store", error = %err, "local store clear failed");
                false
            }
        }
    }

    pub async fn write_entry<T: Serialize + Sync>(
        &self,
        key: StoreKey<'_>,
        data: &T,
    ) -> Result<(), AppError> {
        let entry = CacheEntry::new(data);
        let serialized = serde_json::to_string(&entry)?;
        self.backend.put(&self.storage_key(key), serialized).await
    }

    pub async fn read_entry<T: DeserializeOwned>(
        &self,
        key: StoreKey<'_>,
    ) -> Result<Option<CacheEntry<T>>, AppError> {
        let Some(raw) = self.backend.get(&self.storage_key(key)).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| AppError::DeserializationError(err.to_string()))
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    fn storage_key(&self, key: StoreKey<'_>) -> String {
        match key {
            StoreKey::Queue => format!("{}:queue", self.namespace),
            StoreKey::IdMap => format!("{}:idmap", self.namespace),
            StoreKey::Cache(name) => format!("{}:cache:{}", self.namespace, name),
        }
    }
}
