use crate::application::services::local_store::{LocalStore, StoreKey};
use crate::domain::value_objects::EntityId;
use crate::shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Persistent `temporary id -> remote id` associations. Entries are never
/// removed: a mutation queued long before its referent synced must still
/// resolve.
#[derive(Clone)]
pub struct IdentifierMap {
    store: LocalStore,
    mappings: Arc<RwLock<HashMap<String, String>>>,
}

impl IdentifierMap {
    pub async fn load(store: LocalStore) -> Result<Self, AppError> {
        let mappings = store
            .read_entry::<HashMap<String, String>>(StoreKey::IdMap)
            .await?
            .map(|entry| entry.data)
            .unwrap_or_default();

        tracing::debug!(
            target: "sync::idmap",
            mappings = mappings.len(),
            "identifier map loaded"
        );

        Ok(Self {
            store,
            mappings: Arc::new(RwLock::new(mappings)),
        })
    }

    /// Real ids pass through. Temporary ids map to their remote id when known
    /// and are otherwise returned unchanged.
    pub async fn resolve(&self, id: &EntityId) -> EntityId {
        match id {
            EntityId::Real(_) => id.clone(),
            EntityId::Temporary(temp) => match self.mappings.read().await.get(temp) {
                Some(real) => EntityId::Real(real.clone()),
                None => id.clone(),
            },
        }
    }

    pub async fn lookup(&self, temp_id: &EntityId) -> Option<EntityId> {
        match temp_id {
            EntityId::Temporary(temp) => self
                .mappings
                .read()
                .await
                .get(temp)
                .map(|real| EntityId::Real(real.clone())),
            EntityId::Real(_) => None,
        }
    }

    /// Records a new association and persists the whole map. The mapping is
    /// kept in memory even when persisting fails.
    pub async fn record(&self, temp_id: &EntityId, real_id: &EntityId) -> Result<(), AppError> {
        let (EntityId::Temporary(temp), EntityId::Real(real)) = (temp_id, real_id) else {
            return Err(AppError::ValidationError(format!(
                "cannot map `{temp_id}` to `{real_id}`: expected a temporary and a remote id"
            )));
        };

        let mut mappings = self.mappings.write().await;
        if let Some(existing) = mappings.get(temp) {
            if existing == real {
                return Ok(());
            }
            return Err(AppError::ValidationError(format!(
                "`{temp}` is already mapped to `{existing}`"
            )));
        }

        mappings.insert(temp.clone(), real.clone());
        tracing::debug!(target: "sync::idmap", temp = %temp, real = %real, "identifier reconciled");
        self.store.write_entry(StoreKey::IdMap, &*mappings).await
    }

    /// Writes the in-memory map again, e.g. after `record` failed to persist.
    pub async fn flush(&self) -> Result<(), AppError> {
        let mappings = self.mappings.read().await;
        self.store.write_entry(StoreKey::IdMap, &*mappings).await
    }

    pub async fn len(&self) -> usize {
        self.mappings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.mappings.read().await.is_empty()
    }
}
