use crate::shared::error::AppError;
use async_trait::async_trait;

/// Raw persistence medium behind the local store. Keys arrive already namespaced.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn put(&self, key: &str, value: String) -> Result<(), AppError>;
    /// Returns whether a value was present.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;
    /// Removes every key starting with `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, AppError>;
}
