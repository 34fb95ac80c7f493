use crate::shared::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/// Hosted relational datastore plus object storage.
#[async_trait]
pub trait RemoteDatastore: Send + Sync {
    /// Inserts `record` and returns it as stored, including the assigned `id`.
    async fn insert(&self, table: &str, record: Record) -> Result<Record, AppError>;
    async fn update(&self, table: &str, id: &str, partial: Record) -> Result<(), AppError>;
    async fn delete(&self, table: &str, id: &str) -> Result<(), AppError>;
    /// Stores `bytes` at `path`, overwriting any existing object, and returns its public URL.
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, AppError>;
}
