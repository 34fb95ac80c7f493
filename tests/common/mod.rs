#![allow(dead_code)]

pub mod mocks;

use mocks::FakeRemote;
use plantcare_sync::domain::value_objects::EmbeddedImage;
use plantcare_sync::infrastructure::storage::MemoryKeyValueStore;
use plantcare_sync::{AppConfig, MutationPayload, SyncRuntime};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestContext {
    pub runtime: SyncRuntime,
    pub remote: Arc<FakeRemote>,
    pub backend: MemoryKeyValueStore,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.namespace = "test".to_string();
    config.sync.remote_timeout_secs = 5;
    config
}

pub async fn setup_runtime() -> TestContext {
    setup_runtime_with(FakeRemote::new()).await
}

pub async fn setup_runtime_with(remote: FakeRemote) -> TestContext {
    let remote = Arc::new(remote);
    let backend = MemoryKeyValueStore::new();
    let runtime = SyncRuntime::with_backend(
        test_config(),
        Arc::new(backend.clone()),
        remote.clone(),
    )
    .await
    .expect("runtime");

    TestContext {
        runtime,
        remote,
        backend,
    }
}

/// Config pointing at a SQLite file inside `dir`.
pub fn sqlite_config(dir: &TempDir) -> AppConfig {
    let mut config = test_config();
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("plantcare.db").display()
    );
    config.database.max_connections = 1;
    config
}

pub fn payload(value: Value) -> MutationPayload {
    MutationPayload::new(value).expect("object payload")
}

pub fn sample_image(seed: &str) -> EmbeddedImage {
    EmbeddedImage::from_bytes("image/jpeg", format!("jpeg:{seed}").into_bytes())
}
