mod common;

use common::mocks::FakeRemote;
use common::{payload, sqlite_config};
use plantcare_sync::{EntityType, MutationOperation, SyncRuntime};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_queue_and_id_map_survive_restart() {
    let dir = TempDir::new().unwrap();
    let remote = Arc::new(FakeRemote::new());

    let first = SyncRuntime::new(sqlite_config(&dir), remote.clone())
        .await
        .unwrap();
    let plant = first
        .enqueue(
            EntityType::Plant,
            Some(MutationOperation::Create),
            payload(json!({"name": "Rubber plant"})),
        )
        .await
        .unwrap();
    let plant_temp = plant.target_id().unwrap();
    first
        .enqueue(
            EntityType::Action,
            Some(MutationOperation::Create),
            payload(json!({"plant_id": plant_temp.as_str(), "kind": "water"})),
        )
        .await
        .unwrap();
    first.shutdown().await.unwrap();

    let second = SyncRuntime::new(sqlite_config(&dir), remote.clone())
        .await
        .unwrap();
    let restored = second.queue.peek_all().await.unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(restored[0], plant);

    let report = second.sync_all().await.unwrap();
    assert!(report.success);
    assert_eq!(report.synced, 2);
    second.shutdown().await.unwrap();

    let third = SyncRuntime::new(sqlite_config(&dir), remote.clone())
        .await
        .unwrap();
    assert_eq!(third.queue.count().await.unwrap(), 0);
    let resolved = third.id_map.resolve(&plant_temp).await;
    assert!(!resolved.is_temporary());
    assert!(remote.record("plants", resolved.as_str()).await.is_some());
}

#[tokio::test]
async fn test_clear_namespace_drops_everything() {
    let dir = TempDir::new().unwrap();
    let remote = Arc::new(FakeRemote::new());
    let runtime = SyncRuntime::new(sqlite_config(&dir), remote).await.unwrap();

    runtime
        .enqueue(
            EntityType::Location,
            Some(MutationOperation::Create),
            payload(json!({"name": "Office"})),
        )
        .await
        .unwrap();
    assert!(runtime.cache("locations", &vec!["Office"]).await);

    assert!(runtime.store.clear_all_under_namespace().await);
    assert!(runtime.cached::<Vec<String>>("locations").await.is_none());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = sqlite_config(&dir);
    config.sync.photo_bucket = String::new();

    let result = SyncRuntime::new(config, Arc::new(FakeRemote::new())).await;
    assert!(result.is_err());
}
