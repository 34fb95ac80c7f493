use async_trait::async_trait;
use bytes::Bytes;
use plantcare_sync::shared::error::AppError;
use plantcare_sync::{Record, RemoteDatastore};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Insert { table: String, record: Record },
    Update { table: String, id: String },
    Delete { table: String, id: String },
    Upload { path: String },
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    tables: HashMap<String, BTreeMap<String, Record>>,
    objects: BTreeMap<String, (Bytes, String)>,
    calls: Vec<RemoteCall>,
    failing_tables: HashSet<String>,
    failing_names: HashSet<String>,
    failing_uploads: bool,
}

/// In-memory stand-in for the hosted datastore and object storage.
pub struct FakeRemote {
    state: Mutex<FakeState>,
    delay: Duration,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 100,
                ..FakeState::default()
            }),
            delay,
        }
    }

    pub async fn fail_inserts_into(&self, table: &str) {
        self.state.lock().await.failing_tables.insert(table.to_string());
    }

    /// Rejects any insert whose `name` field equals `name`.
    pub async fn fail_records_named(&self, name: &str) {
        self.state.lock().await.failing_names.insert(name.to_string());
    }

    pub async fn set_upload_failure(&self, failing: bool) {
        self.state.lock().await.failing_uploads = failing;
    }

    pub async fn recover(&self) {
        let mut state = self.state.lock().await;
        state.failing_tables.clear();
        state.failing_names.clear();
        state.failing_uploads = false;
    }

    pub async fn records(&self, table: &str) -> Vec<Record> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn record(&self, table: &str, id: &str) -> Option<Record> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .and_then(|rows| rows.get(id).cloned())
    }

    pub async fn object_paths(&self) -> Vec<String> {
        self.state.lock().await.objects.keys().cloned().collect()
    }

    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn inserted_names(&self, table: &str) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::Insert { table: t, record } if t == table => record
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect()
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl RemoteDatastore for FakeRemote {
    async fn insert(&self, table: &str, mut record: Record) -> Result<Record, AppError> {
        self.pause().await;
        let mut state = self.state.lock().await;
        let name = record.get("name").and_then(Value::as_str).unwrap_or_default();
        if state.failing_tables.contains(table) || state.failing_names.contains(name) {
            return Err(AppError::Network(format!("insert into {table} refused")));
        }

        state.calls.push(RemoteCall::Insert {
            table: table.to_string(),
            record: record.clone(),
        });
        state.next_id += 1;
        let id = state.next_id;
        record.insert("id".into(), json!(id));
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, id: &str, partial: Record) -> Result<(), AppError> {
        self.pause().await;
        let mut state = self.state.lock().await;
        state.calls.push(RemoteCall::Update {
            table: table.to_string(),
            id: id.to_string(),
        });
        let row = state
            .tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(id))
            .ok_or_else(|| AppError::remote(Some(404), format!("{table}/{id} not found")))?;
        for (field, value) in partial {
            row.insert(field, value);
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), AppError> {
        self.pause().await;
        let mut state = self.state.lock().await;
        state.calls.push(RemoteCall::Delete {
            table: table.to_string(),
            id: id.to_string(),
        });
        if let Some(rows) = state.tables.get_mut(table) {
            rows.remove(id);
        }
        Ok(())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.pause().await;
        let mut state = self.state.lock().await;
        if state.failing_uploads {
            return Err(AppError::Network("upload refused".to_string()));
        }
        state.calls.push(RemoteCall::Upload {
            path: path.to_string(),
        });
        state
            .objects
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(format!("https://storage.test/{bucket}/{path}"))
    }
}
