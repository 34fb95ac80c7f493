use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    pub remote_timeout_secs: u64,
    pub photo_bucket: String,
    /// Upper bound on coalesced follow-up passes run by one `sync_all` call.
    pub max_passes_per_trigger: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub namespace: String,
    pub cache_ttl: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            database: DatabaseConfig {
                url: format!(
                    "sqlite://{}?mode=rwc",
                    data_dir.join("plantcare.db").display()
                ),
                max_connections: 5,
                connection_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
                remote_timeout_secs: 30,
                photo_bucket: "plant-photos".to_string(),
                max_passes_per_trigger: 4,
            },
            storage: StorageConfig {
                data_dir: data_dir.display().to_string(),
                namespace: "plantcare".to_string(),
                cache_ttl: 3600, // 1 hour
            },
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

impl StorageConfig {
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PLANTCARE_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("PLANTCARE_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_u64("PLANTCARE_SYNC_INTERVAL") {
            cfg.sync.sync_interval = value.max(1);
        }
        if let Some(value) = env_u64("PLANTCARE_REMOTE_TIMEOUT_SECS") {
            cfg.sync.remote_timeout_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("PLANTCARE_PHOTO_BUCKET") {
            if !v.trim().is_empty() {
                cfg.sync.photo_bucket = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("PLANTCARE_STORE_NAMESPACE") {
            if !v.trim().is_empty() {
                cfg.storage.namespace = v.trim().to_string();
            }
        }
        if let Some(value) = env_u64("PLANTCARE_CACHE_TTL") {
            cfg.storage.cache_ttl = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.sync.remote_timeout_secs == 0 {
            return Err("Sync remote_timeout_secs must be greater than 0".to_string());
        }
        if self.sync.max_passes_per_trigger == 0 {
            return Err("Sync max_passes_per_trigger must be greater than 0".to_string());
        }
        if self.sync.photo_bucket.trim().is_empty() {
            return Err("Sync photo_bucket cannot be empty".to_string());
        }
        if self.storage.namespace.trim().is_empty() {
            return Err("Storage namespace cannot be empty".to_string());
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("plantcare"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| parse_u64(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
