use crate::shared::config::DatabaseConfig;
use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub type DbPool = Pool<Sqlite>;

pub struct Database;

impl Database {
    pub async fn initialize(config: &DatabaseConfig) -> Result<DbPool> {
        // Create database directory
        if let Some(parent) = sqlite_file_path(&config.url).and_then(|path| path.parent()) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;

        info!(target: "sync::store", url = %config.url, "local database connected");

        Self::run_migrations(&pool).await?;

        Ok(pool)
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<DbPool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Self::run_migrations(&pool).await?;
        Ok(pool)
    }

    pub async fn run_migrations(pool: &DbPool) -> Result<()> {
        info!(target: "sync::store", "running local store migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }
}

/// File backing a `sqlite:` URL, or `None` for in-memory databases.
fn sqlite_file_path(url: &str) -> Option<&Path> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.starts_with(":memory:") || path == "memory:" {
        return None;
    }
    Some(Path::new(path))
}
