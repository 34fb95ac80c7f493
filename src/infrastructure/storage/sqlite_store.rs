use crate::application::ports::KeyValueStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};

/// Durable key-value store on the `local_store` table.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: Pool<Sqlite>,
}

impl SqliteKeyValueStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query(r#"SELECT value FROM local_store WHERE store_key = ?1"#)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.try_get::<String, _>("value"))
            .transpose()
            .map_err(AppError::from)
    }

    async fn put(&self, key: &str, value: String) -> Result<(), AppError> {
        let updated_at = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO local_store (store_key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(store_key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&value)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query(r#"DELETE FROM local_store WHERE store_key = ?1"#)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, AppError> {
        // substr avoids LIKE wildcard escaping for keys containing `%` or `_`
        let result = sqlx::query(
            r#"DELETE FROM local_store WHERE substr(store_key, 1, length(?1)) = ?1"#,
        )
        .bind(prefix)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
