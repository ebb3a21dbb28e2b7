//! Key-value repository for database operations.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::entities::KeyValueEntity;
use crate::metrics::QueryTimer;

/// Repository over the kv_store table.
#[derive(Clone)]
pub struct KeyValueRepository {
    pool: SqlitePool,
}

impl KeyValueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the row stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<KeyValueEntity>, sqlx::Error> {
        let timer = QueryTimer::new("kv_get");
        let result = sqlx::query_as::<_, KeyValueEntity>(
            r#"
            SELECT key, value, updated_at
            FROM kv_store
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert or replace the value stored under `key`.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("kv_put");
        let result = sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Cheap round trip used by readiness checks.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
    }
}
