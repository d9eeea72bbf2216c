//! SQLite-backed [`KvStore`] implementation.
//!
//! Each key is one row of the `kv` table; `set` upserts, `remove` deletes.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use ai_visibility_core::store::KvStore;

use crate::config::Config;
use crate::{db, migrate};

pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, creating the schema if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::ensure_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn test_config(dir: &std::path::Path) -> Config {
        parse_config(&format!(
            "[db]\npath = \"{}\"\n",
            dir.join("data/aiv.sqlite").display()
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_kv_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let kv = SqliteKv::open(&test_config(tmp.path())).await.unwrap();

        assert_eq!(kv.get("history").await.unwrap(), None);
        kv.set("history", "[]").await.unwrap();
        kv.set("history", "[1]").await.unwrap();
        assert_eq!(kv.get("history").await.unwrap().as_deref(), Some("[1]"));

        kv.remove("history").await.unwrap();
        assert_eq!(kv.get("history").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = test_config(tmp.path());
        {
            let kv = SqliteKv::open(&cfg).await.unwrap();
            kv.set("k", "persisted").await.unwrap();
            kv.pool().close().await;
        }
        let kv = SqliteKv::open(&cfg).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("persisted"));
    }
}
