use anyhow::Context;
use std::collections::HashMap;
use std::sync::Mutex;

/// Durable keyed string storage. The history store only needs get/set/delete,
/// so any backend that can hold one JSON blob per key qualifies.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

/// In-memory backend for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("kv mutex poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("kv mutex poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("kv mutex poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Postgres-backed store over a single upsert table.
#[derive(Debug, Clone)]
pub struct PgKvStore {
    pool: sqlx::PgPool,
}

impl PgKvStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl KvStore for PgKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_kv WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("read app_kv failed (key={key})"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO app_kv (key, value, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert app_kv failed (key={key})"))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM app_kv WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete app_kv failed (key={key})"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_and_deletes() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v1".to_string()));

        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".to_string()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        // Deleting a missing key is fine.
        store.delete("k").await.unwrap();
    }
}
