//! Key/value access to the local items table.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::SyncError;

/// String key/value store shared by everything running on this device.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the value stored under `key`, if any.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, SyncError> {
        let row = sqlx::query("SELECT value FROM local_items WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Store `value` under `key`, replacing any previous value.
    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), SyncError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO local_items (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_set_replace() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("local.sqlite"))
            .await
            .unwrap();
        let store = LocalStore::new(pool);

        assert_eq!(store.get_item("theme").await.unwrap(), None);

        store.set_item("theme", "dark").await.unwrap();
        assert_eq!(store.get_item("theme").await.unwrap().as_deref(), Some("dark"));

        store.set_item("theme", "light").await.unwrap();
        assert_eq!(store.get_item("theme").await.unwrap().as_deref(), Some("light"));
    }
}
