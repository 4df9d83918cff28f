use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{StoreError, SuppressionEntry, SuppressionRegistry, SuppressionSet};
use sqlx::{FromRow, PgPool};

use super::backend;

pub struct PgSuppressionRegistry {
    pool: PgPool,
}

impl PgSuppressionRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SuppressionRow {
    identifier: String,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<SuppressionRow> for SuppressionEntry {
    fn from(row: SuppressionRow) -> Self {
        SuppressionEntry {
            identifier: row.identifier,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SuppressionRegistry for PgSuppressionRegistry {
    async fn snapshot(&self) -> Result<SuppressionSet, StoreError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT identifier FROM suppressed_content")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(SuppressionSet::new(ids))
    }

    async fn get(&self, identifier: &str) -> Result<Option<SuppressionEntry>, StoreError> {
        let row = sqlx::query_as::<_, SuppressionRow>(
            "SELECT identifier, reason, created_at FROM suppressed_content WHERE identifier = $1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(Into::into))
    }

    async fn insert(&self, entry: SuppressionEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO suppressed_content (identifier, reason, created_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (identifier) DO UPDATE SET reason = EXCLUDED.reason",
        )
        .bind(&entry.identifier)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn remove(&self, identifier: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM suppressed_content WHERE identifier = $1")
            .bind(identifier)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}
