use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{LegacyCatalog, LegacyEntry, StoreError};
use sqlx::{FromRow, PgPool};

use super::{backend, corrupt};

/// Read-only view over the imported `legacy_items` table.
pub struct PgLegacyCatalog {
    pool: PgPool,
}

impl PgLegacyCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct LegacyRow {
    id: String,
    title: String,
    description: String,
    kind: String,
    tags: Vec<String>,
    developer: String,
    features: Vec<String>,
    screenshots: Vec<String>,
    links: Vec<String>,
    published_at: DateTime<Utc>,
}

impl TryFrom<LegacyRow> for LegacyEntry {
    type Error = StoreError;

    fn try_from(row: LegacyRow) -> Result<Self, Self::Error> {
        Ok(LegacyEntry {
            id: row.id,
            title: row.title,
            description: row.description,
            kind: row.kind.parse().map_err(corrupt)?,
            tags: row.tags,
            developer: row.developer,
            features: row.features,
            screenshots: row.screenshots,
            links: row.links,
            published_at: row.published_at,
        })
    }
}

#[async_trait]
impl LegacyCatalog for PgLegacyCatalog {
    async fn list_recent(&self, limit: usize) -> Result<Vec<LegacyEntry>, StoreError> {
        sqlx::query_as::<_, LegacyRow>(
            "SELECT id, title, description, kind, tags, developer, features, screenshots, links,
                    published_at
             FROM legacy_items
             ORDER BY published_at DESC
             LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?
        .into_iter()
        .map(LegacyEntry::try_from)
        .collect()
    }

    async fn get(&self, id: &str) -> Result<Option<LegacyEntry>, StoreError> {
        sqlx::query_as::<_, LegacyRow>(
            "SELECT id, title, description, kind, tags, developer, features, screenshots, links,
                    published_at
             FROM legacy_items
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(LegacyEntry::try_from)
        .transpose()
    }
}
