use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{ManagedRecord, RecordStatus, RecordStore, StoreError};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{backend, corrupt};

const SLUG_CONSTRAINT: &str = "managed_records_slug_key";
const CLAIM_CONSTRAINT: &str = "managed_records_claimed_legacy_id_key";

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RecordRow {
    id: Uuid,
    owner_id: Uuid,
    slug: String,
    status: String,
    claimed_legacy_id: Option<String>,
    title: String,
    description: String,
    kind: String,
    tags: Vec<String>,
    developer: String,
    features: Vec<String>,
    screenshots: Vec<String>,
    links: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<RecordRow> for ManagedRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(ManagedRecord {
            id: row.id,
            owner_id: row.owner_id,
            slug: row.slug,
            status: row.status.parse().map_err(corrupt)?,
            claimed_legacy_id: row.claimed_legacy_id,
            title: row.title,
            description: row.description,
            kind: row.kind.parse().map_err(corrupt)?,
            tags: row.tags,
            developer: row.developer,
            features: row.features,
            screenshots: row.screenshots,
            links: row.links,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        })
    }
}

/// Maps unique violations onto the errors services know how to recover from.
fn write_error(err: sqlx::Error, record: &ManagedRecord) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(SLUG_CONSTRAINT) => return StoreError::DuplicateSlug(record.slug.clone()),
                Some(CLAIM_CONSTRAINT) => {
                    return StoreError::DuplicateClaim(
                        record.claimed_legacy_id.clone().unwrap_or_default(),
                    )
                }
                _ => {}
            }
        }
    }
    backend(err)
}

const COLUMNS: &str = "id, owner_id, slug, status, claimed_legacy_id, title, description, kind, \
     tags, developer, features, screenshots, links, created_at, updated_at, published_at";

impl PgRecordStore {
    async fn find_one(
        &self,
        sql: &str,
        bind: BindValue<'_>,
    ) -> Result<Option<ManagedRecord>, StoreError> {
        let query = sqlx::query_as::<_, RecordRow>(sql);
        let query = match bind {
            BindValue::Id(id) => query.bind(id),
            BindValue::Text(text) => query.bind(text),
        };
        query
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(ManagedRecord::try_from)
            .transpose()
    }
}

enum BindValue<'a> {
    Id(Uuid),
    Text(&'a str),
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ManagedRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM managed_records WHERE id = $1");
        self.find_one(&sql, BindValue::Id(id)).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ManagedRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM managed_records WHERE slug = $1");
        self.find_one(&sql, BindValue::Text(slug)).await
    }

    async fn find_by_claimed_legacy_id(
        &self,
        legacy_id: &str,
    ) -> Result<Option<ManagedRecord>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM managed_records WHERE claimed_legacy_id = $1");
        self.find_one(&sql, BindValue::Text(legacy_id)).await
    }

    async fn list_recent(
        &self,
        statuses: Vec<RecordStatus>,
        limit: usize,
    ) -> Result<Vec<ManagedRecord>, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            "SELECT {COLUMNS} FROM managed_records
             WHERE status = ANY($1)
             ORDER BY COALESCE(published_at, created_at) DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, RecordRow>(&sql)
            .bind(statuses)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(ManagedRecord::try_from)
            .collect()
    }

    async fn insert(&self, record: ManagedRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO managed_records
                (id, owner_id, slug, status, claimed_legacy_id, title, description, kind,
                 tags, developer, features, screenshots, links, created_at, updated_at, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.slug)
        .bind(record.status.as_str())
        .bind(&record.claimed_legacy_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.kind.as_str())
        .bind(&record.tags)
        .bind(&record.developer)
        .bind(&record.features)
        .bind(&record.screenshots)
        .bind(&record.links)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.published_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &record))?;
        Ok(())
    }

    async fn update(&self, record: ManagedRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE managed_records
             SET claimed_legacy_id = $2, title = $3, description = $4, kind = $5, tags = $6,
                 developer = $7, features = $8, screenshots = $9, links = $10, updated_at = $11
             WHERE id = $1",
        )
        .bind(record.id)
        .bind(&record.claimed_legacy_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.kind.as_str())
        .bind(&record.tags)
        .bind(&record.developer)
        .bind(&record.features)
        .bind(&record.screenshots)
        .bind(&record.links)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &record))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("managed record '{}'", record.id)));
        }
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> Result<ManagedRecord, StoreError> {
        // Single statement: concurrent moderation calls resolve last-write-wins.
        let sql = format!(
            "UPDATE managed_records
             SET status = $2,
                 updated_at = NOW(),
                 published_at = CASE
                     WHEN $2 = 'published' AND published_at IS NULL THEN NOW()
                     ELSE published_at
                 END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::NotFound(format!("managed record '{id}'")))?
            .try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM managed_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}
