use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{ActionMetadata, ActionType, ModerationAction, ModerationLog, StoreError};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{backend, corrupt};

const COLUMNS: &str = "id, target_identifier, target_kind, action_type, reason, actor_id, \
     actor_name, target_owner_id, created_at, acknowledged, metadata";

/// Append-only log over `moderation_actions`. Rows are never updated except
/// for the `acknowledged` flag.
pub struct PgModerationLog {
    pool: PgPool,
}

impl PgModerationLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(
        &self,
        sql: &str,
        filter: LogFilter<'_>,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError> {
        let query = sqlx::query_as::<_, ActionRow>(sql);
        let query = match filter {
            LogFilter::Target(identifier) => query.bind(identifier),
            LogFilter::Type(action_type) => query.bind(action_type.as_str()),
            LogFilter::Owner(owner_id) => query.bind(owner_id),
        };
        query
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(ModerationAction::try_from)
            .collect()
    }
}

enum LogFilter<'a> {
    Target(&'a str),
    Type(ActionType),
    Owner(Uuid),
}

#[derive(FromRow)]
struct ActionRow {
    id: Uuid,
    target_identifier: String,
    target_kind: String,
    action_type: String,
    reason: String,
    actor_id: Uuid,
    actor_name: String,
    target_owner_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    acknowledged: bool,
    metadata: Json<ActionMetadata>,
}

impl TryFrom<ActionRow> for ModerationAction {
    type Error = StoreError;

    fn try_from(row: ActionRow) -> Result<Self, Self::Error> {
        Ok(ModerationAction {
            id: row.id,
            target_identifier: row.target_identifier,
            target_kind: row.target_kind.parse().map_err(corrupt)?,
            action_type: row.action_type.parse().map_err(corrupt)?,
            reason: row.reason,
            actor_id: row.actor_id,
            actor_name: row.actor_name,
            target_owner_id: row.target_owner_id,
            created_at: row.created_at,
            acknowledged: row.acknowledged,
            metadata: row.metadata.0,
        })
    }
}

#[async_trait]
impl ModerationLog for PgModerationLog {
    async fn append(&self, action: ModerationAction) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO moderation_actions
                (id, target_identifier, target_kind, action_type, reason, actor_id, actor_name,
                 target_owner_id, created_at, acknowledged, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(action.id)
        .bind(&action.target_identifier)
        .bind(action.target_kind.as_str())
        .bind(action.action_type.as_str())
        .bind(&action.reason)
        .bind(action.actor_id)
        .bind(&action.actor_name)
        .bind(action.target_owner_id)
        .bind(action.created_at)
        .bind(action.acknowledged)
        .bind(Json(&action.metadata))
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ModerationAction>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM moderation_actions WHERE id = $1");
        sqlx::query_as::<_, ActionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(ModerationAction::try_from)
            .transpose()
    }

    async fn acknowledge(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE moderation_actions SET acknowledged = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_target(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM moderation_actions
             WHERE target_identifier = $1
             ORDER BY created_at DESC
             LIMIT $2"
        );
        self.fetch(&sql, LogFilter::Target(identifier), limit).await
    }

    async fn list_unacknowledged(
        &self,
        action_type: ActionType,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM moderation_actions
             WHERE action_type = $1 AND acknowledged = FALSE
             ORDER BY created_at DESC
             LIMIT $2"
        );
        self.fetch(&sql, LogFilter::Type(action_type), limit).await
    }

    async fn list_unacknowledged_for_owner(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM moderation_actions
             WHERE target_owner_id = $1 AND acknowledged = FALSE
             ORDER BY created_at DESC
             LIMIT $2"
        );
        self.fetch(&sql, LogFilter::Owner(owner_id), limit).await
    }
}
