use async_trait::async_trait;
use domains::{OwnerDirectory, OwnerProfile, Role, StoreError};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{backend, corrupt};

pub struct PgOwnerDirectory {
    pool: PgPool,
}

impl PgOwnerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OwnerRow {
    id: Uuid,
    display_name: String,
    email: Option<String>,
    role: String,
    welcome_sent: bool,
}

impl TryFrom<OwnerRow> for OwnerProfile {
    type Error = StoreError;

    fn try_from(row: OwnerRow) -> Result<Self, Self::Error> {
        Ok(OwnerProfile {
            id: row.id,
            display_name: row.display_name,
            email: row.email,
            role: row.role.parse().map_err(corrupt)?,
            welcome_sent: row.welcome_sent,
        })
    }
}

#[async_trait]
impl OwnerDirectory for PgOwnerDirectory {
    async fn get(&self, owner_id: Uuid) -> Result<Option<OwnerProfile>, StoreError> {
        sqlx::query_as::<_, OwnerRow>(
            "SELECT id, display_name, email, role, welcome_sent FROM owner_profiles WHERE id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .map(OwnerProfile::try_from)
        .transpose()
    }

    async fn register(&self, profile: OwnerProfile) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO owner_profiles (id, display_name, email, role, welcome_sent) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (id) DO NOTHING",
        )
        .bind(profile.id)
        .bind(&profile.display_name)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .bind(profile.welcome_sent)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn promote(&self, owner_id: Uuid, role: Role) -> Result<bool, StoreError> {
        let Some(current) = self.get(owner_id).await? else {
            return Err(StoreError::NotFound(format!("owner '{owner_id}'")));
        };
        if current.role >= role {
            return Ok(false);
        }
        // Guarded by the current role so a concurrent promotion never lowers it.
        let result = sqlx::query("UPDATE owner_profiles SET role = $2 WHERE id = $1 AND role = $3")
            .bind(owner_id)
            .bind(role.as_str())
            .bind(current.role.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_welcome_sent(&self, owner_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE owner_profiles SET welcome_sent = TRUE WHERE id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("owner '{owner_id}'")));
        }
        Ok(())
    }
}
