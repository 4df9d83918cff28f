//! # PostgreSQL adapters
//!
//! This module implements the data mapping between the relational schema in
//! `migrations/` and the domain models. Queries are plain `sqlx::query_as`
//! calls so the crate builds without a live database.

mod legacy;
mod moderation_log;
mod owners;
mod records;
mod suppression;

pub use legacy::PgLegacyCatalog;
pub use moderation_log::PgModerationLog;
pub use owners::PgOwnerDirectory;
pub use records::PgRecordStore;
pub use suppression::PgSuppressionRegistry;

use domains::{DomainError, StoreError};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Opens a pool and applies pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!(max_connections, "database connected and migrated");
    Ok(pool)
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.into())
}

/// A column held a value the domain enum does not know.
fn corrupt(err: DomainError) -> StoreError {
    StoreError::Backend(anyhow::Error::new(err))
}
