//! Adapter selection and service construction.

use std::sync::Arc;

use anyhow::{Context, Result};
use api_adapters::{ApiLimits, AppState, CatalogMetrics};
use auth_adapters::JwtVerifier;
use configs::Settings;
use domains::{LegacyCatalog, ModerationLog, OwnerDirectory, RecordStore, SuppressionRegistry};
use secrecy::ExposeSecret;
use services::{
    FeedAggregator, ModerationService, ProjectService, ResolutionService, SimilarityScorer,
};
use storage_adapters::memory::{
    InMemoryLegacyCatalog, InMemoryModerationLog, InMemoryOwnerDirectory, InMemoryRecordStore,
    InMemorySuppressionRegistry,
};
use storage_adapters::{CachedSuppressionRegistry, LogNotifier};
use tracing::{info, warn};

struct Ports {
    records: Arc<dyn RecordStore>,
    legacy: Arc<dyn LegacyCatalog>,
    suppression: Arc<dyn SuppressionRegistry>,
    log: Arc<dyn ModerationLog>,
    owners: Arc<dyn OwnerDirectory>,
}

pub async fn build_state(settings: &Settings) -> Result<AppState> {
    let ports = match settings.database.url.as_ref() {
        Some(url) => postgres_ports(url.expose_secret(), settings.database.max_connections).await?,
        None => memory_ports(settings)?,
    };

    let suppression: Arc<dyn SuppressionRegistry> = match settings.suppression.cache_ttl() {
        Some(ttl) => Arc::new(CachedSuppressionRegistry::new(ports.suppression, ttl)),
        None => ports.suppression,
    };

    let notifier = Arc::new(LogNotifier);
    let mut feed =
        FeedAggregator::new(ports.records.clone(), ports.legacy.clone(), suppression.clone());
    if let Some(timeout) = settings.feed.legacy_timeout() {
        feed = feed.with_legacy_timeout(timeout);
    }
    let feed = Arc::new(feed);

    let similarity = SimilarityScorer::new(
        feed.clone(),
        settings.similarity.weights,
        settings.similarity.pool_size,
    );
    let moderation = ModerationService::new(
        ports.records.clone(),
        ports.legacy.clone(),
        suppression,
        ports.log,
        notifier.clone(),
    );
    let projects =
        ProjectService::new(ports.records.clone(), ports.legacy.clone(), ports.owners, notifier);

    let secret = settings
        .auth
        .jwt_secret
        .as_ref()
        .context("auth.jwt_secret must be set (CATALOG__AUTH__JWT_SECRET)")?;
    let verifier = JwtVerifier::new(secret.expose_secret(), settings.auth.issuer.clone());

    Ok(AppState {
        resolution: Arc::new(ResolutionService::new(ports.records, ports.legacy)),
        feed,
        similarity: Arc::new(similarity),
        moderation: Arc::new(moderation),
        projects: Arc::new(projects),
        verifier: Arc::new(verifier),
        metrics: Arc::new(CatalogMetrics::new()),
        limits: ApiLimits {
            feed_default: settings.feed.default_limit,
            feed_max: settings.feed.max_limit,
            similar_default: settings.similarity.default_limit,
            ..ApiLimits::default()
        },
    })
}

fn memory_ports(settings: &Settings) -> Result<Ports> {
    warn!("no database configured, using in-memory storage");
    let legacy = match settings.legacy.seed_path.as_ref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read legacy seed {}", path.display()))?;
            let catalog = InMemoryLegacyCatalog::from_json(&raw)
                .with_context(|| format!("invalid legacy seed {}", path.display()))?;
            info!(entries = catalog.len(), "legacy catalog seeded");
            catalog
        }
        None => InMemoryLegacyCatalog::default(),
    };

    Ok(Ports {
        records: Arc::new(InMemoryRecordStore::new()),
        legacy: Arc::new(legacy),
        suppression: Arc::new(InMemorySuppressionRegistry::new()),
        log: Arc::new(InMemoryModerationLog::new()),
        owners: Arc::new(InMemoryOwnerDirectory::new()),
    })
}

#[cfg(feature = "db-postgres")]
async fn postgres_ports(url: &str, max_connections: u32) -> Result<Ports> {
    use storage_adapters::postgres::{
        connect, PgLegacyCatalog, PgModerationLog, PgOwnerDirectory, PgRecordStore,
        PgSuppressionRegistry,
    };

    let pool = connect(url, max_connections).await.context("failed to connect to database")?;
    Ok(Ports {
        records: Arc::new(PgRecordStore::new(pool.clone())),
        legacy: Arc::new(PgLegacyCatalog::new(pool.clone())),
        suppression: Arc::new(PgSuppressionRegistry::new(pool.clone())),
        log: Arc::new(PgModerationLog::new(pool.clone())),
        owners: Arc::new(PgOwnerDirectory::new(pool)),
    })
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres_ports(_url: &str, _max_connections: u32) -> Result<Ports> {
    anyhow::bail!("database.url is set but this build has no db-postgres feature")
}
