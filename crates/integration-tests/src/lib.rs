//! Shared fixtures for the cross-crate tests: one fully wired catalog over
//! the in-memory adapters.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domains::{
    Actor, ContentKind, LegacyEntry, ManagedRecord, OwnerProfile, RecordStatus, RecordStore, Role,
    ScoringWeights,
};
use services::{
    FeedAggregator, ModerationService, ProjectService, ResolutionService, SimilarityScorer,
};
use storage_adapters::memory::{
    InMemoryLegacyCatalog, InMemoryModerationLog, InMemoryOwnerDirectory, InMemoryRecordStore,
    InMemorySuppressionRegistry,
};
use storage_adapters::RecordingNotifier;
use uuid::Uuid;

pub struct Catalog {
    pub records: Arc<InMemoryRecordStore>,
    pub legacy: Arc<InMemoryLegacyCatalog>,
    pub suppression: Arc<InMemorySuppressionRegistry>,
    pub log: Arc<InMemoryModerationLog>,
    pub owners: Arc<InMemoryOwnerDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub feed: Arc<FeedAggregator>,
    pub resolution: ResolutionService,
    pub similarity: SimilarityScorer,
    pub moderation: ModerationService,
    pub projects: ProjectService,
}

impl Catalog {
    pub fn new(legacy: Vec<LegacyEntry>) -> Self {
        let records = Arc::new(InMemoryRecordStore::new());
        let legacy = Arc::new(InMemoryLegacyCatalog::new(legacy));
        let suppression = Arc::new(InMemorySuppressionRegistry::new());
        let log = Arc::new(InMemoryModerationLog::new());
        let owners = Arc::new(InMemoryOwnerDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let feed = Arc::new(FeedAggregator::new(
            records.clone(),
            legacy.clone(),
            suppression.clone(),
        ));
        let resolution = ResolutionService::new(records.clone(), legacy.clone());
        // Pool far larger than any fixture so completeness holds.
        let similarity = SimilarityScorer::new(feed.clone(), ScoringWeights::default(), 10_000);
        let moderation = ModerationService::new(
            records.clone(),
            legacy.clone(),
            suppression.clone(),
            log.clone(),
            notifier.clone(),
        );
        let projects =
            ProjectService::new(records.clone(), legacy.clone(), owners.clone(), notifier.clone());

        Self {
            records,
            legacy,
            suppression,
            log,
            owners,
            notifier,
            feed,
            resolution,
            similarity,
            moderation,
            projects,
        }
    }

    /// Creates a plain user with a persisted owner profile.
    pub fn register_owner(&self, name: &str) -> Actor {
        let actor = Actor { id: Uuid::now_v7(), name: name.into(), role: Role::User };
        self.owners.upsert(OwnerProfile {
            id: actor.id,
            display_name: name.into(),
            email: Some(format!("{name}@example.com")),
            role: Role::User,
            welcome_sent: false,
        });
        actor
    }

    /// Writes a record straight into the store, bypassing project rules.
    pub async fn seed_record(
        &self,
        owner: &Actor,
        slug: &str,
        status: RecordStatus,
        claimed_legacy_id: Option<&str>,
        published_at: DateTime<Utc>,
    ) -> ManagedRecord {
        let record = ManagedRecord {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            slug: slug.into(),
            status,
            claimed_legacy_id: claimed_legacy_id.map(Into::into),
            title: slug.replace('-', " "),
            description: String::new(),
            kind: ContentKind::Game,
            tags: vec![],
            developer: owner.name.clone(),
            features: vec![],
            screenshots: vec![],
            links: vec![],
            created_at: published_at,
            updated_at: published_at,
            published_at: Some(published_at),
        };
        self.records
            .insert(record.clone())
            .await
            .expect("fixture record must be unique");
        record
    }
}

pub fn admin() -> Actor {
    Actor { id: Uuid::now_v7(), name: "admin".into(), role: Role::Admin }
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

pub fn legacy_entry(id: &str, published_at: DateTime<Utc>) -> LegacyEntry {
    LegacyEntry {
        id: id.into(),
        title: format!("Legacy {id}"),
        description: String::new(),
        kind: ContentKind::Game,
        tags: vec![],
        developer: "unknown".into(),
        features: vec![],
        screenshots: vec![],
        links: vec![],
        published_at,
    }
}
