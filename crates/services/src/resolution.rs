//! # Resolution Service
//!
//! Maps a public identifier (UUID, slug, or legacy-style URL token) to exactly
//! one content item, always preferring the canonical managed record once a
//! legacy entry has been claimed.

use std::sync::Arc;

use domains::{
    ContentId, ContentItem, DomainError, LegacyCatalog, LegacyEntry, ManagedRecord, RecordStore,
    Result,
};
use tracing::{debug, instrument, warn};

use crate::slug::trailing_token;

/// Hard ceiling on claim redirects followed by a single `resolve` call.
pub const MAX_RESOLUTION_DEPTH: usize = 3;

enum Step {
    Found(ContentItem),
    /// The legacy entry was claimed; continue with the claimer's slug.
    Redirect(String),
    Miss,
}

pub struct ResolutionService {
    records: Arc<dyn RecordStore>,
    legacy: Arc<dyn LegacyCatalog>,
}

impl ResolutionService {
    pub fn new(records: Arc<dyn RecordStore>, legacy: Arc<dyn LegacyCatalog>) -> Self {
        Self { records, legacy }
    }

    /// Resolves `identifier` or returns `NotFound`.
    ///
    /// Redirects are followed iteratively with an explicit depth counter, so a
    /// claim cycle ends in `NotFound` after `MAX_RESOLUTION_DEPTH` hops.
    #[instrument(skip(self))]
    pub async fn resolve(&self, identifier: &str) -> Result<ContentItem> {
        let mut current = identifier.trim().to_string();
        if current.is_empty() {
            return Err(DomainError::NotFound("empty identifier".into()));
        }

        for depth in 0..MAX_RESOLUTION_DEPTH {
            match self.step(&current).await {
                Step::Found(item) => return Ok(item),
                Step::Redirect(slug) => {
                    debug!(depth, from = %current, to = %slug, "following claim redirect");
                    current = slug;
                }
                Step::Miss => {
                    return Err(DomainError::NotFound(format!("no content for '{identifier}'")))
                }
            }
        }

        warn!(identifier, "resolution depth ceiling reached");
        Err(DomainError::NotFound(format!(
            "no content for '{identifier}' within {MAX_RESOLUTION_DEPTH} redirects"
        )))
    }

    async fn step(&self, input: &str) -> Step {
        // Feed items carry raw UUIDs, so accept them directly.
        if let ContentId::Managed(id) = ContentId::classify(input) {
            if let Some(record) = absorb(self.records.find_by_id(id).await, "find_by_id") {
                return Step::Found(ContentItem::from_managed(record));
            }
        }

        // 1. Exact slug.
        if let Some(record) = absorb(self.records.find_by_slug(input).await, "find_by_slug") {
            return Step::Found(ContentItem::from_managed(record));
        }

        // 2. New slug built from an old id: the trailing token names a claimed legacy entry.
        let token = trailing_token(input);
        if let Some(token) = token {
            if let Some(record) = self.claimer_of(token).await {
                return Step::Found(ContentItem::from_managed(record));
            }
        }

        // 3. Direct legacy lookup, whole input first, then the trailing token.
        let Some(entry) = self.legacy_lookup(input, token).await else {
            return Step::Miss;
        };

        // 4. Claimed since? Send the caller to the canonical record.
        match self.claimer_of(&entry.id).await {
            Some(claimer) => Step::Redirect(claimer.slug),
            None => Step::Found(ContentItem::from_legacy(entry)),
        }
    }

    async fn claimer_of(&self, legacy_id: &str) -> Option<ManagedRecord> {
        absorb(
            self.records.find_by_claimed_legacy_id(legacy_id).await,
            "find_by_claimed_legacy_id",
        )
    }

    async fn legacy_lookup(&self, input: &str, token: Option<&str>) -> Option<LegacyEntry> {
        if let Some(entry) = absorb(self.legacy.get(input).await, "legacy.get") {
            return Some(entry);
        }
        match token {
            Some(token) => absorb(self.legacy.get(token).await, "legacy.get"),
            None => None,
        }
    }
}

/// A failed lookup is a miss, not an error: resolution keeps falling back.
fn absorb<T, E: std::fmt::Display>(
    result: std::result::Result<Option<T>, E>,
    lookup: &'static str,
) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            warn!(lookup, error = %e, "lookup failed during resolution, continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        ContentKind, ContentSource, MockLegacyCatalog, MockRecordStore, RecordStatus, StoreError,
    };
    use uuid::Uuid;

    fn record(slug: &str, claimed: Option<&str>) -> ManagedRecord {
        let now = Utc::now();
        ManagedRecord {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            slug: slug.into(),
            status: RecordStatus::Published,
            claimed_legacy_id: claimed.map(Into::into),
            title: slug.into(),
            description: String::new(),
            kind: ContentKind::Game,
            tags: vec![],
            developer: "dev".into(),
            features: vec![],
            screenshots: vec![],
            links: vec![],
            created_at: now,
            updated_at: now,
            published_at: Some(now),
        }
    }

    fn legacy(id: &str) -> LegacyEntry {
        LegacyEntry {
            id: id.into(),
            title: format!("Legacy {id}"),
            description: String::new(),
            kind: ContentKind::Game,
            tags: vec![],
            developer: "old".into(),
            features: vec![],
            screenshots: vec![],
            links: vec![],
            published_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn exact_slug_wins() {
        let mut records = MockRecordStore::new();
        let hit = record("cool-game", None);
        let expected = hit.id.to_string();
        records.expect_find_by_slug().returning(move |_| Ok(Some(hit.clone())));
        let legacy = MockLegacyCatalog::new();

        let service = ResolutionService::new(Arc::new(records), Arc::new(legacy));
        let item = service.resolve("cool-game").await.unwrap();
        assert_eq!(item.identifier, expected);
        assert_eq!(item.source, ContentSource::Managed);
    }

    #[tokio::test]
    async fn trailing_token_finds_claiming_record() {
        let mut records = MockRecordStore::new();
        let claimer = record("cool-game-v2", Some("42"));
        let expected = claimer.id.to_string();
        records.expect_find_by_slug().returning(|_| Ok(None));
        records
            .expect_find_by_claimed_legacy_id()
            .withf(|id| id == "42")
            .returning(move |_| Ok(Some(claimer.clone())));

        let service = ResolutionService::new(Arc::new(records), Arc::new(MockLegacyCatalog::new()));
        let item = service.resolve("cool-game-42").await.unwrap();
        assert_eq!(item.identifier, expected);
    }

    #[tokio::test]
    async fn unclaimed_legacy_token_resolves_to_legacy_entry() {
        let mut records = MockRecordStore::new();
        records.expect_find_by_slug().returning(|_| Ok(None));
        records.expect_find_by_claimed_legacy_id().returning(|_| Ok(None));
        let mut catalog = MockLegacyCatalog::new();
        catalog.expect_get().returning(|id| Ok((id == "42").then(|| legacy("42"))));

        let service = ResolutionService::new(Arc::new(records), Arc::new(catalog));
        let item = service.resolve("cool-game-42").await.unwrap();
        assert_eq!(item.identifier, "42");
        assert_eq!(item.source, ContentSource::Legacy);
    }

    #[tokio::test]
    async fn backend_errors_are_misses() {
        let mut records = MockRecordStore::new();
        records
            .expect_find_by_slug()
            .returning(|_| Err(StoreError::Backend(anyhow::anyhow!("connection reset"))));
        records
            .expect_find_by_claimed_legacy_id()
            .returning(|_| Err(StoreError::Backend(anyhow::anyhow!("connection reset"))));
        let mut catalog = MockLegacyCatalog::new();
        catalog.expect_get().returning(|_| Ok(Some(legacy("7"))));

        let service = ResolutionService::new(Arc::new(records), Arc::new(catalog));
        let item = service.resolve("7").await.unwrap();
        assert_eq!(item.identifier, "7");
    }

    #[tokio::test]
    async fn claim_cycle_terminates_with_not_found() {
        // The store hands back a claimer whose slug never matches exactly,
        // so every hop lands on the legacy entry again.
        let mut records = MockRecordStore::new();
        records.expect_find_by_slug().returning(|_| Ok(None));
        records
            .expect_find_by_claimed_legacy_id()
            .returning(|id| Ok((id == "a").then(|| record("loop-b", Some("a")))));
        let mut catalog = MockLegacyCatalog::new();
        catalog
            .expect_get()
            .times(MAX_RESOLUTION_DEPTH..)
            .returning(|_| Ok(Some(legacy("a"))));

        let service = ResolutionService::new(Arc::new(records), Arc::new(catalog));
        let err = service.resolve("a").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_input_is_not_found() {
        let service = ResolutionService::new(
            Arc::new(MockRecordStore::new()),
            Arc::new(MockLegacyCatalog::new()),
        );
        assert!(matches!(service.resolve("   ").await, Err(DomainError::NotFound(_))));
    }
}
