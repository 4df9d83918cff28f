//! Identifier resolution end to end, plus termination on inconsistent claims.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    ContentKind, ContentSource, DomainError, ManagedRecord, MockLegacyCatalog, MockRecordStore,
    RecordStatus,
};
use integration_tests::{hours_ago, legacy_entry, Catalog};
use services::ResolutionService;
use uuid::Uuid;

#[tokio::test]
async fn trailing_token_resolves_unclaimed_legacy_entry() {
    let catalog = Catalog::new(vec![legacy_entry("42", hours_ago(10))]);
    let item = catalog.resolution.resolve("cool-game-42").await.unwrap();
    assert_eq!(item.identifier, "42");
    assert_eq!(item.source, ContentSource::Legacy);
}

#[tokio::test]
async fn claimed_legacy_entry_redirects_to_claimer() {
    let catalog = Catalog::new(vec![legacy_entry("42", hours_ago(10))]);
    let owner = catalog.register_owner("studio");
    let record = catalog
        .seed_record(&owner, "cool-game", RecordStatus::Published, Some("42"), hours_ago(1))
        .await;

    let record_id = record.id.to_string();
    for input in ["42", "cool-game-42", "cool-game", record_id.as_str()] {
        let item = catalog.resolution.resolve(input).await.unwrap();
        assert_eq!(item.identifier, record_id, "input {input}");
    }
}

#[tokio::test]
async fn banned_records_still_resolve() {
    let catalog = Catalog::new(vec![]);
    let owner = catalog.register_owner("studio");
    let record = catalog
        .seed_record(&owner, "gone-bad", RecordStatus::Banned, None, hours_ago(1))
        .await;
    let item = catalog.resolution.resolve("gone-bad").await.unwrap();
    assert_eq!(item.identifier, record.id.to_string());
    assert_eq!(item.status, Some(RecordStatus::Banned));
}

#[tokio::test]
async fn unknown_input_is_not_found() {
    let catalog = Catalog::new(vec![legacy_entry("42", hours_ago(10))]);
    for input in ["", "   ", "nothing-here", "-", "a-b-c-"] {
        let err = catalog.resolution.resolve(input).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)), "input {input:?}");
    }
}

fn claimer(slug: &str, claims: &str) -> ManagedRecord {
    let now = Utc::now();
    ManagedRecord {
        id: Uuid::now_v7(),
        owner_id: Uuid::now_v7(),
        slug: slug.into(),
        status: RecordStatus::Published,
        claimed_legacy_id: Some(claims.into()),
        title: slug.into(),
        description: String::new(),
        kind: ContentKind::Game,
        tags: vec![],
        developer: String::new(),
        features: vec![],
        screenshots: vec![],
        links: vec![],
        created_at: now,
        updated_at: now,
        published_at: Some(now),
    }
}

#[tokio::test]
async fn claim_cycle_terminates() {
    // A store whose slug index disagrees with its claim index: every slug
    // lookup misses and every legacy entry is claimed by a record whose slug
    // names yet another claimed legacy entry.
    let mut records = MockRecordStore::new();
    records.expect_find_by_slug().returning(|_| Ok(None));
    records
        .expect_find_by_claimed_legacy_id()
        .returning(|id| Ok(Some(claimer(&format!("x{id}"), id))));
    records.expect_find_by_id().returning(|_| Ok(None));
    let mut legacy = MockLegacyCatalog::new();
    legacy
        .expect_get()
        .returning(|id| Ok(Some(legacy_entry(id, hours_ago(1)))));

    let service = ResolutionService::new(Arc::new(records), Arc::new(legacy));
    let result = tokio::time::timeout(std::time::Duration::from_secs(1), service.resolve("b"))
        .await
        .expect("resolution must terminate");
    assert!(matches!(result, Err(DomainError::NotFound(_))));
}
