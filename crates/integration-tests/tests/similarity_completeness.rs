//! `similar_to` returns exactly `min(N, catalog_size - 1)` distinct items.

use std::collections::HashSet;

use domains::{ContentKind, RecordStatus};
use integration_tests::{hours_ago, legacy_entry, Catalog};
use services::{FeedQuery, SimilarityReference};

#[tokio::test]
async fn result_size_is_exact_for_every_limit() {
    let legacy: Vec<_> = (0..7)
        .map(|i| legacy_entry(&format!("L{i}"), hours_ago(i * 30)))
        .collect();
    let catalog = Catalog::new(legacy);
    let owner = catalog.register_owner("studio");
    for i in 0..4 {
        catalog
            .seed_record(&owner, &format!("game-{i}"), RecordStatus::Published, None, hours_ago(i))
            .await;
    }

    let all = catalog
        .feed
        .list_feed(FeedQuery { limit: 1_000, include_archived: false })
        .await
        .unwrap();
    let catalog_size = all.len();
    assert_eq!(catalog_size, 11);

    for reference_item in &all {
        let reference = SimilarityReference::from(reference_item);
        for limit in 0..=catalog_size + 2 {
            let picks = catalog.similarity.similar_to(&reference, limit).await.unwrap();
            assert_eq!(picks.len(), limit.min(catalog_size - 1), "limit {limit}");

            let distinct: HashSet<_> = picks.iter().map(|p| p.identifier.as_str()).collect();
            assert_eq!(distinct.len(), picks.len());
            assert!(!distinct.contains(reference.identifier.as_str()));
        }
    }
}

#[tokio::test]
async fn reference_outside_catalog_can_take_every_item() {
    let catalog =
        Catalog::new(vec![legacy_entry("L1", hours_ago(1)), legacy_entry("L2", hours_ago(2))]);
    let reference = SimilarityReference {
        identifier: "elsewhere".into(),
        kind: ContentKind::App,
        tags: vec![],
        developer: String::new(),
    };
    let picks = catalog.similarity.similar_to(&reference, 5).await.unwrap();
    assert_eq!(picks.len(), 2);
}

#[tokio::test]
async fn closer_items_rank_first() {
    let mut close = legacy_entry("close", hours_ago(24 * 90));
    close.tags = vec!["roguelike".into(), "pixel".into()];
    close.developer = "Moonlit".into();
    let far = legacy_entry("far", hours_ago(1));
    let catalog = Catalog::new(vec![close, far]);

    let reference = SimilarityReference {
        identifier: "ref".into(),
        kind: ContentKind::Game,
        tags: vec!["Roguelike".into(), "Pixel".into()],
        developer: "moonlit".into(),
    };
    let picks = catalog.similarity.similar_to(&reference, 2).await.unwrap();
    assert_eq!(picks[0].identifier, "close");
    assert_eq!(picks[1].identifier, "far");
}
