//! # Similarity Scorer
//!
//! Ranks feed items against a reference item for "related content" surfaces.
//! Scores are additive (see [`ScoringWeights`]); ties keep the aggregator's
//! recency order. When too few items score, the result is backfilled with
//! fresh picks so callers still get `limit` items whenever the catalog has them.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domains::{ContentItem, ContentKind, Result, ScoringWeights};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::feed::{FeedAggregator, FeedQuery};

/// What the scorer needs to know about the item recommendations are for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityReference {
    pub identifier: String,
    pub kind: ContentKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub developer: String,
}

impl From<&ContentItem> for SimilarityReference {
    fn from(item: &ContentItem) -> Self {
        Self {
            identifier: item.identifier.clone(),
            kind: item.kind,
            tags: item.tags.clone(),
            developer: item.developer.clone(),
        }
    }
}

pub struct SimilarityScorer {
    feed: Arc<FeedAggregator>,
    weights: ScoringWeights,
    /// How many feed items are considered as candidates
    pool_size: usize,
}

impl SimilarityScorer {
    pub fn new(feed: Arc<FeedAggregator>, weights: ScoringWeights, pool_size: usize) -> Self {
        Self { feed, weights, pool_size }
    }

    #[instrument(skip(self, reference), fields(reference = %reference.identifier))]
    pub async fn similar_to(
        &self,
        reference: &SimilarityReference,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let pool = self
            .feed
            .list_feed(FeedQuery { limit: self.pool_size, include_archived: false })
            .await?;
        let picks = rank(pool, reference, limit, &self.weights, Utc::now());
        debug!(count = picks.len(), "ranked related content");
        Ok(picks)
    }
}

/// Additive similarity of `candidate` to `reference`; higher is closer.
pub fn score(
    candidate: &ContentItem,
    reference: &SimilarityReference,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> i32 {
    let mut total = 0;

    if candidate.kind == reference.kind {
        total += weights.same_kind;
    }

    let reference_tags: HashSet<String> = reference.tags.iter().map(|t| normalize(t)).collect();
    let candidate_tags: HashSet<String> = candidate.tags.iter().map(|t| normalize(t)).collect();
    let shared = candidate_tags.intersection(&reference_tags).count() as i32;
    total += shared * weights.shared_tag;

    if is_known_developer(&candidate.developer)
        && is_known_developer(&reference.developer)
        && normalize(&candidate.developer) == normalize(&reference.developer)
    {
        total += weights.same_developer;
    }

    if candidate.is_managed() {
        total += weights.managed_source;
    }

    if candidate.age_at(now) < Duration::days(weights.recent_window_days) {
        total += weights.recent;
    }

    if candidate.features.len() > weights.feature_threshold {
        total += weights.rich_features;
    }

    if candidate.screenshots.len() > weights.screenshot_threshold {
        total += weights.rich_screenshots;
    }

    total
}

/// Ranks `pool` (already in recency order) and backfills up to `limit`.
///
/// The reference itself is never returned and no identifier repeats.
pub fn rank(
    pool: Vec<ContentItem>,
    reference: &SimilarityReference,
    limit: usize,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> Vec<ContentItem> {
    let candidates: Vec<ContentItem> = pool
        .into_iter()
        .filter(|item| item.identifier != reference.identifier)
        .collect();

    let mut scored: Vec<(i32, &ContentItem)> = candidates
        .iter()
        .map(|item| (score(item, reference, weights, now), item))
        .filter(|(score, _)| *score > 0)
        .collect();
    // sort_by is stable: equal scores keep recency order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut selected: Vec<ContentItem> = Vec::with_capacity(limit);
    let mut taken: HashSet<&str> = HashSet::with_capacity(limit);

    for (_, item) in scored {
        if selected.len() == limit {
            break;
        }
        if taken.insert(item.identifier.as_str()) {
            selected.push(item.clone());
        }
    }

    // Fresh picks: managed by recency, then legacy by recency.
    let fresh = candidates
        .iter()
        .filter(|item| item.is_managed())
        .chain(candidates.iter().filter(|item| !item.is_managed()));
    for item in fresh {
        if selected.len() == limit {
            break;
        }
        if taken.insert(item.identifier.as_str()) {
            selected.push(item.clone());
        }
    }

    selected
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn is_known_developer(developer: &str) -> bool {
    let developer = developer.trim();
    !developer.is_empty() && !developer.eq_ignore_ascii_case("unknown")
}
