//! # Feed Aggregator
//!
//! Produces the unified catalog: managed records and legacy entries merged,
//! deduplicated, suppression-filtered and ordered by descending recency.
//!
//! The three source reads run concurrently, but nothing is filtered until
//! the suppression snapshot is fully materialized.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use domains::{
    ContentItem, ContentSource, DomainError, LegacyCatalog, LegacyEntry, ManagedRecord,
    RecordStatus, RecordStore, Result, StoreError, SuppressionLookup, SuppressionRegistry,
};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    pub limit: usize,
    #[serde(default)]
    pub include_archived: bool,
}

/// Feed items plus the sources that had to be skipped to produce them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedOutcome {
    pub items: Vec<ContentItem>,
    pub degraded: Vec<ContentSource>,
}

impl FeedOutcome {
    pub fn is_partial(&self) -> bool {
        !self.degraded.is_empty()
    }
}

pub struct FeedAggregator {
    records: Arc<dyn RecordStore>,
    legacy: Arc<dyn LegacyCatalog>,
    suppression: Arc<dyn SuppressionRegistry>,
    legacy_timeout: Option<Duration>,
}

impl FeedAggregator {
    pub fn new(
        records: Arc<dyn RecordStore>,
        legacy: Arc<dyn LegacyCatalog>,
        suppression: Arc<dyn SuppressionRegistry>,
    ) -> Self {
        Self { records, legacy, suppression, legacy_timeout: None }
    }

    /// Bounds the legacy catalog read; a timeout counts as a source failure.
    pub fn with_legacy_timeout(mut self, timeout: Duration) -> Self {
        self.legacy_timeout = Some(timeout);
        self
    }

    pub async fn list_feed(&self, query: FeedQuery) -> Result<Vec<ContentItem>> {
        Ok(self.collect(query).await?.items)
    }

    #[instrument(
        skip(self),
        fields(limit = query.limit, include_archived = query.include_archived)
    )]
    pub async fn collect(&self, query: FeedQuery) -> Result<FeedOutcome> {
        if query.limit == 0 {
            return Ok(FeedOutcome::default());
        }

        let statuses = visible_statuses(query.include_archived);
        let (suppressed, managed, legacy) = tokio::join!(
            self.suppression.snapshot(),
            self.records.list_recent(statuses.clone(), query.limit),
            self.fetch_legacy(query.limit),
        );

        // Without a snapshot nothing can be shown safely.
        let suppressed = suppressed.map_err(|e| {
            error!(error = %e, "suppression registry unavailable, refusing to build feed");
            DomainError::Unavailable("suppression registry unavailable".into())
        })?;

        let mut degraded = Vec::new();
        let managed = match managed {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "managed record fetch failed, serving legacy only");
                degraded.push(ContentSource::Managed);
                Vec::new()
            }
        };
        let legacy = match legacy {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "legacy catalog fetch failed, serving managed only");
                degraded.push(ContentSource::Legacy);
                Vec::new()
            }
        };

        if degraded.len() == 2 {
            error!("every content source failed");
            return Err(DomainError::Unavailable("no content source available".into()));
        }

        let items = merge_sources(managed, legacy, &statuses, &suppressed, query.limit);
        Ok(FeedOutcome { items, degraded })
    }

    async fn fetch_legacy(
        &self,
        limit: usize,
    ) -> std::result::Result<Vec<LegacyEntry>, StoreError> {
        match self.legacy_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.legacy.list_recent(limit))
                .await
                .unwrap_or_else(|_| {
                    Err(StoreError::Backend(anyhow::anyhow!(
                        "legacy catalog timed out after {timeout:?}"
                    )))
                }),
            None => self.legacy.list_recent(limit).await,
        }
    }
}

/// Statuses a managed record may have to appear in the feed.
pub fn visible_statuses(include_archived: bool) -> Vec<RecordStatus> {
    if include_archived {
        vec![RecordStatus::Published, RecordStatus::Archived]
    } else {
        vec![RecordStatus::Published]
    }
}

/// Merges both sources into one recency-ordered list in which every
/// identifier appears exactly once.
///
/// Legacy entries claimed by a surviving managed record are dropped, as is
/// anything the suppression snapshot contains.
pub fn merge_sources(
    managed: Vec<ManagedRecord>,
    legacy: Vec<LegacyEntry>,
    statuses: &[RecordStatus],
    suppressed: &dyn SuppressionLookup,
    limit: usize,
) -> Vec<ContentItem> {
    let managed: Vec<ManagedRecord> = managed
        .into_iter()
        .filter(|r| statuses.contains(&r.status))
        .filter(|r| !suppressed.contains(&r.id.to_string()))
        .collect();

    let claimed: HashSet<String> = managed
        .iter()
        .filter_map(|r| r.claimed_legacy_id.clone())
        .collect();

    let legacy = legacy
        .into_iter()
        .filter(|e| !claimed.contains(&e.id))
        .filter(|e| !suppressed.contains(&e.id));

    let mut items: Vec<ContentItem> = managed
        .into_iter()
        .map(ContentItem::from_managed)
        .chain(legacy.map(ContentItem::from_legacy))
        .collect();

    // Stable, so equal timestamps keep managed-before-legacy order.
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut seen = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.identifier.clone()));
    items.truncate(limit);
    items
}
