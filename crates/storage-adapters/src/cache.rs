//! # Suppression cache
//!
//! The suppression registry is small and read on every feed request, so its
//! snapshot is cached for a short TTL. Writes through this wrapper drop the
//! cached copy immediately. When the backing registry fails, the last good
//! snapshot is served instead of an error.
//!
//! Every write bumps a generation counter. A refresh that started before a
//! write is returned to its caller but never cached as fresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use domains::{StoreError, SuppressionEntry, SuppressionRegistry, SuppressionSet};
use tokio::sync::RwLock;
use tracing::{debug, warn};

struct CachedSnapshot {
    set: SuppressionSet,
    fetched_at: Instant,
    expired: bool,
}

impl CachedSnapshot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.expired && self.fetched_at.elapsed() < ttl
    }
}

pub struct CachedSuppressionRegistry {
    inner: Arc<dyn SuppressionRegistry>,
    ttl: Duration,
    cached: RwLock<Option<CachedSnapshot>>,
    generation: AtomicU64,
}

impl CachedSuppressionRegistry {
    pub fn new(inner: Arc<dyn SuppressionRegistry>, ttl: Duration) -> Self {
        Self { inner, ttl, cached: RwLock::new(None), generation: AtomicU64::new(0) }
    }

    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        // Keep the stale set around for stale-on-error, just mark it expired.
        if let Some(snapshot) = cached.as_mut() {
            snapshot.expired = true;
        }
    }
}

#[async_trait]
impl SuppressionRegistry for CachedSuppressionRegistry {
    async fn snapshot(&self) -> Result<SuppressionSet, StoreError> {
        if let Some(snapshot) = self.cached.read().await.as_ref() {
            if snapshot.is_fresh(self.ttl) {
                return Ok(snapshot.set.clone());
            }
        }

        let started_at = self.generation.load(Ordering::Acquire);
        match self.inner.snapshot().await {
            Ok(set) => {
                let mut cached = self.cached.write().await;
                let overtaken = self.generation.load(Ordering::Acquire) != started_at;
                if overtaken {
                    debug!("suppression changed during refresh, not caching as fresh");
                } else {
                    debug!(entries = set.len(), "suppression snapshot refreshed");
                }
                *cached = Some(CachedSnapshot {
                    set: set.clone(),
                    fetched_at: Instant::now(),
                    expired: overtaken,
                });
                Ok(set)
            }
            Err(e) => match self.cached.read().await.as_ref() {
                Some(stale) => {
                    warn!(error = %e, "suppression registry unavailable, serving stale snapshot");
                    Ok(stale.set.clone())
                }
                None => Err(e),
            },
        }
    }

    async fn get(&self, identifier: &str) -> Result<Option<SuppressionEntry>, StoreError> {
        self.inner.get(identifier).await
    }

    async fn insert(&self, entry: SuppressionEntry) -> Result<(), StoreError> {
        self.inner.insert(entry).await?;
        self.invalidate().await;
        Ok(())
    }

    async fn remove(&self, identifier: &str) -> Result<bool, StoreError> {
        let removed = self.inner.remove(identifier).await?;
        self.invalidate().await;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySuppressionRegistry;
    use chrono::Utc;
    use domains::{MockSuppressionRegistry, SuppressionLookup};

    /// Captures its snapshot first, then takes `delay` to hand it back.
    struct SlowRegistry {
        inner: InMemorySuppressionRegistry,
        delay: Duration,
    }

    #[async_trait]
    impl SuppressionRegistry for SlowRegistry {
        async fn snapshot(&self) -> Result<SuppressionSet, StoreError> {
            let set = self.inner.snapshot().await?;
            tokio::time::sleep(self.delay).await;
            Ok(set)
        }

        async fn get(&self, identifier: &str) -> Result<Option<SuppressionEntry>, StoreError> {
            self.inner.get(identifier).await
        }

        async fn insert(&self, entry: SuppressionEntry) -> Result<(), StoreError> {
            self.inner.insert(entry).await
        }

        async fn remove(&self, identifier: &str) -> Result<bool, StoreError> {
            self.inner.remove(identifier).await
        }
    }

    fn entry(id: &str) -> SuppressionEntry {
        SuppressionEntry { identifier: id.into(), reason: "spam".into(), created_at: Utc::now() }
    }

    #[tokio::test]
    async fn own_writes_are_visible_immediately() {
        let cache = CachedSuppressionRegistry::new(
            Arc::new(InMemorySuppressionRegistry::new()),
            Duration::from_secs(300),
        );
        assert!(cache.snapshot().await.unwrap().is_empty());

        cache.insert(entry("42")).await.unwrap();
        assert!(cache.snapshot().await.unwrap().contains("42"));

        cache.remove("42").await.unwrap();
        assert!(!cache.snapshot().await.unwrap().contains("42"));
    }

    #[tokio::test]
    async fn refresh_racing_a_write_does_not_hide_the_write() {
        let cache = Arc::new(CachedSuppressionRegistry::new(
            Arc::new(SlowRegistry {
                inner: InMemorySuppressionRegistry::new(),
                delay: Duration::from_millis(100),
            }),
            Duration::from_secs(300),
        ));

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.snapshot().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio_test::assert_ok!(cache.insert(entry("42")).await);

        // The in-flight read started before the write and may miss it.
        let before = reader.await.unwrap().unwrap();
        assert!(!before.contains("42"));

        let after = tokio_test::assert_ok!(cache.snapshot().await);
        assert!(after.contains("42"));
    }

    #[tokio::test]
    async fn fresh_snapshot_is_served_from_cache() {
        let mut inner = MockSuppressionRegistry::new();
        inner
            .expect_snapshot()
            .times(1)
            .returning(|| Ok(SuppressionSet::new(["a"])));
        let cache = CachedSuppressionRegistry::new(Arc::new(inner), Duration::from_secs(60));

        for _ in 0..3 {
            assert!(cache.snapshot().await.unwrap().contains("a"));
        }
    }

    #[tokio::test]
    async fn stale_snapshot_survives_backend_failure() {
        let mut inner = MockSuppressionRegistry::new();
        let mut calls = 0;
        inner.expect_snapshot().returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(SuppressionSet::new(["a"]))
            } else {
                Err(StoreError::Backend(anyhow::anyhow!("registry offline")))
            }
        });
        let cache = CachedSuppressionRegistry::new(Arc::new(inner), Duration::ZERO);

        assert!(cache.snapshot().await.unwrap().contains("a"));
        assert!(cache.snapshot().await.unwrap().contains("a"));
    }

    #[tokio::test]
    async fn no_snapshot_means_error() {
        let mut inner = MockSuppressionRegistry::new();
        inner
            .expect_snapshot()
            .returning(|| Err(StoreError::Backend(anyhow::anyhow!("registry offline"))));
        let cache = CachedSuppressionRegistry::new(Arc::new(inner), Duration::from_secs(5));
        assert!(cache.snapshot().await.is_err());
    }
}
