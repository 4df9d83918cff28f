use async_trait::async_trait;
use dashmap::DashMap;
use domains::{LegacyCatalog, LegacyEntry, StoreError};

/// Read-only legacy catalog seeded once at construction.
#[derive(Default)]
pub struct InMemoryLegacyCatalog {
    entries: DashMap<String, LegacyEntry>,
}

impl InMemoryLegacyCatalog {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LegacyEntry>,
    {
        Self { entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect() }
    }

    /// Seeds from a JSON array of legacy entries, as exported by the importer.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let entries: Vec<LegacyEntry> = serde_json::from_str(raw)?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LegacyCatalog for InMemoryLegacyCatalog {
    async fn list_recent(&self, limit: usize) -> Result<Vec<LegacyEntry>, StoreError> {
        let mut entries: Vec<LegacyEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn get(&self, id: &str) -> Result<Option<LegacyEntry>, StoreError> {
        Ok(self.entries.get(id).map(|e| e.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_from_json_and_orders_by_recency() {
        let raw = r#"[
            {"id": "41", "title": "Old", "description": "", "kind": "game", "tags": [],
             "developer": "unknown", "features": [], "screenshots": [], "links": [],
             "published_at": "2023-01-01T00:00:00Z"},
            {"id": "42", "title": "New", "description": "", "kind": "app", "tags": ["tool"],
             "developer": "Acme", "features": [], "screenshots": [], "links": [],
             "published_at": "2024-01-01T00:00:00Z"}
        ]"#;
        let catalog = InMemoryLegacyCatalog::from_json(raw).unwrap();
        assert_eq!(catalog.len(), 2);

        let recent = catalog.list_recent(1).await.unwrap();
        assert_eq!(recent[0].id, "42");
        assert!(catalog.get("41").await.unwrap().is_some());
        assert!(catalog.get("nope").await.unwrap().is_none());
    }

    #[test]
    fn malformed_seed_is_an_error() {
        assert!(InMemoryLegacyCatalog::from_json("{not json").is_err());
    }
}
