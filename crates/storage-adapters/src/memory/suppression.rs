use async_trait::async_trait;
use dashmap::DashMap;
use domains::{StoreError, SuppressionEntry, SuppressionRegistry, SuppressionSet};

#[derive(Default)]
pub struct InMemorySuppressionRegistry {
    entries: DashMap<String, SuppressionEntry>,
}

impl InMemorySuppressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SuppressionRegistry for InMemorySuppressionRegistry {
    async fn snapshot(&self) -> Result<SuppressionSet, StoreError> {
        Ok(SuppressionSet::new(self.entries.iter().map(|e| e.key().clone())))
    }

    async fn get(&self, identifier: &str) -> Result<Option<SuppressionEntry>, StoreError> {
        Ok(self.entries.get(identifier).map(|e| e.value().clone()))
    }

    async fn insert(&self, entry: SuppressionEntry) -> Result<(), StoreError> {
        self.entries.insert(entry.identifier.clone(), entry);
        Ok(())
    }

    async fn remove(&self, identifier: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(identifier).is_some())
    }
}
