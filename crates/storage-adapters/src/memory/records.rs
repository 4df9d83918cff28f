use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{ManagedRecord, RecordStatus, RecordStore, StoreError};
use uuid::Uuid;

/// `RecordStore` backed by concurrent maps.
///
/// Slug and claim uniqueness are enforced through index maps whose entry
/// API reserves a key atomically, mirroring the unique constraints of the
/// PostgreSQL schema.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: DashMap<Uuid, ManagedRecord>,
    slugs: DashMap<String, Uuid>,
    claims: DashMap<String, Uuid>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn reserve_claim(&self, legacy_id: &str, owner: Uuid) -> Result<(), StoreError> {
        match self.claims.entry(legacy_id.to_string()) {
            Entry::Occupied(existing) if *existing.get() != owner => {
                Err(StoreError::DuplicateClaim(legacy_id.to_string()))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(owner);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ManagedRecord>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ManagedRecord>, StoreError> {
        let Some(id) = self.slugs.get(slug).map(|id| *id.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_claimed_legacy_id(
        &self,
        legacy_id: &str,
    ) -> Result<Option<ManagedRecord>, StoreError> {
        let Some(id) = self.claims.get(legacy_id).map(|id| *id.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn list_recent(
        &self,
        statuses: Vec<RecordStatus>,
        limit: usize,
    ) -> Result<Vec<ManagedRecord>, StoreError> {
        let mut records: Vec<ManagedRecord> = self
            .records
            .iter()
            .filter(|r| statuses.contains(&r.status))
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| b.recency().cmp(&a.recency()));
        records.truncate(limit);
        Ok(records)
    }

    async fn insert(&self, record: ManagedRecord) -> Result<(), StoreError> {
        if let Some(legacy_id) = record.claimed_legacy_id.as_deref() {
            self.reserve_claim(legacy_id, record.id)?;
        }

        let slug_taken = match self.slugs.entry(record.slug.clone()) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(record.id);
                false
            }
        };
        if slug_taken {
            if let Some(legacy_id) = record.claimed_legacy_id.as_deref() {
                self.claims.remove_if(legacy_id, |_, id| *id == record.id);
            }
            return Err(StoreError::DuplicateSlug(record.slug));
        }

        self.records.insert(record.id, record);
        Ok(())
    }

    async fn update(&self, record: ManagedRecord) -> Result<(), StoreError> {
        let previous_claim = match self.records.get(&record.id) {
            Some(existing) => existing.claimed_legacy_id.clone(),
            None => return Err(StoreError::NotFound(format!("managed record '{}'", record.id))),
        };

        if let Some(legacy_id) = record.claimed_legacy_id.as_deref() {
            self.reserve_claim(legacy_id, record.id)?;
        }
        if let Some(old) = previous_claim {
            if record.claimed_legacy_id.as_deref() != Some(old.as_str()) {
                self.claims.remove_if(&old, |_, id| *id == record.id);
            }
        }

        self.records.insert(record.id, record);
        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> Result<ManagedRecord, StoreError> {
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("managed record '{id}'")))?;
        let now = Utc::now();
        record.status = status;
        record.updated_at = now;
        if status == RecordStatus::Published && record.published_at.is_none() {
            record.published_at = Some(now);
        }
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let Some((_, record)) = self.records.remove(&id) else {
            return Ok(false);
        };
        self.slugs.remove_if(&record.slug, |_, owner| *owner == id);
        if let Some(legacy_id) = record.claimed_legacy_id.as_deref() {
            self.claims.remove_if(legacy_id, |_, owner| *owner == id);
        }
        Ok(true)
    }
}
