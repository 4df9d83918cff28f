//! # Project Service
//!
//! Owner-side lifecycle of managed records: creation (with one slug retry),
//! claiming a legacy entry, publishing and editing. A first record promotes
//! its owner and triggers the one-time welcome notice.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    is_managed_identifier, Actor, ContentKind, DomainError, LegacyCatalog, ManagedRecord,
    Notifier, OwnerDirectory, OwnerProfile, RecordStatus, RecordStore, Result, Role, StoreError,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::slug::{slugify, with_random_suffix};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProject {
    pub title: String,
    /// Explicit slug; derived from the title when absent
    pub slug: Option<String>,
    pub description: String,
    pub kind: ContentKind,
    pub tags: Vec<String>,
    pub developer: String,
    pub features: Vec<String>,
    pub screenshots: Vec<String>,
    pub links: Vec<String>,
    pub claimed_legacy_id: Option<String>,
    pub publish: bool,
}

/// Owner edits. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ContentKind>,
    pub tags: Option<Vec<String>>,
    pub developer: Option<String>,
    pub features: Option<Vec<String>>,
    pub screenshots: Option<Vec<String>>,
    pub links: Option<Vec<String>>,
}

pub struct ProjectService {
    records: Arc<dyn RecordStore>,
    legacy: Arc<dyn LegacyCatalog>,
    owners: Arc<dyn OwnerDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl ProjectService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        legacy: Arc<dyn LegacyCatalog>,
        owners: Arc<dyn OwnerDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { records, legacy, owners, notifier }
    }

    #[instrument(skip(self, owner, project), fields(owner = %owner.id, title = %project.title))]
    pub async fn create(&self, owner: &Actor, project: NewProject) -> Result<ManagedRecord> {
        let title = project.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("title must not be empty".into()));
        }

        let base_slug = slugify(project.slug.as_deref().unwrap_or(&title));
        if base_slug.is_empty() {
            return Err(DomainError::Validation("slug must contain letters or digits".into()));
        }
        if is_managed_identifier(&base_slug) {
            return Err(DomainError::Validation("slug must not look like a UUID".into()));
        }

        if let Some(legacy_id) = project.claimed_legacy_id.as_deref() {
            self.ensure_claimable(legacy_id).await?;
        }

        let now = Utc::now();
        let status = if project.publish { RecordStatus::Published } else { RecordStatus::Draft };
        let mut record = ManagedRecord {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            slug: base_slug.clone(),
            status,
            claimed_legacy_id: project.claimed_legacy_id,
            title,
            description: project.description,
            kind: project.kind,
            tags: project.tags,
            developer: project.developer,
            features: project.features,
            screenshots: project.screenshots,
            links: project.links,
            created_at: now,
            updated_at: now,
            published_at: project.publish.then_some(now),
        };

        match self.records.insert(record.clone()).await {
            Ok(()) => {}
            Err(StoreError::DuplicateSlug(taken)) => {
                // Exactly one retry with a fresh slug.
                record.slug = with_random_suffix(&base_slug);
                warn!(taken = %taken, retry = %record.slug, "slug collision, retrying once");
                self.records.insert(record.clone()).await?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(record = %record.id, slug = %record.slug, "project created");
        self.onboard_owner(owner).await;
        Ok(record)
    }

    /// Declares `record_id` the canonical successor of a legacy entry.
    #[instrument(skip(self, owner), fields(owner = %owner.id))]
    pub async fn claim(
        &self,
        record_id: Uuid,
        legacy_id: &str,
        owner: &Actor,
    ) -> Result<ManagedRecord> {
        let mut record = self.owned_record(record_id, owner).await?;
        ensure_editable(&record)?;

        if let Some(existing) = record.claimed_legacy_id.as_deref() {
            if existing == legacy_id {
                return Ok(record);
            }
            return Err(DomainError::Conflict(format!(
                "record already claims legacy entry '{existing}'"
            )));
        }

        self.ensure_claimable(legacy_id).await?;
        record.claimed_legacy_id = Some(legacy_id.to_string());
        record.updated_at = Utc::now();
        self.records.update(record.clone()).await?;

        info!(record = %record.id, legacy = legacy_id, "legacy entry claimed");
        self.onboard_owner(owner).await;
        Ok(record)
    }

    pub async fn publish(&self, record_id: Uuid, owner: &Actor) -> Result<ManagedRecord> {
        let record = self.owned_record(record_id, owner).await?;
        match record.status {
            RecordStatus::Published => Ok(record),
            RecordStatus::Draft => {
                Ok(self.records.set_status(record_id, RecordStatus::Published).await?)
            }
            RecordStatus::Archived => Err(DomainError::IllegalTransition(
                "archived records can only be restored by an administrator".into(),
            )),
            RecordStatus::Banned => Err(banned_error()),
        }
    }

    pub async fn unpublish(&self, record_id: Uuid, owner: &Actor) -> Result<ManagedRecord> {
        let record = self.owned_record(record_id, owner).await?;
        match record.status {
            RecordStatus::Draft => Ok(record),
            RecordStatus::Published => {
                Ok(self.records.set_status(record_id, RecordStatus::Draft).await?)
            }
            RecordStatus::Archived => Err(DomainError::IllegalTransition(
                "archived records can only be restored by an administrator".into(),
            )),
            RecordStatus::Banned => Err(banned_error()),
        }
    }

    pub async fn edit(
        &self,
        record_id: Uuid,
        patch: RecordPatch,
        owner: &Actor,
    ) -> Result<ManagedRecord> {
        let mut record = self.owned_record(record_id, owner).await?;
        ensure_editable(&record)?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(DomainError::Validation("title must not be empty".into()));
            }
            record.title = title;
        }
        if let Some(description) = patch.description {
            record.description = description;
        }
        if let Some(kind) = patch.kind {
            record.kind = kind;
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if let Some(developer) = patch.developer {
            record.developer = developer;
        }
        if let Some(features) = patch.features {
            record.features = features;
        }
        if let Some(screenshots) = patch.screenshots {
            record.screenshots = screenshots;
        }
        if let Some(links) = patch.links {
            record.links = links;
        }
        record.updated_at = Utc::now();

        self.records.update(record.clone()).await?;
        Ok(record)
    }

    async fn owned_record(&self, record_id: Uuid, owner: &Actor) -> Result<ManagedRecord> {
        let record = self
            .records
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("managed record '{record_id}'")))?;
        if record.owner_id != owner.id {
            return Err(DomainError::Forbidden("only the owner can change this record".into()));
        }
        Ok(record)
    }

    async fn ensure_claimable(&self, legacy_id: &str) -> Result<()> {
        if is_managed_identifier(legacy_id) {
            return Err(DomainError::Validation(format!(
                "'{legacy_id}' is not a legacy identifier"
            )));
        }
        if self.legacy.get(legacy_id).await?.is_none() {
            return Err(DomainError::NotFound(format!("legacy entry '{legacy_id}'")));
        }
        if self.records.find_by_claimed_legacy_id(legacy_id).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "legacy entry '{legacy_id}' is already claimed"
            )));
        }
        Ok(())
    }

    /// Registers the owner on first sight, promotes them and sends the
    /// welcome notice at most once.
    ///
    /// Nothing here fails the triggering write. The flag is only set after
    /// the notifier confirms delivery.
    async fn onboard_owner(&self, owner: &Actor) {
        let owner_id = owner.id;
        let profile = OwnerProfile {
            id: owner_id,
            display_name: owner.name.clone(),
            email: None,
            role: owner.role,
            welcome_sent: false,
        };
        match self.owners.register(profile).await {
            Ok(true) => info!(owner = %owner_id, "owner profile registered"),
            Ok(false) => {}
            Err(e) => warn!(owner = %owner_id, error = %e, "owner registration failed"),
        }

        match self.owners.promote(owner_id, Role::Developer).await {
            Ok(true) => info!(owner = %owner_id, "owner promoted to developer"),
            Ok(false) => {}
            Err(e) => warn!(owner = %owner_id, error = %e, "owner promotion failed"),
        }

        let profile = match self.owners.get(owner_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(owner = %owner_id, "no owner profile, skipping welcome notice");
                return;
            }
            Err(e) => {
                warn!(owner = %owner_id, error = %e, "owner lookup failed, no welcome notice");
                return;
            }
        };
        if profile.welcome_sent {
            return;
        }

        match self.notifier.send_welcome(&profile).await {
            Ok(()) => {
                if let Err(e) = self.owners.mark_welcome_sent(owner_id).await {
                    warn!(owner = %owner_id, error = %e, "welcome sent but flag not persisted");
                }
            }
            Err(e) => warn!(owner = %owner_id, error = %e, "welcome notice not delivered"),
        }
    }
}

fn ensure_editable(record: &ManagedRecord) -> Result<()> {
    if record.status == RecordStatus::Banned {
        return Err(banned_error());
    }
    Ok(())
}

fn banned_error() -> DomainError {
    DomainError::IllegalTransition(
        "banned records cannot be changed by their owner; request a review instead".into(),
    )
}
