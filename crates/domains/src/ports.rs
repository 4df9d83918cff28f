//! # Ports
//!
//! Every adapter (in-memory, PostgreSQL, cache, notifier) implements these
//! traits. Services only ever see `Arc<dyn Port>`.

use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{DomainError, NotificationError, StoreError};
use crate::models::{
    ActionType, Actor, LegacyEntry, ManagedRecord, ModerationAction, OwnerProfile, RecordStatus,
    Role, SuppressionEntry,
};

/// Membership test for hidden identifiers.
pub trait SuppressionLookup: Send + Sync {
    fn contains(&self, identifier: &str) -> bool;
}

/// A fully materialized copy of the suppression registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionSet {
    ids: HashSet<String>,
}

impl SuppressionSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { ids: ids.into_iter().map(Into::into).collect() }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl SuppressionLookup for SuppressionSet {
    fn contains(&self, identifier: &str) -> bool {
        self.ids.contains(identifier)
    }
}

/// Persistence contract for user-created records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ManagedRecord>, StoreError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ManagedRecord>, StoreError>;
    async fn find_by_claimed_legacy_id(
        &self,
        legacy_id: &str,
    ) -> Result<Option<ManagedRecord>, StoreError>;

    /// Most recent first, by `published_at` falling back to `created_at`.
    async fn list_recent(
        &self,
        statuses: Vec<RecordStatus>,
        limit: usize,
    ) -> Result<Vec<ManagedRecord>, StoreError>;

    /// Fails with `DuplicateSlug` / `DuplicateClaim` on unique violations.
    async fn insert(&self, record: ManagedRecord) -> Result<(), StoreError>;

    /// Replaces the editable fields of an existing record.
    async fn update(&self, record: ManagedRecord) -> Result<(), StoreError>;

    /// Writes the status field and returns the updated record. Moving to
    /// `published` stamps `published_at` when it has never been set.
    async fn set_status(&self, id: Uuid, status: RecordStatus)
        -> Result<ManagedRecord, StoreError>;

    /// Physical removal. Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Read-only access to the third-party catalog.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LegacyCatalog: Send + Sync {
    async fn list_recent(&self, limit: usize) -> Result<Vec<LegacyEntry>, StoreError>;
    async fn get(&self, id: &str) -> Result<Option<LegacyEntry>, StoreError>;
}

/// The single source of truth for "is this hidden".
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SuppressionRegistry: Send + Sync {
    async fn snapshot(&self) -> Result<SuppressionSet, StoreError>;
    async fn get(&self, identifier: &str) -> Result<Option<SuppressionEntry>, StoreError>;
    /// Upsert; hiding an already hidden identifier replaces the reason.
    async fn insert(&self, entry: SuppressionEntry) -> Result<(), StoreError>;
    async fn remove(&self, identifier: &str) -> Result<bool, StoreError>;
}

/// Append-only audit log of moderation actions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ModerationLog: Send + Sync {
    async fn append(&self, action: ModerationAction) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<ModerationAction>, StoreError>;
    /// Sets the `acknowledged` flag. Returns false when the entry is missing.
    async fn acknowledge(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list_for_target(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError>;
    async fn list_unacknowledged(
        &self,
        action_type: ActionType,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError>;
    async fn list_unacknowledged_for_owner(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError>;
}

/// Owner roles and the persisted welcome flag.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    async fn get(&self, owner_id: Uuid) -> Result<Option<OwnerProfile>, StoreError>;
    /// Creates the profile unless one exists; an existing profile is left
    /// untouched. Returns true if it was created.
    async fn register(&self, profile: OwnerProfile) -> Result<bool, StoreError>;
    /// Raises the role to at least `role`. Returns true if it changed.
    async fn promote(&self, owner_id: Uuid, role: Role) -> Result<bool, StoreError>;
    async fn mark_welcome_sent(&self, owner_id: Uuid) -> Result<(), StoreError>;
}

/// Outbound notices. Delivery is best effort.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_welcome(&self, owner: &OwnerProfile) -> Result<(), NotificationError>;
    async fn send_moderation_notice(
        &self,
        owner_id: Uuid,
        action: &ModerationAction,
    ) -> Result<(), NotificationError>;
}

/// Turns a bearer credential into a verified actor. Sign-up and login live
/// elsewhere; this only checks what they issued.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityVerifier: Send + Sync {
    /// Fails with `DomainError::Unauthenticated` for anything not trusted.
    fn verify(&self, token: &str) -> Result<Actor, DomainError>;
}
