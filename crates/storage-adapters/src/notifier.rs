//! # Notifiers
//!
//! Email delivery lives outside the engine. `LogNotifier` records notices in
//! the structured log for whatever mail relay tails it; `RecordingNotifier`
//! keeps them in memory and can be told to fail, for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{ModerationAction, NotificationError, Notifier, OwnerProfile};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_welcome(&self, owner: &OwnerProfile) -> Result<(), NotificationError> {
        info!(
            target: "notifications",
            owner = %owner.id,
            email = owner.email.as_deref().unwrap_or(""),
            kind = "welcome",
            "welcome notice dispatched"
        );
        Ok(())
    }

    async fn send_moderation_notice(
        &self,
        owner_id: Uuid,
        action: &ModerationAction,
    ) -> Result<(), NotificationError> {
        info!(
            target: "notifications",
            owner = %owner_id,
            action = %action.action_type,
            target_identifier = %action.target_identifier,
            kind = "moderation",
            "moderation notice dispatched"
        );
        Ok(())
    }
}

/// Counts deliveries per owner. `fail_next(n)` makes the next `n` sends fail.
#[derive(Default)]
pub struct RecordingNotifier {
    welcomes: DashMap<Uuid, usize>,
    moderation_notices: DashMap<Uuid, usize>,
    failures_left: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn welcomes_for(&self, owner_id: Uuid) -> usize {
        self.welcomes.get(&owner_id).map(|n| *n).unwrap_or(0)
    }

    pub fn moderation_notices_for(&self, owner_id: Uuid) -> usize {
        self.moderation_notices.get(&owner_id).map(|n| *n).unwrap_or(0)
    }

    fn should_fail(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_welcome(&self, owner: &OwnerProfile) -> Result<(), NotificationError> {
        if self.should_fail() {
            return Err(NotificationError("simulated delivery failure".into()));
        }
        *self.welcomes.entry(owner.id).or_insert(0) += 1;
        Ok(())
    }

    async fn send_moderation_notice(
        &self,
        owner_id: Uuid,
        _action: &ModerationAction,
    ) -> Result<(), NotificationError> {
        if self.should_fail() {
            return Err(NotificationError("simulated delivery failure".into()));
        }
        *self.moderation_notices.entry(owner_id).or_insert(0) += 1;
        Ok(())
    }
}
