//! # Moderation State Machine
//!
//! The authoritative set of transitions an administrator (or, for a few
//! actions, a record's owner) may apply to a managed record or a legacy
//! catalog entry. Legality is decided by [`plan_managed`] / [`check_legacy`]
//! before anything is written; every applied transition appends exactly one
//! immutable [`ModerationAction`].
//!
//! Concurrent calls on one target race only on the status field (last write
//! wins). The log is append-only, so each call keeps its own entry.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    ActionMetadata, ActionType, Actor, ContentId, DomainError, LegacyCatalog, ManagedRecord,
    ModerationAction, ModerationLog, Notifier, RecordStatus, RecordStore, Result,
    SuppressionEntry, SuppressionRegistry, TargetKind,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// A moderation request as received from the authenticated boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub target_identifier: String,
    pub target_kind: TargetKind,
    pub action: ActionType,
    #[serde(default)]
    pub reason: String,
    /// Only meaningful for `delete`: physically remove instead of archiving
    #[serde(default)]
    pub hard_delete: bool,
    /// Exact title, required from non-admins for a hard delete
    #[serde(default)]
    pub confirmation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionChange {
    Keep,
    Insert,
    Remove,
}

/// What a legal managed-record transition will write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub new_status: Option<RecordStatus>,
    pub suppression: SuppressionChange,
    pub remove_record: bool,
}

impl TransitionPlan {
    fn log_only() -> Self {
        Self { new_status: None, suppression: SuppressionChange::Keep, remove_record: false }
    }
}

/// Validates an action against a legacy entry. Only `hide` and `restore`
/// exist for legacy targets, and both are admin-only.
pub fn check_legacy(action: ActionType, actor: &Actor) -> Result<SuppressionChange> {
    let change = match action {
        ActionType::Hide => SuppressionChange::Insert,
        ActionType::Restore => SuppressionChange::Remove,
        ActionType::Ban | ActionType::Unban | ActionType::Delete => {
            return Err(DomainError::IllegalTransition(format!(
                "{action} is not available for legacy catalog entries"
            )))
        }
        ActionType::ReviewRequest => {
            return Err(DomainError::IllegalTransition(
                "review requests apply to managed records only".into(),
            ))
        }
    };
    require_admin(action, actor)?;
    Ok(change)
}

/// Decides whether `request` may be applied to `record` by `actor`, and what
/// it would change.
pub fn plan_managed(
    request: &ModerationRequest,
    record: &ManagedRecord,
    actor: &Actor,
) -> Result<TransitionPlan> {
    let is_owner = record.owner_id == actor.id;
    let status = record.status;

    match request.action {
        ActionType::Hide => {
            require_admin(request.action, actor)?;
            Ok(TransitionPlan {
                suppression: SuppressionChange::Insert,
                ..TransitionPlan::log_only()
            })
        }
        ActionType::Restore => {
            require_admin(request.action, actor)?;
            Ok(TransitionPlan {
                new_status: Some(RecordStatus::Published),
                suppression: SuppressionChange::Remove,
                remove_record: false,
            })
        }
        ActionType::Ban => {
            require_admin(request.action, actor)?;
            // A ban supersedes any hide.
            Ok(TransitionPlan {
                new_status: Some(RecordStatus::Banned),
                suppression: SuppressionChange::Remove,
                remove_record: false,
            })
        }
        ActionType::Unban => {
            require_admin(request.action, actor)?;
            if status != RecordStatus::Banned {
                return Err(DomainError::IllegalTransition(format!(
                    "unban requires a banned record, this one is {status}"
                )));
            }
            Ok(TransitionPlan {
                new_status: Some(RecordStatus::Draft),
                suppression: SuppressionChange::Keep,
                remove_record: false,
            })
        }
        ActionType::Delete => {
            if !actor.is_admin() {
                if !is_owner {
                    return Err(DomainError::Forbidden(
                        "only the owner or an administrator can delete a record".into(),
                    ));
                }
                if status == RecordStatus::Banned {
                    return Err(DomainError::IllegalTransition(
                        "a banned record can only leave the banned state through an administrator"
                            .into(),
                    ));
                }
                let confirmed = request.confirmation.as_deref() == Some(record.title.as_str());
                if request.hard_delete && !confirmed {
                    return Err(DomainError::IllegalTransition(
                        "hard delete requires the exact title as confirmation".into(),
                    ));
                }
            }
            if request.hard_delete {
                return Ok(TransitionPlan {
                    new_status: None,
                    suppression: SuppressionChange::Remove,
                    remove_record: true,
                });
            }
            if status == RecordStatus::Archived {
                return Err(DomainError::IllegalTransition("record is already archived".into()));
            }
            Ok(TransitionPlan {
                new_status: Some(RecordStatus::Archived),
                suppression: SuppressionChange::Remove,
                remove_record: false,
            })
        }
        ActionType::ReviewRequest => {
            if !is_owner {
                return Err(DomainError::Forbidden(
                    "only the record owner can request a review".into(),
                ));
            }
            Ok(TransitionPlan::log_only())
        }
    }
}

fn require_admin(action: ActionType, actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!("{action} requires an administrator")))
    }
}

pub struct ModerationService {
    records: Arc<dyn RecordStore>,
    legacy: Arc<dyn LegacyCatalog>,
    suppression: Arc<dyn SuppressionRegistry>,
    log: Arc<dyn ModerationLog>,
    notifier: Arc<dyn Notifier>,
}

impl ModerationService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        legacy: Arc<dyn LegacyCatalog>,
        suppression: Arc<dyn SuppressionRegistry>,
        log: Arc<dyn ModerationLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { records, legacy, suppression, log, notifier }
    }

    /// Applies one moderation action and returns its log entry.
    #[instrument(
        skip(self, request, actor),
        fields(target = %request.target_identifier, action = %request.action, actor = %actor.id)
    )]
    pub async fn apply(
        &self,
        request: ModerationRequest,
        actor: &Actor,
    ) -> Result<ModerationAction> {
        let target = ContentId::classify(&request.target_identifier);
        if target.kind() != request.target_kind {
            return Err(DomainError::Validation(format!(
                "'{}' is not a {} identifier",
                request.target_identifier,
                request.target_kind.as_str()
            )));
        }

        match target {
            ContentId::Legacy(id) => self.apply_to_legacy(&id, &request, actor).await,
            ContentId::Managed(id) => self.apply_to_managed(id, &request, actor).await,
        }
    }

    async fn apply_to_legacy(
        &self,
        id: &str,
        request: &ModerationRequest,
        actor: &Actor,
    ) -> Result<ModerationAction> {
        let change = check_legacy(request.action, actor)?;

        if self.legacy.get(id).await?.is_none() {
            return Err(DomainError::NotFound(format!("legacy entry '{id}'")));
        }

        // Claims are left untouched: restoring a legacy entry only toggles suppression.
        self.change_suppression(id, change, &request.reason).await?;

        let action = new_action(
            request,
            id,
            TargetKind::Legacy,
            actor,
            None,
            ActionMetadata::default(),
        );
        self.append(&action).await?;
        info!(action_id = %action.id, "moderation applied to legacy entry");
        Ok(action)
    }

    async fn apply_to_managed(
        &self,
        id: Uuid,
        request: &ModerationRequest,
        actor: &Actor,
    ) -> Result<ModerationAction> {
        let record = self
            .records
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("managed record '{id}'")))?;

        let plan = plan_managed(request, &record, actor)?;
        let identifier = id.to_string();

        self.change_suppression(&identifier, plan.suppression, &request.reason).await?;

        let new_status = match (plan.remove_record, plan.new_status) {
            (true, _) => None,
            (false, Some(status)) => Some(self.records.set_status(id, status).await?.status),
            (false, None) => Some(record.status),
        };

        let metadata = ActionMetadata {
            previous_status: Some(record.status),
            new_status,
            hard_delete: plan.remove_record,
        };
        let action = new_action(
            request,
            &identifier,
            TargetKind::Managed,
            actor,
            Some(record.owner_id),
            metadata,
        );
        // The entry must exist before the record is gone for good.
        self.append(&action).await?;
        if plan.remove_record && !self.records.delete(id).await? {
            return Err(DomainError::NotFound(format!("managed record '{id}'")));
        }
        info!(
            action_id = %action.id,
            previous = %record.status,
            new = ?new_status,
            "moderation applied to managed record"
        );

        if record.owner_id != actor.id {
            if let Err(e) = self.notifier.send_moderation_notice(record.owner_id, &action).await {
                warn!(error = %e, owner = %record.owner_id, "moderation notice not delivered");
            }
        }

        Ok(action)
    }

    async fn append(&self, action: &ModerationAction) -> Result<()> {
        if let Err(e) = self.log.append(action.clone()).await {
            error!(error = %e, action = ?action, "moderation action could not be logged");
            return Err(e.into());
        }
        Ok(())
    }

    async fn change_suppression(
        &self,
        identifier: &str,
        change: SuppressionChange,
        reason: &str,
    ) -> Result<()> {
        match change {
            SuppressionChange::Keep => {}
            SuppressionChange::Insert => {
                self.suppression
                    .insert(SuppressionEntry {
                        identifier: identifier.to_string(),
                        reason: reason.to_string(),
                        created_at: Utc::now(),
                    })
                    .await?;
            }
            SuppressionChange::Remove => {
                self.suppression.remove(identifier).await?;
            }
        }
        Ok(())
    }

    /// Marks an action as handled.
    ///
    /// Review requests are closed by an administrator, which takes them off
    /// the review queue. Every other action is acknowledged by the owner it
    /// affected.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn acknowledge(
        &self,
        action_id: Uuid,
        actor: &Actor,
    ) -> Result<ModerationAction> {
        let mut action = self
            .log
            .get(action_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("moderation action '{action_id}'")))?;

        if action.action_type == ActionType::ReviewRequest {
            if !actor.is_admin() {
                return Err(DomainError::Forbidden(
                    "review requests are closed by an administrator".into(),
                ));
            }
        } else if action.target_owner_id != Some(actor.id) {
            return Err(DomainError::Forbidden(
                "only the affected owner can acknowledge this action".into(),
            ));
        }

        if !action.acknowledged && !self.log.acknowledge(action_id).await? {
            return Err(DomainError::NotFound(format!("moderation action '{action_id}'")));
        }
        action.acknowledged = true;
        Ok(action)
    }

    /// Every action taken against `identifier`, newest first. Admin only.
    pub async fn history(
        &self,
        identifier: &str,
        actor: &Actor,
        limit: usize,
    ) -> Result<Vec<ModerationAction>> {
        if !actor.is_admin() {
            return Err(DomainError::Forbidden(
                "moderation history requires an administrator".into(),
            ));
        }
        Ok(self.log.list_for_target(identifier, limit).await?)
    }

    /// Review requests nobody has picked up yet, for admin tooling.
    pub async fn pending_reviews(
        &self,
        actor: &Actor,
        limit: usize,
    ) -> Result<Vec<ModerationAction>> {
        if !actor.is_admin() {
            return Err(DomainError::Forbidden("review queue requires an administrator".into()));
        }
        Ok(self.log.list_unacknowledged(ActionType::ReviewRequest, limit).await?)
    }

    /// Unacknowledged actions affecting the caller's records.
    pub async fn notices_for(
        &self,
        actor: &Actor,
        limit: usize,
    ) -> Result<Vec<ModerationAction>> {
        let actions = self.log.list_unacknowledged_for_owner(actor.id, limit).await?;
        // Owners do not need to be told about their own review requests.
        Ok(actions.into_iter().filter(|a| a.actor_id != actor.id).collect())
    }
}

fn new_action(
    request: &ModerationRequest,
    target_identifier: &str,
    target_kind: TargetKind,
    actor: &Actor,
    target_owner_id: Option<Uuid>,
    metadata: ActionMetadata,
) -> ModerationAction {
    ModerationAction {
        id: Uuid::now_v7(),
        target_identifier: target_identifier.to_string(),
        target_kind,
        action_type: request.action,
        reason: request.reason.clone(),
        actor_id: actor.id,
        actor_name: actor.name.clone(),
        target_owner_id,
        created_at: Utc::now(),
        acknowledged: false,
        metadata,
    }
}
