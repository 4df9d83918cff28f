use async_trait::async_trait;
use dashmap::DashMap;
use domains::{ActionType, ModerationAction, ModerationLog, StoreError};
use uuid::Uuid;

/// Append-only log. Entries are never replaced; only the acknowledged flag flips.
#[derive(Default)]
pub struct InMemoryModerationLog {
    actions: DashMap<Uuid, ModerationAction>,
}

impl InMemoryModerationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn newest_first<F>(&self, keep: F, limit: usize) -> Vec<ModerationAction>
    where
        F: Fn(&ModerationAction) -> bool,
    {
        let mut found: Vec<ModerationAction> = self
            .actions
            .iter()
            .filter(|a| keep(a.value()))
            .map(|a| a.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        found.truncate(limit);
        found
    }
}

#[async_trait]
impl ModerationLog for InMemoryModerationLog {
    async fn append(&self, action: ModerationAction) -> Result<(), StoreError> {
        self.actions.entry(action.id).or_insert(action);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ModerationAction>, StoreError> {
        Ok(self.actions.get(&id).map(|a| a.value().clone()))
    }

    async fn acknowledge(&self, id: Uuid) -> Result<bool, StoreError> {
        match self.actions.get_mut(&id) {
            Some(mut action) => {
                action.acknowledged = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_target(
        &self,
        identifier: &str,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError> {
        Ok(self.newest_first(|a| a.target_identifier == identifier, limit))
    }

    async fn list_unacknowledged(
        &self,
        action_type: ActionType,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError> {
        Ok(self.newest_first(|a| a.action_type == action_type && !a.acknowledged, limit))
    }

    async fn list_unacknowledged_for_owner(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ModerationAction>, StoreError> {
        Ok(self.newest_first(|a| a.target_owner_id == Some(owner_id) && !a.acknowledged, limit))
    }
}
