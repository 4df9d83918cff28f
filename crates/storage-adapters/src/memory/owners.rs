use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{OwnerDirectory, OwnerProfile, Role, StoreError};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryOwnerDirectory {
    owners: DashMap<Uuid, OwnerProfile>,
}

impl InMemoryOwnerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a profile. Normally done by the account layer.
    pub fn upsert(&self, profile: OwnerProfile) {
        self.owners.insert(profile.id, profile);
    }
}

#[async_trait]
impl OwnerDirectory for InMemoryOwnerDirectory {
    async fn get(&self, owner_id: Uuid) -> Result<Option<OwnerProfile>, StoreError> {
        Ok(self.owners.get(&owner_id).map(|p| p.value().clone()))
    }

    async fn register(&self, profile: OwnerProfile) -> Result<bool, StoreError> {
        match self.owners.entry(profile.id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(profile);
                Ok(true)
            }
        }
    }

    async fn promote(&self, owner_id: Uuid, role: Role) -> Result<bool, StoreError> {
        match self.owners.get_mut(&owner_id) {
            Some(mut profile) if profile.role < role => {
                profile.role = role;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(format!("owner '{owner_id}'"))),
        }
    }

    async fn mark_welcome_sent(&self, owner_id: Uuid) -> Result<(), StoreError> {
        let mut profile = self
            .owners
            .get_mut(&owner_id)
            .ok_or_else(|| StoreError::NotFound(format!("owner '{owner_id}'")))?;
        profile.welcome_sent = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: Uuid, name: &str) -> OwnerProfile {
        OwnerProfile {
            id,
            display_name: name.into(),
            email: None,
            role: Role::User,
            welcome_sent: false,
        }
    }

    #[tokio::test]
    async fn register_keeps_an_existing_profile() {
        let owners = InMemoryOwnerDirectory::new();
        let id = Uuid::now_v7();
        assert!(tokio_test::assert_ok!(owners.register(profile(id, "ada")).await));

        owners.promote(id, Role::Developer).await.unwrap();
        owners.mark_welcome_sent(id).await.unwrap();
        assert!(!tokio_test::assert_ok!(owners.register(profile(id, "someone else")).await));

        let stored = owners.get(id).await.unwrap().unwrap();
        assert_eq!(stored.display_name, "ada");
        assert_eq!(stored.role, Role::Developer);
        assert!(stored.welcome_sent);
    }

    #[tokio::test]
    async fn promote_needs_a_registered_owner() {
        let owners = InMemoryOwnerDirectory::new();
        tokio_test::assert_err!(owners.promote(Uuid::now_v7(), Role::Developer).await);
    }
}
