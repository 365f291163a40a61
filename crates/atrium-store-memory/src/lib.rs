//! In-memory CollaborationStore implementation.
//!
//! Aggregates live in a `DashMap`; each update runs under the map's
//! per-entry lock and checks the aggregate revision, so the
//! compare-and-swap contract of
//! [`CollaborationStore::update_collaboration`] holds even with concurrent
//! writers. Suitable for tests and single-process deployments.

use async_trait::async_trait;
use atrium_storage::{
    Collaboration, CollaborationId, CollaborationStore, CreateCollaborationParams, DomainId,
    Member, MemberRef, StoreError,
};
use chrono::Utc;
use dashmap::DashMap;

pub struct MemoryCollaborationStore {
    collaborations: DashMap<CollaborationId, Collaboration>,
}

impl MemoryCollaborationStore {
    pub fn new() -> Self {
        Self {
            collaborations: DashMap::new(),
        }
    }
}

impl Default for MemoryCollaborationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollaborationStore for MemoryCollaborationStore {
    async fn create_collaboration(
        &self,
        params: &CreateCollaborationParams,
    ) -> Result<Collaboration, StoreError> {
        let now = Utc::now();
        let collaboration = Collaboration {
            id: CollaborationId::new(),
            kind: params.kind,
            title: params.title.clone(),
            creator: params.creator.clone(),
            domain_ids: params.domain_ids.clone(),
            // The creator is always the first member.
            members: vec![Member {
                member: MemberRef::User(params.creator.clone()),
                joined_at: now,
            }],
            membership_requests: vec![],
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        match self.collaborations.entry(collaboration.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(collaboration.clone());
                Ok(collaboration)
            }
        }
    }

    async fn get_collaboration(
        &self,
        id: &CollaborationId,
    ) -> Result<Collaboration, StoreError> {
        self.collaborations
            .get(id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update_collaboration(
        &self,
        collaboration: &Collaboration,
    ) -> Result<Collaboration, StoreError> {
        let mut entry = self
            .collaborations
            .get_mut(&collaboration.id)
            .ok_or(StoreError::NotFound)?;

        if entry.revision != collaboration.revision {
            return Err(StoreError::Conflict);
        }

        let mut stored = collaboration.clone();
        stored.revision += 1;
        stored.updated_at = Utc::now();
        *entry = stored.clone();
        Ok(stored)
    }

    async fn delete_collaboration(&self, id: &CollaborationId) -> Result<(), StoreError> {
        self.collaborations
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_collaborations_in_domain(
        &self,
        domain_id: &DomainId,
    ) -> Result<Vec<Collaboration>, StoreError> {
        Ok(self
            .collaborations
            .iter()
            .filter(|entry| entry.domain_ids.contains(domain_id))
            .map(|entry| entry.clone())
            .collect())
    }

    async fn list_collaborations_with_member(
        &self,
        member: &MemberRef,
    ) -> Result<Vec<Collaboration>, StoreError> {
        Ok(self
            .collaborations
            .iter()
            .filter(|entry| entry.is_direct_member(member))
            .map(|entry| entry.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_storage::{CollaborationType, UserId};

    fn params(creator: &UserId) -> CreateCollaborationParams {
        CreateCollaborationParams {
            kind: CollaborationType::Open,
            title: "test".to_string(),
            creator: creator.clone(),
            domain_ids: vec![],
        }
    }

    #[tokio::test]
    async fn create_seeds_creator_as_first_member() {
        let store = MemoryCollaborationStore::new();
        let creator = UserId::new();

        let collaboration = store.create_collaboration(&params(&creator)).await.unwrap();

        assert_eq!(collaboration.members.len(), 1);
        assert_eq!(
            collaboration.members[0].member,
            MemberRef::User(creator.clone())
        );
        assert!(collaboration.membership_requests.is_empty());
        assert_eq!(collaboration.revision, 0);
    }

    #[tokio::test]
    async fn update_rejects_stale_revision() {
        let store = MemoryCollaborationStore::new();
        let creator = UserId::new();
        let collaboration = store.create_collaboration(&params(&creator)).await.unwrap();

        // Two readers load revision 0.
        let mut first = store.get_collaboration(&collaboration.id).await.unwrap();
        let mut second = store.get_collaboration(&collaboration.id).await.unwrap();

        first.push_member(MemberRef::User(UserId::new()), Utc::now());
        let saved = store.update_collaboration(&first).await.unwrap();
        assert_eq!(saved.revision, 1);

        second.push_member(MemberRef::User(UserId::new()), Utc::now());
        let err = store.update_collaboration(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryCollaborationStore::new();
        let err = store
            .get_collaboration(&CollaborationId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
