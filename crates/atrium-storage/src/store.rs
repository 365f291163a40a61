//! The CollaborationStore trait that backends implement.

use thiserror::Error;

use crate::types::{
    Collaboration, CollaborationId, CreateCollaborationParams, DomainId, MemberRef,
};

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}

/// The storage trait `atrium-core` depends on.
///
/// Collaborations are stored as whole aggregates. Every membership mutation
/// is a read-modify-write cycle: load the aggregate, mutate its embedded
/// collections, then persist through [`update_collaboration`], which must
/// reject the write with [`StoreError::Conflict`] when the stored revision
/// no longer matches the one that was read. That check is what makes the
/// workflow's check-then-mutate sequences atomic under concurrent writers.
///
/// [`update_collaboration`]: CollaborationStore::update_collaboration
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait CollaborationStore: Send + Sync {
    /// Create a collaboration with the creator seeded as its first member.
    async fn create_collaboration(
        &self,
        params: &CreateCollaborationParams,
    ) -> Result<Collaboration, StoreError>;

    /// Get a collaboration by ID.
    async fn get_collaboration(
        &self,
        id: &CollaborationId,
    ) -> Result<Collaboration, StoreError>;

    /// Persist an aggregate read at `collaboration.revision`.
    ///
    /// Fails with [`StoreError::Conflict`] if another writer committed in
    /// between; the stored copy gets a bumped revision and fresh
    /// `updated_at`. Returns the stored copy.
    async fn update_collaboration(
        &self,
        collaboration: &Collaboration,
    ) -> Result<Collaboration, StoreError>;

    /// Delete a collaboration.
    async fn delete_collaboration(&self, id: &CollaborationId) -> Result<(), StoreError>;

    /// All collaborations visible within a domain.
    async fn list_collaborations_in_domain(
        &self,
        domain_id: &DomainId,
    ) -> Result<Vec<Collaboration>, StoreError>;

    /// Reverse lookup: all collaborations where `member` appears in the
    /// member list.
    async fn list_collaborations_with_member(
        &self,
        member: &MemberRef,
    ) -> Result<Vec<Collaboration>, StoreError>;
}
