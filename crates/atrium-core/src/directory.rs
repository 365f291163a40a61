//! Paginated member and request listings, plus reverse membership lookups.

use std::collections::HashMap;
use std::sync::Arc;

use atrium_storage::{
    Collaboration, CollaborationId, CollaborationStore, Member, MemberKindFilter, MemberRef,
    MembershipRequest, StoreError, UserId,
};

use crate::config::DirectoryLimits;
use crate::error::WorkflowError;
use crate::permission::{self, ActorRole};

/// Pagination parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Pagination plus member-kind filtering.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemberQuery {
    pub limit: Option<usize>,
    pub offset: usize,
    pub kind_filter: Option<MemberKindFilter>,
}

/// One page of members together with the total count across all pages
/// (for an `X-Total-Count`-style header).
#[derive(Clone, Debug)]
pub struct MemberPage {
    pub items: Vec<Member>,
    pub total_count: usize,
}

/// Read-side queries over collaborations and their membership.
pub struct MemberDirectory<S> {
    store: Arc<S>,
    limits: DirectoryLimits,
}

impl<S> MemberDirectory<S>
where
    S: CollaborationStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_limits(store, DirectoryLimits::default())
    }

    pub fn with_limits(store: Arc<S>, limits: DirectoryLimits) -> Self {
        Self { store, limits }
    }

    /// One page of members in join order, optionally filtered by kind.
    ///
    /// `total_count` reflects the filtered total, not the page size.
    pub async fn get_members(
        &self,
        collaboration_id: &CollaborationId,
        query: MemberQuery,
    ) -> Result<MemberPage, WorkflowError> {
        let collaboration = self.load(collaboration_id).await?;

        let filtered: Vec<Member> = collaboration
            .members
            .into_iter()
            .filter(|m| {
                query
                    .kind_filter
                    .map(|f| f.matches(m.member.kind()))
                    .unwrap_or(true)
            })
            .collect();

        let total_count = filtered.len();
        let limit = self.limits.clamp(query.limit);
        let items = filtered
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .collect();

        Ok(MemberPage { items, total_count })
    }

    /// One page of pending membership requests, visible only to managers.
    pub async fn get_membership_requests(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        role: ActorRole,
        query: PageQuery,
    ) -> Result<Vec<MembershipRequest>, WorkflowError> {
        let collaboration = self.load(collaboration_id).await?;

        if !permission::is_manager(&collaboration, actor, role) {
            return Err(WorkflowError::Forbidden(
                "only managers can list membership requests".into(),
            ));
        }

        let limit = self.limits.clamp(query.limit);
        Ok(collaboration
            .membership_requests
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .collect())
    }

    /// Reverse lookup: all collaborations where `member` is a direct
    /// member, restricted to what `viewer` is allowed to find.
    pub async fn search_where_member(
        &self,
        member: &MemberRef,
        viewer: &MemberRef,
    ) -> Result<Vec<Collaboration>, WorkflowError> {
        let candidates = self.store.list_collaborations_with_member(member).await?;

        let mut visible = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let nested = self.nested_member_lookup(&candidate).await?;
            if permission::can_find(&candidate, viewer, |id: &CollaborationId| {
                nested.get(id).cloned()
            }) {
                visible.push(candidate);
            }
        }
        Ok(visible)
    }

    /// All collaborations where the user has write capability: direct
    /// memberships plus one hop of indirect membership through nested
    /// collaborations.
    pub async fn get_writable(&self, user: &UserId) -> Result<Vec<Collaboration>, WorkflowError> {
        let direct = self
            .store
            .list_collaborations_with_member(&MemberRef::User(user.clone()))
            .await?;

        let direct_ids: Vec<CollaborationId> = direct.iter().map(|c| c.id.clone()).collect();
        let mut writable = direct;
        for id in direct_ids {
            let containing = self
                .store
                .list_collaborations_with_member(&MemberRef::Collaboration(id))
                .await?;
            for outer in containing {
                if !writable.iter().any(|c| c.id == outer.id) {
                    writable.push(outer);
                }
            }
        }
        Ok(writable)
    }

    /// Fetch the member lists of one hop of nested collaborations so the
    /// pure permission predicates can resolve indirect membership. Missing
    /// nested records are skipped (treated as having no members); backend
    /// failures surface.
    async fn nested_member_lookup(
        &self,
        collaboration: &Collaboration,
    ) -> Result<HashMap<CollaborationId, Vec<MemberRef>>, WorkflowError> {
        let mut nested = HashMap::new();
        for id in collaboration.nested_collaborations() {
            match self.store.get_collaboration(id).await {
                Ok(inner) => {
                    nested.insert(
                        id.clone(),
                        inner.members.into_iter().map(|m| m.member).collect(),
                    );
                }
                Err(StoreError::NotFound) => continue,
                Err(err) => return Err(WorkflowError::Store(err)),
            }
        }
        Ok(nested)
    }

    async fn load(&self, id: &CollaborationId) -> Result<Collaboration, WorkflowError> {
        self.store
            .get_collaboration(id)
            .await
            .map_err(WorkflowError::from)
    }
}
