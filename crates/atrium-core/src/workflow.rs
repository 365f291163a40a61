//! Membership negotiation state machine.
//!
//! Every transition is a load → validate → mutate → commit cycle over the
//! collaboration aggregate. The commit is a compare-and-swap on the
//! aggregate revision; on a stale write the cycle re-runs against a fresh
//! read, so concurrent transitions against the same collaboration cannot
//! interleave between check and mutation (two racing self-joins converge
//! on `AlreadyMember` instead of duplicating a member).
//!
//! Event publication happens strictly after the committed write and is
//! fire-and-forget: a notification failure never rolls back a membership
//! change.

use std::sync::Arc;

use atrium_events::{EventBus, MembershipEvent, MembershipEventKind};
use atrium_storage::{
    Collaboration, CollaborationId, CollaborationStore, CollaborationType, MemberRef, StoreError,
    UserId, Workflow,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::WorkflowError;
use crate::permission::{self, ActorRole};

const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// Options for the join transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct JoinOptions {
    /// Manager override: add the member even when no request or invitation
    /// is pending.
    pub without_invite: bool,
}

/// Role of the caller relative to a pending membership request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestRole {
    /// Manages the collaboration (creator or delegated manager).
    Manager,
    /// Is the user the request is about.
    Target,
    /// Anyone else.
    Other,
}

impl RequestRole {
    /// Managers take the manager branch even when resolving a request
    /// about themselves.
    pub fn classify(is_manager: bool, is_target: bool) -> Self {
        if is_manager {
            RequestRole::Manager
        } else if is_target {
            RequestRole::Target
        } else {
            RequestRole::Other
        }
    }
}

/// The four resolution transitions of a pending membership request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Manager withdraws an invitation they sent.
    CancelInvitation,
    /// Invitee declines.
    DeclineInvitation,
    /// Manager rejects a join request.
    RefuseRequest,
    /// Requester withdraws their own request.
    CancelRequest,
}

impl Transition {
    /// The 2×2 dispatch table selecting which resolution applies to a
    /// pending request, given who initiated it and who is resolving it.
    pub fn resolve(workflow: Workflow, role: RequestRole) -> Result<Self, WorkflowError> {
        match (role, workflow) {
            (RequestRole::Manager, Workflow::Invitation) => Ok(Transition::CancelInvitation),
            (RequestRole::Manager, Workflow::Request) => Ok(Transition::RefuseRequest),
            (RequestRole::Target, Workflow::Invitation) => Ok(Transition::DeclineInvitation),
            (RequestRole::Target, Workflow::Request) => Ok(Transition::CancelRequest),
            (RequestRole::Other, _) => Err(WorkflowError::Forbidden(
                "no permission to resolve this membership request".into(),
            )),
        }
    }

    /// Event emitted when this transition removes the request.
    pub fn event_kind(&self) -> MembershipEventKind {
        match self {
            Transition::CancelInvitation => MembershipEventKind::InvitationCancelled,
            Transition::DeclineInvitation => MembershipEventKind::InvitationDeclined,
            Transition::RefuseRequest => MembershipEventKind::RequestRefused,
            Transition::CancelRequest => MembershipEventKind::RequestCancelled,
        }
    }

    /// The workflow kind of the pending request this transition resolves.
    pub fn workflow(&self) -> Workflow {
        match self {
            Transition::CancelInvitation | Transition::DeclineInvitation => Workflow::Invitation,
            Transition::RefuseRequest | Transition::CancelRequest => Workflow::Request,
        }
    }
}

/// The membership state machine over a collaboration store and an event
/// bus.
pub struct MembershipWorkflow<S, E> {
    store: Arc<S>,
    events: Arc<E>,
}

impl<S, E> MembershipWorkflow<S, E>
where
    S: CollaborationStore,
    E: EventBus,
{
    pub fn new(store: Arc<S>, events: Arc<E>) -> Self {
        Self { store, events }
    }

    /// Create or refresh a pending membership request.
    ///
    /// Managers create invitations; everyone else may only request
    /// membership for themselves. A pending request of the same workflow
    /// kind is refreshed in place; one of the other kind is rejected with
    /// [`WorkflowError::AlreadyRequested`].
    pub async fn add_membership_request(
        &self,
        collaboration_id: &CollaborationId,
        author: &UserId,
        target: &UserId,
        role: ActorRole,
    ) -> Result<Collaboration, WorkflowError> {
        let (saved, kind) = self
            .update(collaboration_id, |c| {
                if c.is_direct_member(&MemberRef::User(target.clone())) {
                    return Err(WorkflowError::AlreadyMember);
                }

                let workflow = if permission::is_manager(c, author, role) {
                    Workflow::Invitation
                } else if author == target {
                    Workflow::Request
                } else {
                    return Err(WorkflowError::Forbidden(
                        "cannot request membership on behalf of another user".into(),
                    ));
                };

                if let Some(existing) = c.membership_request_for(target) {
                    if existing.workflow != workflow {
                        return Err(WorkflowError::AlreadyRequested);
                    }
                }

                c.put_membership_request(target.clone(), workflow);
                Ok(Some(match workflow {
                    Workflow::Invitation => MembershipEventKind::InvitationCreated,
                    Workflow::Request => MembershipEventKind::RequestCreated,
                }))
            })
            .await?;

        if let Some(kind) = kind {
            self.publish(kind, &saved.id, author, target).await;
        }
        Ok(saved)
    }

    /// Accept/materialize transition: promote `target` into the member
    /// list.
    ///
    /// Self-join is direct on an open collaboration and otherwise consumes
    /// the pending request or invitation; a manager may add another user
    /// who has a pending entry, or force-add with
    /// [`JoinOptions::without_invite`]. Force-adding yourself is rejected.
    pub async fn join(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
        role: ActorRole,
        options: JoinOptions,
    ) -> Result<(), WorkflowError> {
        let (saved, kind) = self
            .update(collaboration_id, |c| {
                let target_ref = MemberRef::User(target.clone());
                if c.is_direct_member(&target_ref) {
                    return Err(WorkflowError::AlreadyMember);
                }

                if actor == target {
                    // Self-join path; manager status grants nothing extra
                    // here.
                    if options.without_invite {
                        return Err(WorkflowError::BadRequest(
                            "cannot force-add yourself".into(),
                        ));
                    }
                    if c.kind != CollaborationType::Open
                        && c.membership_request_for(target).is_none()
                    {
                        return Err(WorkflowError::BadRequest(
                            "not invited to this collaboration".into(),
                        ));
                    }
                } else if !permission::is_manager(c, actor, role) {
                    return Err(WorkflowError::Forbidden(
                        "no permission to add another user".into(),
                    ));
                } else if !options.without_invite && c.membership_request_for(target).is_none() {
                    return Err(WorkflowError::BadRequest(
                        "user has neither requested membership nor been invited".into(),
                    ));
                }

                let consumed = c.remove_membership_request(target);
                c.push_member(target_ref, Utc::now());
                Ok(Some(if consumed.is_some() {
                    MembershipEventKind::InvitationAccepted
                } else {
                    MembershipEventKind::MemberAdded
                }))
            })
            .await?;

        if let Some(kind) = kind {
            self.publish(kind, &saved.id, actor, target).await;
        }
        Ok(())
    }

    /// Remove `target` from the member list.
    ///
    /// The creator can never be removed. Removing an absent member is
    /// idempotent success and emits nothing.
    pub async fn leave(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
        role: ActorRole,
    ) -> Result<(), WorkflowError> {
        let (saved, kind) = self
            .update(collaboration_id, |c| {
                if c.is_creator(target) {
                    return Err(WorkflowError::Forbidden(
                        "the creator cannot leave their collaboration".into(),
                    ));
                }
                if actor != target && !permission::is_manager(c, actor, role) {
                    return Err(WorkflowError::Forbidden(
                        "no permission to remove another user".into(),
                    ));
                }
                Ok(c.remove_member(&MemberRef::User(target.clone()))
                    .map(|_| MembershipEventKind::MemberLeft))
            })
            .await?;

        if let Some(kind) = kind {
            self.publish(kind, &saved.id, actor, target).await;
        }
        Ok(())
    }

    /// Resolve the pending request for `target`, selecting the transition
    /// from the [`Transition::resolve`] dispatch table.
    ///
    /// The transition is selected on the same aggregate read the removal
    /// mutates, so the emitted topic always matches the request that was
    /// actually resolved, even when the pending entry changed kind since
    /// the caller last saw it.
    ///
    /// No pending request means there is nothing to resolve: that is
    /// success, so repeated client actions (double-clicking "cancel") are
    /// safe.
    pub async fn resolve_membership_request(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
        role: ActorRole,
    ) -> Result<(), WorkflowError> {
        let (saved, kind) = self
            .update(collaboration_id, |c| {
                let Some(workflow) = c.membership_request_for(target).map(|r| r.workflow)
                else {
                    return Ok(None);
                };
                let is_manager = permission::is_manager(c, actor, role);
                let request_role = RequestRole::classify(is_manager, actor == target);
                let transition = Transition::resolve(workflow, request_role)?;
                c.remove_membership_request(target);
                Ok(Some(transition.event_kind()))
            })
            .await?;

        if let Some(kind) = kind {
            self.publish(kind, &saved.id, actor, target).await;
        }
        Ok(())
    }

    /// Manager withdraws an invitation they sent.
    pub async fn cancel_membership_invitation(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
    ) -> Result<(), WorkflowError> {
        self.apply_resolution(collaboration_id, actor, target, Transition::CancelInvitation)
            .await
    }

    /// Invitee declines an invitation.
    pub async fn decline_membership_invitation(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
    ) -> Result<(), WorkflowError> {
        self.apply_resolution(
            collaboration_id,
            actor,
            target,
            Transition::DeclineInvitation,
        )
        .await
    }

    /// Manager rejects a join request.
    pub async fn refuse_membership_request(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
    ) -> Result<(), WorkflowError> {
        self.apply_resolution(collaboration_id, actor, target, Transition::RefuseRequest)
            .await
    }

    /// Requester withdraws their own request.
    pub async fn cancel_membership_request(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
    ) -> Result<(), WorkflowError> {
        self.apply_resolution(collaboration_id, actor, target, Transition::CancelRequest)
            .await
    }

    /// Remove the pending request for `target` and emit the transition's
    /// topic. Role gating happens in [`resolve_membership_request`]; this
    /// only applies an already-selected transition. A pending request of
    /// the other workflow kind (or none at all) means the entry this
    /// transition was aimed at no longer exists: success, nothing removed,
    /// no event.
    ///
    /// [`resolve_membership_request`]: MembershipWorkflow::resolve_membership_request
    async fn apply_resolution(
        &self,
        collaboration_id: &CollaborationId,
        actor: &UserId,
        target: &UserId,
        transition: Transition,
    ) -> Result<(), WorkflowError> {
        let (saved, kind) = self
            .update(collaboration_id, |c| {
                let pending = c.membership_request_for(target).map(|r| r.workflow);
                if pending != Some(transition.workflow()) {
                    return Ok(None);
                }
                c.remove_membership_request(target);
                Ok(Some(transition.event_kind()))
            })
            .await?;

        if let Some(kind) = kind {
            self.publish(kind, &saved.id, actor, target).await;
        }
        Ok(())
    }

    async fn load(&self, id: &CollaborationId) -> Result<Collaboration, WorkflowError> {
        self.store
            .get_collaboration(id)
            .await
            .map_err(WorkflowError::from)
    }

    /// Load-validate-mutate-commit with bounded retries on stale writes.
    ///
    /// The closure runs against a fresh read on every attempt, so its
    /// validation always reflects the exact state the write is conditioned
    /// on. `Ok(None)` from the closure means nothing to do: idempotent
    /// success with no write and no event, and the unwritten aggregate is
    /// returned as read.
    async fn update<F>(
        &self,
        id: &CollaborationId,
        mut apply: F,
    ) -> Result<(Collaboration, Option<MembershipEventKind>), WorkflowError>
    where
        F: FnMut(&mut Collaboration) -> Result<Option<MembershipEventKind>, WorkflowError>,
    {
        let mut attempts = 0;
        loop {
            let mut collaboration = self.load(id).await?;
            let Some(kind) = apply(&mut collaboration)? else {
                return Ok((collaboration, None));
            };

            match self.store.update_collaboration(&collaboration).await {
                Ok(saved) => return Ok((saved, Some(kind))),
                Err(StoreError::Conflict) => {
                    attempts += 1;
                    if attempts >= MAX_UPDATE_ATTEMPTS {
                        return Err(WorkflowError::Store(StoreError::Conflict));
                    }
                    debug!(collaboration = %id, attempts, "stale aggregate read, retrying transition");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn publish(
        &self,
        kind: MembershipEventKind,
        collaboration_id: &CollaborationId,
        author: &UserId,
        target: &UserId,
    ) {
        let event = MembershipEvent {
            kind,
            collaboration_id: collaboration_id.clone(),
            author: author.clone(),
            target: target.clone(),
            occurred_at: Utc::now(),
        };
        debug!(
            topic = kind.topic(),
            collaboration = %event.collaboration_id,
            author = %event.author,
            target = %event.target,
            "membership transition committed"
        );
        if let Err(err) = self.events.publish(event).await {
            // The membership change is already committed; notification
            // delivery is not on the critical path.
            warn!(topic = kind.topic(), error = %err, "failed to publish membership event");
        }
    }
}
