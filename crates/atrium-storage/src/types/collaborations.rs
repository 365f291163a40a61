//! Collaboration aggregate types.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{
    CollaborationId, DomainId, Member, MemberRef, MembershipRequest, UserId, Workflow,
};

/// Visibility type of a collaboration.
///
/// The type value may be changed by a manager at any time; changing it never
/// retroactively invalidates existing members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollaborationType {
    Open,
    Restricted,
    Private,
    Confidential,
}

/// Error type for parsing CollaborationType from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCollaborationTypeError(pub String);

impl std::fmt::Display for ParseCollaborationTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid collaboration type: {}", self.0)
    }
}

impl std::error::Error for ParseCollaborationTypeError {}

impl FromStr for CollaborationType {
    type Err = ParseCollaborationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CollaborationType::Open),
            "restricted" => Ok(CollaborationType::Restricted),
            "private" => Ok(CollaborationType::Private),
            "confidential" => Ok(CollaborationType::Confidential),
            _ => Err(ParseCollaborationTypeError(s.to_string())),
        }
    }
}

impl CollaborationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationType::Open => "open",
            CollaborationType::Restricted => "restricted",
            CollaborationType::Private => "private",
            CollaborationType::Confidential => "confidential",
        }
    }

    /// Open and restricted collaborations are readable by anyone within
    /// their domains; private and confidential ones only by members.
    pub fn is_publicly_visible(&self) -> bool {
        matches!(self, CollaborationType::Open | CollaborationType::Restricted)
    }
}

/// Collaboration record: a shared space (community/project) with typed
/// visibility, a member set and pending membership negotiations.
///
/// The aggregate is the transactional boundary: `members` and
/// `membership_requests` are mutated only on a loaded value and persisted
/// through [`crate::CollaborationStore::update_collaboration`], which checks
/// `revision` so no interleaving writer can be lost.
#[derive(Clone, Debug)]
pub struct Collaboration {
    pub id: CollaborationId,
    pub kind: CollaborationType,
    pub title: String,
    pub creator: UserId,
    pub domain_ids: Vec<DomainId>,
    pub members: Vec<Member>,
    pub membership_requests: Vec<MembershipRequest>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collaboration {
    /// True if `user` created this collaboration.
    pub fn is_creator(&self, user: &UserId) -> bool {
        self.creator == *user
    }

    /// True if `member` appears in the member list.
    pub fn is_direct_member(&self, member: &MemberRef) -> bool {
        self.members.iter().any(|m| m.member == *member)
    }

    /// The pending membership request for `user`, if any.
    pub fn membership_request_for(&self, user: &UserId) -> Option<&MembershipRequest> {
        self.membership_requests.iter().find(|r| r.user == *user)
    }

    /// IDs of members that are themselves collaborations.
    pub fn nested_collaborations(&self) -> impl Iterator<Item = &CollaborationId> {
        self.members.iter().filter_map(|m| match &m.member {
            MemberRef::Collaboration(id) => Some(id),
            MemberRef::User(_) => None,
        })
    }

    /// Append a member, preserving the no-duplicates invariant.
    ///
    /// Returns false (and leaves the list untouched) if the tuple is already
    /// present.
    pub fn push_member(&mut self, member: MemberRef, joined_at: DateTime<Utc>) -> bool {
        if self.is_direct_member(&member) {
            return false;
        }
        self.members.push(Member { member, joined_at });
        true
    }

    /// Remove a member, returning the removed record if it was present.
    pub fn remove_member(&mut self, member: &MemberRef) -> Option<Member> {
        let position = self.members.iter().position(|m| m.member == *member)?;
        Some(self.members.remove(position))
    }

    /// Insert or replace the pending request for `user` (at most one per
    /// user).
    pub fn put_membership_request(&mut self, user: UserId, workflow: Workflow) {
        self.membership_requests.retain(|r| r.user != user);
        self.membership_requests.push(MembershipRequest {
            user,
            workflow,
            created_at: Utc::now(),
        });
    }

    /// Remove the pending request for `user`, returning it if it existed.
    pub fn remove_membership_request(&mut self, user: &UserId) -> Option<MembershipRequest> {
        let position = self
            .membership_requests
            .iter()
            .position(|r| r.user == *user)?;
        Some(self.membership_requests.remove(position))
    }
}

/// Parameters for creating a collaboration.
///
/// The store seeds `members` with the creator as first member and starts
/// with no pending requests.
#[derive(Clone, Debug)]
pub struct CreateCollaborationParams {
    pub kind: CollaborationType,
    pub title: String,
    pub creator: UserId,
    pub domain_ids: Vec<DomainId>,
}
