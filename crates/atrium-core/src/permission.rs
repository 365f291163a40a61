//! Pure permission predicates over a collaboration's type and membership.
//!
//! Nothing here mutates state or performs I/O. Resolving indirect
//! membership needs the member lists of nested collaborations; that lookup
//! is injected as a closure so callers decide how (and whether) to fetch
//! them; [`crate::MemberDirectory`] carries the store-backed helper.

use atrium_storage::{Collaboration, CollaborationId, MemberRef, UserId};

/// Caller-asserted role of the acting user, computed per call by the
/// transport's auth layer (e.g. a delegated-manager check). The creator is
/// treated as a manager regardless of what the caller asserts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorRole {
    Manager,
    Member,
}

/// Lookup capability resolving a nested collaboration's member list.
/// Returning `None` means the collaboration is unknown; the predicates
/// treat that as "not a member" rather than an error.
pub trait MemberLookup: Fn(&CollaborationId) -> Option<Vec<MemberRef>> {}

impl<F> MemberLookup for F where F: Fn(&CollaborationId) -> Option<Vec<MemberRef>> {}

/// True if `actor` appears directly in the member list.
pub fn is_member(collaboration: &Collaboration, actor: &MemberRef) -> bool {
    collaboration.is_direct_member(actor)
}

/// True if `actor` is a member of a collaboration that is itself a member
/// of `collaboration`. One hop only; deeper nesting does not count.
pub fn is_indirect_member(
    collaboration: &Collaboration,
    actor: &MemberRef,
    lookup: impl MemberLookup,
) -> bool {
    collaboration.nested_collaborations().any(|nested_id| {
        lookup(nested_id)
            .map(|members| members.contains(actor))
            .unwrap_or(false)
    })
}

/// Read capability: open and restricted collaborations are readable by
/// anyone within their domains; otherwise membership (direct or indirect)
/// is required.
pub fn can_read(
    collaboration: &Collaboration,
    actor: &MemberRef,
    lookup: impl MemberLookup,
) -> bool {
    collaboration.kind.is_publicly_visible()
        || is_member(collaboration, actor)
        || is_indirect_member(collaboration, actor, lookup)
}

/// Write capability: members only, regardless of collaboration type.
pub fn can_write(
    collaboration: &Collaboration,
    actor: &MemberRef,
    lookup: impl MemberLookup,
) -> bool {
    is_member(collaboration, actor) || is_indirect_member(collaboration, actor, lookup)
}

/// List-filtering capability; same policy as [`can_read`].
pub fn can_find(
    collaboration: &Collaboration,
    actor: &MemberRef,
    lookup: impl MemberLookup,
) -> bool {
    can_read(collaboration, actor, lookup)
}

/// True if `user` manages this collaboration: the creator always does, and
/// the transport may assert a delegated manager role per collaboration-type
/// rules.
pub fn is_manager(collaboration: &Collaboration, user: &UserId, role: ActorRole) -> bool {
    collaboration.is_creator(user) || role == ActorRole::Manager
}
