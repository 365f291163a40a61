//! Member types.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{CollaborationId, UserId};

/// Kind of object a collaboration member can be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    User,
    Collaboration,
}

/// Error type for parsing MemberKind from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMemberKindError(pub String);

impl std::fmt::Display for ParseMemberKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid member kind: {}", self.0)
    }
}

impl std::error::Error for ParseMemberKindError {}

impl FromStr for MemberKind {
    type Err = ParseMemberKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MemberKind::User),
            "collaboration" => Ok(MemberKind::Collaboration),
            _ => Err(ParseMemberKindError(s.to_string())),
        }
    }
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::User => "user",
            MemberKind::Collaboration => "collaboration",
        }
    }
}

/// A collaboration member which can be a single user or another
/// collaboration.
///
/// The `Collaboration` variant expresses nested membership: members of the
/// inner collaboration count as indirect members of the outer one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberRef {
    User(UserId),
    Collaboration(CollaborationId),
}

impl MemberRef {
    /// Return the kind of this member.
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberRef::User(_) => MemberKind::User,
            MemberRef::Collaboration(_) => MemberKind::Collaboration,
        }
    }

    /// Return true if this member is itself a collaboration.
    pub fn is_collaboration(&self) -> bool {
        matches!(self, MemberRef::Collaboration(_))
    }

    /// Return true if this member is a single user.
    pub fn is_user(&self) -> bool {
        !self.is_collaboration()
    }
}

/// Filter over member kinds for directory listings.
///
/// Supports negation: `"!user"` parses to `Excluding(User)`, meaning
/// "everything except users".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKindFilter {
    Only(MemberKind),
    Excluding(MemberKind),
}

impl MemberKindFilter {
    /// Check whether a member kind passes this filter.
    pub fn matches(&self, kind: MemberKind) -> bool {
        match self {
            MemberKindFilter::Only(k) => *k == kind,
            MemberKindFilter::Excluding(k) => *k != kind,
        }
    }
}

impl FromStr for MemberKindFilter {
    type Err = ParseMemberKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('!') {
            Some(rest) => Ok(MemberKindFilter::Excluding(rest.parse()?)),
            None => Ok(MemberKindFilter::Only(s.parse()?)),
        }
    }
}

/// Member record. Insertion order in `Collaboration::members` is join order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub member: MemberRef,
    pub joined_at: DateTime<Utc>,
}
