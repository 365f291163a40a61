//! Event bus abstraction for atrium membership change notifications.
//!
//! This crate defines the EventBus trait that allows different
//! implementations for broadcasting workflow transitions to downstream
//! consumers (user notifications, activity streams, deferred-task
//! consumers):
//! - Memory (single server, tokio broadcast channels)
//! - Redis or Postgres LISTEN/NOTIFY for multi-replica deployments
//!
//! Publication is fire-and-forget from the workflow's point of view: a
//! failed publish never rolls back a committed membership change.

use async_trait::async_trait;
use atrium_storage::{CollaborationId, UserId};
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;

/// Kind of membership transition an event describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipEventKind {
    /// A user asked to join.
    RequestCreated,
    /// A manager invited a user.
    InvitationCreated,
    /// A pending request or invitation was consumed by a join.
    InvitationAccepted,
    /// A member was added with no pending negotiation (open self-join or
    /// manager force-add).
    MemberAdded,
    /// A member left or was removed.
    MemberLeft,
    /// A manager withdrew an invitation they sent.
    InvitationCancelled,
    /// The invitee declined.
    InvitationDeclined,
    /// A manager rejected a join request.
    RequestRefused,
    /// The requester withdrew their own request.
    RequestCancelled,
}

impl MembershipEventKind {
    /// Stable topic string for routing to notification consumers.
    pub fn topic(&self) -> &'static str {
        match self {
            MembershipEventKind::RequestCreated => "collaboration:membership:request:created",
            MembershipEventKind::InvitationCreated => {
                "collaboration:membership:invitation:created"
            }
            MembershipEventKind::InvitationAccepted => {
                "collaboration:membership:invitation:accept"
            }
            MembershipEventKind::MemberAdded => "collaboration:membership:member:added",
            MembershipEventKind::MemberLeft => "collaboration:membership:member:left",
            MembershipEventKind::InvitationCancelled => {
                "collaboration:membership:invitation:cancel"
            }
            MembershipEventKind::InvitationDeclined => {
                "collaboration:membership:invitation:decline"
            }
            MembershipEventKind::RequestRefused => "collaboration:membership:request:refuse",
            MembershipEventKind::RequestCancelled => "collaboration:membership:request:cancel",
        }
    }
}

/// Event emitted by a committed membership transition.
///
/// Carries everything a notification consumer needs to render a message:
/// who acted, who was affected, and on which collaboration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MembershipEvent {
    pub kind: MembershipEventKind,
    pub collaboration_id: CollaborationId,
    pub author: UserId,
    pub target: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Error type for event bus operations
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Stream of membership events
pub type EventStream = Pin<Box<dyn Stream<Item = MembershipEvent> + Send>>;

/// Event bus trait for publishing and subscribing to membership events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a membership event to all watchers of its collaboration.
    ///
    /// Called after the store write committed; the workflow treats failures
    /// as log-and-continue.
    async fn publish(&self, event: MembershipEvent) -> Result<(), EventBusError>;

    /// Subscribe to membership events for a collaboration.
    ///
    /// Returns a stream that yields events as they occur until dropped.
    async fn subscribe(
        &self,
        collaboration_id: &CollaborationId,
    ) -> Result<EventStream, EventBusError>;
}
