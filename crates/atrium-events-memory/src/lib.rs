//! In-memory event bus implementation using tokio broadcast channels.
//!
//! This implementation is suitable for:
//! - Single server deployments
//! - Development and testing
//!
//! Events are only broadcast within a single process. Deployments with
//! multiple replicas need a shared-backend implementation instead.

use async_trait::async_trait;
use atrium_events::{EventBus, EventBusError, EventStream, MembershipEvent};
use atrium_storage::CollaborationId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const CHANNEL_CAPACITY: usize = 100;

/// In-memory event bus with one broadcast channel per collaboration.
pub struct MemoryEventBus {
    channels: Arc<DashMap<CollaborationId, broadcast::Sender<MembershipEvent>>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
        }
    }

    fn get_or_create_channel(
        &self,
        collaboration_id: &CollaborationId,
    ) -> broadcast::Sender<MembershipEvent> {
        self.channels
            .entry(collaboration_id.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: MembershipEvent) -> Result<(), EventBusError> {
        let tx = self.get_or_create_channel(&event.collaboration_id);

        // Ignore error if no receivers (this is fine)
        let _ = tx.send(event);

        Ok(())
    }

    async fn subscribe(
        &self,
        collaboration_id: &CollaborationId,
    ) -> Result<EventStream, EventBusError> {
        let tx = self.get_or_create_channel(collaboration_id);
        let rx = tx.subscribe();

        // Drop lagged-receiver errors; a consumer that fell behind should
        // resync from the store.
        let stream = BroadcastStream::new(rx).filter_map(|result| result.ok());

        Ok(Box::pin(stream))
    }
}
