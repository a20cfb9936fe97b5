//! In-process realtime event hub.
//!
//! Each user gets a broadcast channel; handlers publish `new-message` /
//! `new-notification` events into it and the SSE endpoint streams them
//! out.  Delivery is fire-and-forget: publishing to a user with no open
//! stream drops the event.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Capacity of each per-user channel.  A slow consumer past this lags and
/// loses the oldest events.
const CHANNEL_CAPACITY: usize = 64;

/// A realtime event destined for one user.
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    /// Event name, e.g. `"new-message"`.
    pub name: &'static str,
    pub payload: Value,
}

#[derive(Clone, Default)]
pub struct EventHub {
    channels: Arc<RwLock<HashMap<Uuid, broadcast::Sender<RealtimeEvent>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a user's event stream, creating the channel on first
    /// use.
    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<RealtimeEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Deliver an event to a user's subscribers, if any.
    pub async fn publish(&self, user_id: Uuid, name: &'static str, payload: Value) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(&user_id) {
            let delivered = sender
                .send(RealtimeEvent { name, payload })
                .unwrap_or(0);
            debug!(user = %user_id, event = name, delivered, "published realtime event");
        }
    }

    /// Drop channels that no longer have any subscriber.
    pub async fn purge_idle(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_subscribers() {
        let hub = EventHub::new();
        let user = Uuid::new_v4();

        let mut rx = hub.subscribe(user).await;
        hub.publish(user, "new-message", serde_json::json!({ "content": "hi" }))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "new-message");
        assert_eq!(event.payload["content"], "hi");
    }

    #[tokio::test]
    async fn publish_without_subscriber_is_dropped() {
        let hub = EventHub::new();
        // No subscriber; nothing to assert beyond "does not panic".
        hub.publish(Uuid::new_v4(), "new-notification", Value::Null)
            .await;
    }

    #[tokio::test]
    async fn events_are_per_user() {
        let hub = EventHub::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut alice_rx = hub.subscribe(alice).await;
        let mut bob_rx = hub.subscribe(bob).await;

        hub.publish(alice, "new-notification", Value::Null).await;

        assert!(alice_rx.recv().await.is_ok());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn purge_drops_unwatched_channels() {
        let hub = EventHub::new();
        let user = Uuid::new_v4();

        let rx = hub.subscribe(user).await;
        hub.purge_idle().await;
        assert_eq!(hub.channels.read().await.len(), 1);

        drop(rx);
        hub.purge_idle().await;
        assert!(hub.channels.read().await.is_empty());
    }
}
