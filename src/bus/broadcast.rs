//! Broadcast Bus
//!
//! Message bus built on tokio broadcast channels. Each topic maps to one
//! channel; every subscription runs its handler on a dedicated dispatch
//! task, so delivery is asynchronous with respect to the publisher.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::bus::{Handler, MessageBus, Payload};

/// Default per-topic channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

// == Broadcast Bus ==
/// Tokio-backed bus with one broadcast channel per topic.
///
/// Subscriptions spawn a dispatch task, so [`BroadcastBus::subscribe`] must
/// be called from within a tokio runtime. A slow subscriber that falls more
/// than the channel capacity behind loses the oldest messages; the protocol
/// is best-effort, so lagging is logged and tolerated.
pub struct BroadcastBus {
    /// Channel capacity applied to newly created topics
    capacity: usize,
    /// Senders by topic; created lazily on first publish or subscribe
    topics: Mutex<HashMap<String, broadcast::Sender<Payload>>>,
}

impl BroadcastBus {
    /// Creates a bus with the default per-topic capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus with an explicit per-topic channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the sender for a topic, creating the channel on first use.
    fn sender(&self, topic: &str) -> broadcast::Sender<Payload> {
        let mut topics = self.topics.lock().unwrap();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for BroadcastBus {
    fn publish(&self, topic: &str, payload: Payload) {
        // Err means no live subscribers, which is fine for fire-and-forget.
        match self.sender(topic).send(payload) {
            Ok(receivers) => debug!(topic, receivers, "message published"),
            Err(_) => debug!(topic, "message published with no subscribers"),
        }
    }

    fn subscribe(&self, topic: &str, handler: Handler) {
        let mut rx = self.sender(topic).subscribe();
        let topic = topic.to_string();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => handler(payload),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(topic = %topic, missed, "subscriber lagged; messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_subscriber_receives_published_payload() {
        let bus = BroadcastBus::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = received.clone();
        bus.subscribe(
            "users:lruCache:del",
            Box::new(move |payload| sink.lock().unwrap().push(payload)),
        );

        bus.publish("users:lruCache:del", json!(["a"]));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let received = received.lock().unwrap();
        assert_eq!(received.as_slice(), &[json!(["a"])]);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_panic() {
        let bus = BroadcastBus::new();
        bus.publish("users:lruCache:reset", Payload::Null);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let bus = BroadcastBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            bus.subscribe(
                "users:lruCache:reset",
                Box::new(move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        bus.publish("users:lruCache:reset", Payload::Null);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let bus = BroadcastBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        bus.subscribe(
            "users:lruCache:del",
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.publish("sessions:lruCache:del", json!(["x"]));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
