//! Local Bus
//!
//! Synchronous in-process message bus. Publishing invokes every subscribed
//! handler inline before returning, which makes delivery deterministic in
//! tests and lets a single process host several cooperating cache instances
//! without a broker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::bus::{Handler, MessageBus, Payload};

// == Local Bus ==
/// In-process bus that fans each publish out to all subscribers of the
/// topic, including the publisher's own subscriptions.
#[derive(Default)]
pub struct LocalBus {
    /// Handlers by topic
    topics: Mutex<HashMap<String, Vec<Arc<Handler>>>>,
}

impl LocalBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageBus for LocalBus {
    fn publish(&self, topic: &str, payload: Payload) {
        // Snapshot the handler list so the topic table is not locked while
        // handlers run; a handler may itself publish or subscribe.
        let handlers: Vec<Arc<Handler>> = {
            let topics = self.topics.lock().unwrap();
            match topics.get(topic) {
                Some(handlers) => handlers.clone(),
                None => return,
            }
        };

        debug!(topic, subscribers = handlers.len(), "delivering message");
        for handler in handlers {
            handler(payload.clone());
        }
    }

    fn subscribe(&self, topic: &str, handler: Handler) {
        let mut topics = self.topics.lock().unwrap();
        topics
            .entry(topic.to_string())
            .or_default()
            .push(Arc::new(handler));
    }
}
