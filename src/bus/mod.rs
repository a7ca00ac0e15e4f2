//! Message Bus Module
//!
//! Publish/subscribe capability used to fan invalidation messages out to
//! sibling cache instances.
//!
//! The bus is deliberately weak: delivery is at-least-once, fire-and-forget,
//! unordered across publishers, and may include the publisher itself.
//! Subscribed handlers must therefore be idempotent. Two implementations are
//! provided:
//! - [`LocalBus`]: synchronous in-process fan-out, suitable for tests and
//!   single-process deployments
//! - [`BroadcastBus`]: tokio broadcast channels with per-subscriber dispatch
//!   tasks, delivering asynchronously

mod broadcast;
mod local;

pub use broadcast::BroadcastBus;
pub use local::LocalBus;

/// Payload carried on a topic. Invalidation messages are a JSON array of
/// keys (delete) or null (reset).
pub type Payload = serde_json::Value;

/// Subscription callback. Runs whenever a payload arrives on the subscribed
/// topic; may fire at arbitrary times relative to local cache operations.
pub type Handler = Box<dyn Fn(Payload) + Send + Sync>;

// == Message Bus Trait ==
/// Minimal publish/subscribe capability.
///
/// Implementations own all delivery guarantees; publishers never learn
/// whether anyone received a message.
pub trait MessageBus: Send + Sync {
    /// Publishes a payload to every subscriber of `topic`. Never blocks on
    /// delivery.
    fn publish(&self, topic: &str, payload: Payload);

    /// Registers a handler for `topic`. Handlers are retained for the life
    /// of the bus.
    fn subscribe(&self, topic: &str, handler: Handler);
}
