//! Event bus abstraction for handing ledger events to other bounded contexts.
//!
//! ```text
//! aggregate call ─► repository save (event store, source of truth)
//!                          │
//!                          ▼
//!                   publish to bus ─► notifications, credit scoring, analytics
//! ```
//!
//! # Key Principles
//!
//! - **Store first**: events are published only after the write committed
//! - **At-least-once delivery**: subscribers must be idempotent
//! - **Ordered per aggregate**: events of one aggregate keep their order
//!
//! # Topic Naming Convention
//!
//! Topics follow the pattern `{aggregate-type}-events`:
//! - `wallet-events`
//! - `circle-events`

use crate::event::SerializedEvent;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// Topic not found or invalid
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
}

/// Stream of events from subscriptions.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<SerializedEvent, EventBusError>> + Send>>;

/// Publish/subscribe transport for serialized events.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so implementations can be held
/// as `Arc<dyn EventBus>`.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish operation fails.
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Subscribe to one or more topics and receive a stream of events.
    ///
    /// Only events published after the subscription are delivered.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if subscription fails.
    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_failed_names_topic() {
        let error = EventBusError::PublishFailed {
            topic: "wallet-events".to_string(),
            reason: "broker unavailable".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("wallet-events"));
        assert!(display.contains("broker unavailable"));
    }
}
