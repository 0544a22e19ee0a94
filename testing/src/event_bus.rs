//! In-memory event bus that records everything published to it.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use hustlex_core::event::SerializedEvent;
use hustlex_core::event_bus::{EventBus, EventBusError, EventStream};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

type Subscriber = (Vec<String>, mpsc::UnboundedSender<SerializedEvent>);

#[derive(Debug, Default)]
struct Inner {
    published: HashMap<String, Vec<SerializedEvent>>,
    subscribers: Vec<Subscriber>,
    fail_publishes: bool,
}

/// [`EventBus`] that keeps every published event per topic and fans events out
/// to live subscribers.
///
/// # Example
///
/// ```
/// use hustlex_testing::InMemoryEventBus;
/// use hustlex_core::event_bus::EventBus;
/// use hustlex_core::event::SerializedEvent;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryEventBus::new();
/// let event = SerializedEvent::new("WalletCredited.v1".to_string(), vec![], None);
/// bus.publish("wallet-events", &event).await?;
/// assert_eq!(bus.published_types("wallet-events"), vec!["WalletCredited.v1"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventBus {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail with `PublishFailed`.
    pub fn fail_publishes(&self, fail: bool) {
        self.inner.write().unwrap().fail_publishes = fail;
    }

    /// Events published to `topic`, oldest first.
    #[must_use]
    pub fn published(&self, topic: &str) -> Vec<SerializedEvent> {
        self.inner
            .read()
            .unwrap()
            .published
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Event type names published to `topic`, oldest first.
    #[must_use]
    pub fn published_types(&self, topic: &str) -> Vec<String> {
        self.published(topic)
            .into_iter()
            .map(|event| event.event_type)
            .collect()
    }

    /// Total number of events published across all topics.
    #[must_use]
    pub fn total_published(&self) -> usize {
        self.inner.read().unwrap().published.values().map(Vec::len).sum()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            if inner.fail_publishes {
                return Err(EventBusError::PublishFailed {
                    topic,
                    reason: "simulated broker failure".to_string(),
                });
            }

            // Drop subscribers whose stream was dropped.
            inner.subscribers.retain(|(topics, sender)| {
                !topics.contains(&topic) || sender.send(event.clone()).is_ok()
            });
            inner.published.entry(topic).or_default().push(event);
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|t| (*t).to_string()).collect();
        Box::pin(async move {
            if topics.is_empty() {
                return Err(EventBusError::SubscriptionFailed {
                    topics,
                    reason: "no topics given".to_string(),
                });
            }

            let (sender, mut receiver) = mpsc::unbounded_channel();
            self.inner.write().unwrap().subscribers.push((topics, sender));

            let stream: EventStream = Box::pin(async_stream::stream! {
                while let Some(event) = receiver.recv().await {
                    yield Ok(event);
                }
            });
            Ok(stream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn event(name: &str) -> SerializedEvent {
        SerializedEvent::new(name.to_string(), vec![], None)
    }

    #[tokio::test]
    async fn subscribers_receive_only_their_topics() {
        let bus = InMemoryEventBus::new();
        let mut wallet_stream = bus.subscribe(&["wallet-events"]).await.unwrap();

        bus.publish("circle-events", &event("CircleCreated.v1")).await.unwrap();
        bus.publish("wallet-events", &event("WalletCredited.v1")).await.unwrap();

        let received = wallet_stream.next().await.unwrap().unwrap();
        assert_eq!(received.event_type, "WalletCredited.v1");
        assert_eq!(bus.total_published(), 2);
    }

    #[tokio::test]
    async fn failing_bus_records_nothing() {
        let bus = InMemoryEventBus::new();
        bus.fail_publishes(true);

        let result = bus.publish("wallet-events", &event("WalletDebited.v1")).await;
        assert!(matches!(result, Err(EventBusError::PublishFailed { .. })));
        assert!(bus.published("wallet-events").is_empty());
    }

    #[tokio::test]
    async fn subscribe_without_topics_fails() {
        let bus = InMemoryEventBus::new();
        assert!(bus.subscribe(&[]).await.is_err());
    }
}
