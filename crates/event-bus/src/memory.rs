use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{EventBusError, EventEnvelope, EventPublisher, Result};

/// In-memory event publisher for testing and embedding.
///
/// Keeps every published envelope in publication order. Cloning shares the
/// underlying buffer, so a test can hand one clone to the service and inspect
/// the other.
#[derive(Clone, Default)]
pub struct InMemoryEventPublisher {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    fail_on_publish: Arc<AtomicBool>,
}

impl InMemoryEventPublisher {
    /// Creates a new empty publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish call fail until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of published events.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns all published events in publication order.
    pub async fn published(&self) -> Vec<EventEnvelope> {
        self.events.read().await.clone()
    }

    /// Returns the published event types in publication order.
    pub async fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .await
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    /// Returns the events published for one aggregate.
    pub async fn events_for_aggregate(&self, aggregate_id: &str) -> Vec<EventEnvelope> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect()
    }

    /// Clears all published events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, envelope: EventEnvelope) -> Result<()> {
        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(EventBusError::Unavailable(
                "publisher configured to fail".to_string(),
            ));
        }

        tracing::debug!(
            event_type = %envelope.event_type,
            aggregate_id = %envelope.aggregate_id,
            "event published"
        );
        self.events.write().await.push(envelope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Version;
    use serde_json::Map;

    fn envelope(aggregate_id: &str, event_type: &str) -> EventEnvelope {
        EventEnvelope::builder()
            .event_type(event_type)
            .aggregate_id(aggregate_id)
            .aggregate_type("Campaign")
            .aggregate_version(Version::first())
            .payload_map(Map::new())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_publish_keeps_order() {
        let publisher = InMemoryEventPublisher::new();

        publisher.publish(envelope("a", "First")).await.unwrap();
        publisher.publish(envelope("a", "Second")).await.unwrap();
        publisher.publish(envelope("b", "Third")).await.unwrap();

        assert_eq!(publisher.event_count().await, 3);
        assert_eq!(
            publisher.event_types().await,
            vec!["First", "Second", "Third"]
        );
        assert_eq!(publisher.events_for_aggregate("a").await.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_publish() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail_on_publish(true);

        let result = publisher.publish(envelope("a", "First")).await;
        assert!(matches!(result, Err(EventBusError::Unavailable(_))));
        assert_eq!(publisher.event_count().await, 0);

        publisher.set_fail_on_publish(false);
        publisher.publish(envelope("a", "First")).await.unwrap();
        assert_eq!(publisher.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_buffer() {
        let publisher = InMemoryEventPublisher::new();
        let observer = publisher.clone();

        publisher.publish(envelope("a", "First")).await.unwrap();
        assert_eq!(observer.event_count().await, 1);

        observer.clear().await;
        assert_eq!(publisher.event_count().await, 0);
    }
}
