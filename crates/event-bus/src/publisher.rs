use async_trait::async_trait;

use crate::{EventEnvelope, Result};

/// Outbound port for delivering domain events to other components.
///
/// Publishing is best-effort from the caller's point of view: the durable
/// state change has already happened by the time an event is handed over.
/// Implementations must deliver events of one aggregate in the order they are
/// published.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a single event.
    async fn publish(&self, envelope: EventEnvelope) -> Result<()>;
}
