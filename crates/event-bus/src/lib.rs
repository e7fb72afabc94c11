pub mod envelope;
pub mod error;
pub mod memory;
pub mod publisher;

pub use common::{EventId, Version};
pub use envelope::{EVENT_SCHEMA_VERSION, EventEnvelope, EventEnvelopeBuilder};
pub use error::{EventBusError, Result};
pub use memory::InMemoryEventPublisher;
pub use publisher::EventPublisher;
