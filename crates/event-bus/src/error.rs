use thiserror::Error;

/// Errors that can occur when building or publishing events.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// A required envelope field was never set on the builder.
    #[error("Envelope field is required: {0}")]
    MissingField(&'static str),

    /// The event payload could not be turned into a JSON map.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The event payload serialized to something other than a JSON object.
    #[error("Event payload must be a JSON object, got {0}")]
    PayloadNotAnObject(&'static str),

    /// The transport refused or could not accept the event.
    #[error("Event transport unavailable: {0}")]
    Unavailable(String),
}

/// Result type for event bus operations.
pub type Result<T> = std::result::Result<T, EventBusError>;
