use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{EventId, Version};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EventBusError, Result};

/// Schema version stamped on every envelope produced by this crate.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// An event as it leaves the core: the domain payload plus the metadata a
/// consumer needs to route, order and deduplicate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (e.g., "CampaignActivated").
    pub event_type: String,

    /// The aggregate this event belongs to.
    pub aggregate_id: String,

    /// The type of aggregate (e.g., "Campaign").
    pub aggregate_type: String,

    /// The version of the aggregate after the mutation that raised this event.
    pub aggregate_version: Version,

    /// When the event happened.
    pub occurred_at: DateTime<Utc>,

    /// Schema version of the payload.
    pub event_version: u32,

    /// The event payload as a string-keyed map.
    pub payload: Map<String, Value>,

    /// Additional metadata about the event.
    pub metadata: HashMap<String, Value>,
}

impl EventEnvelope {
    /// Creates a new event envelope builder.
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }
}

/// Builder for constructing event envelopes.
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<String>,
    aggregate_type: Option<String>,
    aggregate_version: Option<Version>,
    occurred_at: Option<DateTime<Utc>>,
    payload: Option<Map<String, Value>>,
    metadata: HashMap<String, Value>,
}

impl EventEnvelopeBuilder {
    /// Sets the event ID. If not set, a new ID will be generated.
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Sets the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the aggregate ID.
    pub fn aggregate_id(mut self, id: impl ToString) -> Self {
        self.aggregate_id = Some(id.to_string());
        self
    }

    /// Sets the aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Sets the aggregate version.
    pub fn aggregate_version(mut self, version: Version) -> Self {
        self.aggregate_version = Some(version);
        self
    }

    /// Sets the occurrence time. If not set, the current time will be used.
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Sets the payload from a serializable value.
    ///
    /// The value must serialize to a JSON object.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(map) => {
                self.payload = Some(map);
                Ok(self)
            }
            other => Err(EventBusError::PayloadNotAnObject(json_kind(&other))),
        }
    }

    /// Sets the payload from a raw JSON map.
    pub fn payload_map(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the event envelope, failing on the first missing required field.
    pub fn build(self) -> Result<EventEnvelope> {
        Ok(EventEnvelope {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self
                .event_type
                .ok_or(EventBusError::MissingField("event_type"))?,
            aggregate_id: self
                .aggregate_id
                .ok_or(EventBusError::MissingField("aggregate_id"))?,
            aggregate_type: self
                .aggregate_type
                .ok_or(EventBusError::MissingField("aggregate_type"))?,
            aggregate_version: self
                .aggregate_version
                .ok_or(EventBusError::MissingField("aggregate_version"))?,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            event_version: EVENT_SCHEMA_VERSION,
            payload: self.payload.ok_or(EventBusError::MissingField("payload"))?,
            metadata: self.metadata,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
