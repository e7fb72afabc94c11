//! Core aggregate and domain event traits.

use chrono::{DateTime, Utc};
use common::Version;
use serde::Serialize;
use serde_json::{Map, Value};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync + Clone {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the identifier of the aggregate that raised the event.
    fn aggregate_id(&self) -> String;

    /// Returns when the event happened.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Returns the event data as a string-keyed map.
    fn payload(&self) -> Result<Map<String, Value>, serde_json::Error>;
}

/// Trait for state-stored aggregates that queue domain events.
///
/// An aggregate is a consistency boundary: it is mutated only through its own
/// operations, each of which bumps the version and queues the events that
/// describe the change. Callers drain the queue with [`Aggregate::take_events`]
/// after the aggregate has been persisted.
pub trait Aggregate: Send + Sync {
    /// The type of the aggregate identifier.
    type Id: std::fmt::Display;

    /// The type of events this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    fn id(&self) -> Self::Id;

    /// Returns the current version of the aggregate.
    fn version(&self) -> Version;

    /// Returns the events queued since the last drain, oldest first.
    fn pending_events(&self) -> &[Self::Event];

    /// Removes and returns the queued events, oldest first.
    ///
    /// Consuming: a second call without intervening mutations returns an
    /// empty list.
    fn take_events(&mut self) -> Vec<Self::Event>;
}
