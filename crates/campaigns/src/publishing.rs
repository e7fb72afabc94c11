//! Conversion of recorded domain events into published envelopes.

use common::Version;
use domain::{Aggregate, DomainEvent};
use event_bus::{EventEnvelope, Result};

/// Value of the `source` metadata entry on every envelope.
pub const EVENT_SOURCE: &str = "campaigns";

/// Builds one envelope per event, in append order.
///
/// `aggregate` must be the state after the events were recorded: the last
/// event gets the aggregate's current version and each earlier one the
/// version before it.
pub fn envelopes_for<A: Aggregate>(
    aggregate: &A,
    events: &[A::Event],
) -> Result<Vec<EventEnvelope>> {
    let last = aggregate.version().as_i64();
    let first = last - events.len() as i64 + 1;

    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            EventEnvelope::builder()
                .event_type(event.event_type())
                .aggregate_id(event.aggregate_id())
                .aggregate_type(A::aggregate_type())
                .aggregate_version(Version::new(first + index as i64))
                .occurred_at(event.occurred_at())
                .payload_map(event.payload()?)
                .metadata("source", EVENT_SOURCE.into())
                .build()
        })
        .collect()
}
