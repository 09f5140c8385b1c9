//! The storage-neutral event envelope.

use serde::{Deserialize, Serialize};

use crate::stream::EventStreamName;
use crate::version::{SequenceNumber, Version};

/// A domain event in storage-neutral form: a type tag plus a JSON payload.
///
/// The store never interprets the payload; see
/// [`EventNormalizer`](crate::event::EventNormalizer) for the mapping to the
/// domain [`Event`](crate::event::Event) set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// A committed event together with its position metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct EventEnvelope {
    pub stream_name: EventStreamName,
    pub event: EventData,
    /// Per-stream version of this event (1 for the first event of a stream).
    pub version: Version,
    /// Global position across all streams.
    pub sequence_number: SequenceNumber,
}

/// An ordered slice of committed events.
#[derive(Clone, Debug, Default)]
pub struct EventStream {
    envelopes: Vec<EventEnvelope>,
}

impl EventStream {
    pub fn new(envelopes: Vec<EventEnvelope>) -> Self {
        Self { envelopes }
    }

    /// Keep only events at or above the given global sequence number.
    pub fn with_minimum_sequence_number(self, minimum: SequenceNumber) -> Self {
        Self {
            envelopes: self
                .envelopes
                .into_iter()
                .filter(|envelope| envelope.sequence_number >= minimum)
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.envelopes.iter()
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }
}

impl IntoIterator for EventStream {
    type Item = EventEnvelope;
    type IntoIter = std::vec::IntoIter<EventEnvelope>;

    fn into_iter(self) -> Self::IntoIter {
        self.envelopes.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventStream {
    type Item = &'a EventEnvelope;
    type IntoIter = std::slice::Iter<'a, EventEnvelope>;

    fn into_iter(self) -> Self::IntoIter {
        self.envelopes.iter()
    }
}
