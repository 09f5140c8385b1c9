//! In-memory event store for tests, local demos, and embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::envelope::{EventData, EventEnvelope, EventStream};
use crate::error::EventLogError;
use crate::store::{CommitResult, EventStore};
use crate::stream::{EventStreamName, StreamSelector};
use crate::version::{ExpectedVersion, SequenceNumber, Version};

/// In-memory [`EventStore`] implementation.
///
/// All events live in one global, sequence-ordered log; per-stream views are
/// index lists into it. The single `RwLock` makes every commit's
/// read-check-append atomic with respect to all streams.
#[derive(Default)]
pub struct InMemoryEventStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    log: Vec<EventEnvelope>,
    streams: HashMap<EventStreamName, Vec<usize>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn commit(
        &self,
        stream_name: &EventStreamName,
        events: Vec<EventData>,
        expected_version: ExpectedVersion,
    ) -> Result<CommitResult, EventLogError> {
        if events.is_empty() {
            return Err(EventLogError::EmptyCommit {
                stream_name: stream_name.to_string(),
            });
        }

        let mut state = self.inner.write().expect("event store lock poisoned");
        let stream = state.streams.entry(stream_name.clone()).or_default();
        let actual = Version(stream.len() as u64);
        if !expected_version.matches(actual) {
            debug!(stream = %stream_name, %expected_version, %actual, "commit rejected");
            return Err(EventLogError::ConcurrencyConflict {
                stream_name: stream_name.to_string(),
                expected: expected_version,
                actual,
            });
        }

        let mut version = actual;
        let count = events.len();
        let mut indices = Vec::with_capacity(count);
        let base = state.log.len();
        for (offset, event) in events.into_iter().enumerate() {
            version = version.next();
            indices.push(base + offset);
            let envelope = EventEnvelope {
                stream_name: stream_name.clone(),
                event,
                version,
                sequence_number: SequenceNumber((base + offset) as u64 + 1),
            };
            state.log.push(envelope);
        }
        state
            .streams
            .get_mut(stream_name)
            .expect("stream entry created above")
            .extend(indices);

        let highest = SequenceNumber((base + count) as u64);
        debug!(stream = %stream_name, events = count, highest = %highest, "committed");
        Ok(CommitResult {
            highest_committed_sequence_number: highest,
        })
    }

    fn load(&self, selector: &StreamSelector) -> EventStream {
        let state = self.inner.read().expect("event store lock poisoned");
        let envelopes = match selector {
            StreamSelector::All => state.log.clone(),
            StreamSelector::Stream(name) => state
                .streams
                .get(name)
                .map(|indices| indices.iter().map(|&i| state.log[i].clone()).collect())
                .unwrap_or_default(),
        };
        EventStream::new(envelopes)
    }

    fn last_sequence_number(&self) -> Option<SequenceNumber> {
        let state = self.inner.read().expect("event store lock poisoned");
        state.log.last().map(|envelope| envelope.sequence_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::ContentStreamId;

    fn stream(id: &str) -> EventStreamName {
        EventStreamName::ContentStream(ContentStreamId::new(id).unwrap())
    }

    fn event(label: &str) -> EventData {
        EventData {
            event_type: label.into(),
            payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn commit_assigns_stream_versions_and_global_sequence() {
        let store = InMemoryEventStore::new();
        store
            .commit(&stream("a"), vec![event("e1")], ExpectedVersion::NoStream)
            .unwrap();
        let result = store
            .commit(
                &stream("b"),
                vec![event("e2"), event("e3")],
                ExpectedVersion::NoStream,
            )
            .unwrap();
        assert_eq!(result.highest_committed_sequence_number, SequenceNumber(3));

        let b = store.load(&StreamSelector::Stream(stream("b")));
        let versions: Vec<u64> = b.iter().map(|e| e.version.value()).collect();
        assert_eq!(versions, vec![1, 2]);
        let sequences: Vec<u64> = b.iter().map(|e| e.sequence_number.value()).collect();
        assert_eq!(sequences, vec![2, 3]);
    }

    #[test]
    fn version_mismatch_is_a_concurrency_conflict_and_writes_nothing() {
        let store = InMemoryEventStore::new();
        store
            .commit(&stream("a"), vec![event("e1")], ExpectedVersion::NoStream)
            .unwrap();

        let error = store
            .commit(&stream("a"), vec![event("e2")], ExpectedVersion::NoStream)
            .unwrap_err();
        assert!(matches!(error, EventLogError::ConcurrencyConflict { .. }));
        assert_eq!(store.load(&StreamSelector::Stream(stream("a"))).len(), 1);
    }

    #[test]
    fn same_expected_version_admits_exactly_one_writer() {
        let store = InMemoryEventStore::new();
        store
            .commit(&stream("a"), vec![event("e1")], ExpectedVersion::NoStream)
            .unwrap();

        let expectation = ExpectedVersion::Exactly(Version(1));
        let first = store.commit(&stream("a"), vec![event("w1")], expectation);
        let second = store.commit(&stream("a"), vec![event("w2")], expectation);
        assert!(first.is_ok());
        assert!(matches!(
            second,
            Err(EventLogError::ConcurrencyConflict { .. })
        ));

        let events: Vec<String> = store
            .load(&StreamSelector::Stream(stream("a")))
            .iter()
            .map(|e| e.event.event_type.clone())
            .collect();
        assert_eq!(events, vec!["e1", "w1"]);
    }

    #[test]
    fn virtual_stream_reads_union_in_global_order() {
        let store = InMemoryEventStore::new();
        store
            .commit(&stream("a"), vec![event("a1")], ExpectedVersion::Any)
            .unwrap();
        store
            .commit(&stream("b"), vec![event("b1")], ExpectedVersion::Any)
            .unwrap();
        store
            .commit(
                &stream("a"),
                vec![event("a2")],
                ExpectedVersion::Exactly(Version(1)),
            )
            .unwrap();

        let all: Vec<String> = store
            .load(&StreamSelector::All)
            .iter()
            .map(|e| e.event.event_type.clone())
            .collect();
        assert_eq!(all, vec!["a1", "b1", "a2"]);
        assert_eq!(store.last_sequence_number(), Some(SequenceNumber(3)));
    }

    #[test]
    fn empty_commit_is_rejected() {
        let store = InMemoryEventStore::new();
        assert!(matches!(
            store.commit(&stream("a"), Vec::new(), ExpectedVersion::Any),
            Err(EventLogError::EmptyCommit { .. })
        ));
    }
}
