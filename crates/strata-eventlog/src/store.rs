//! The [`EventStore`] trait defining the event log boundary.

use crate::envelope::{EventData, EventStream};
use crate::error::EventLogError;
use crate::stream::{EventStreamName, StreamSelector};
use crate::version::{ExpectedVersion, SequenceNumber};

/// Result of a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitResult {
    /// Global position of the last event written by this commit.
    pub highest_committed_sequence_number: SequenceNumber,
}

/// Storage backend for the append-only event log.
///
/// Implementations must be thread-safe (`Send + Sync`) and must make the
/// read-check-append of [`commit`](EventStore::commit) linearizable per
/// stream: for concurrent commits against the same stream with the same
/// expectation, at most one succeeds.
pub trait EventStore: Send + Sync {
    /// Append `events` to `stream_name`, provided the stream's current
    /// version satisfies `expected_version`.
    ///
    /// Fails with [`EventLogError::ConcurrencyConflict`] on a version
    /// mismatch; nothing is written in that case (append is all-or-nothing).
    fn commit(
        &self,
        stream_name: &EventStreamName,
        events: Vec<EventData>,
        expected_version: ExpectedVersion,
    ) -> Result<CommitResult, EventLogError>;

    /// Load committed events.
    ///
    /// An unknown stream loads as empty; absence is not an error at this
    /// boundary.
    fn load(&self, selector: &StreamSelector) -> EventStream;

    /// Global position of the most recently committed event, or `None` for an
    /// empty log.
    fn last_sequence_number(&self) -> Option<SequenceNumber>;
}
