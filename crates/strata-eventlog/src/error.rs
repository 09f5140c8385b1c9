use crate::version::{ExpectedVersion, Version};

/// Errors produced by event log operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventLogError {
    /// The stream's actual version did not match the commit's expectation:
    /// another writer interleaved. Never retried inside this core.
    #[error("concurrency conflict on stream {stream_name}: expected {expected}, actual {actual}")]
    ConcurrencyConflict {
        stream_name: String,
        expected: ExpectedVersion,
        actual: Version,
    },

    /// A commit must carry at least one event; empty command results are
    /// short-circuited before reaching the store.
    #[error("refusing to commit zero events to stream {stream_name}")]
    EmptyCommit { stream_name: String },

    /// A stored payload could not be mapped to the domain event set.
    #[error("event normalization failed: {0}")]
    Normalization(String),
}
