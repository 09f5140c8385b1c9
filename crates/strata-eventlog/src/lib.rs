//! Append-only event log for Strata.
//!
//! This crate provides:
//! - Stream naming and selection ([`EventStreamName`], [`StreamSelector`])
//! - Versioning primitives ([`SequenceNumber`], [`Version`], [`ExpectedVersion`])
//! - The storage-neutral envelope ([`EventData`], [`EventEnvelope`])
//! - The [`EventStore`] trait and [`InMemoryEventStore`] implementation with
//!   linearizable per-stream read-check-append
//! - The closed domain [`Event`] set, the immutable [`Events`] collection and
//!   the [`EventNormalizer`]
//! - The [`Projection`] consumer trait

pub mod envelope;
pub mod error;
pub mod event;
pub mod memory;
pub mod projection;
pub mod store;
pub mod stream;
pub mod version;

pub use envelope::{EventData, EventEnvelope, EventStream};
pub use error::EventLogError;
pub use event::{Event, EventNormalizer, Events, EventsToPublish, SerializedReference};
pub use memory::InMemoryEventStore;
pub use projection::Projection;
pub use store::{CommitResult, EventStore};
pub use stream::{EventStreamName, StreamSelector};
pub use version::{ExpectedVersion, SequenceNumber, Version};
