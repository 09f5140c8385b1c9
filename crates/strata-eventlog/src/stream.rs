//! Stream naming and selection.
//!
//! Node events live in per-content-stream streams; workspace and stream
//! lifecycle events live in per-workspace streams. The [`StreamSelector`]
//! additionally offers a virtual stream reading the union of all streams in
//! global sequence order.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::{ContentStreamId, WorkspaceName};

/// Name of one append-only event partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStreamName {
    /// Holds the node events of one content stream.
    ContentStream(ContentStreamId),
    /// Holds the lifecycle events of one workspace (creation, publication,
    /// base changes, stream forks and closures).
    Workspace(WorkspaceName),
}

impl fmt::Display for EventStreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStreamName::ContentStream(id) => write!(f, "content-stream:{id}"),
            EventStreamName::Workspace(name) => write!(f, "workspace:{name}"),
        }
    }
}

/// Selects which events to load from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSelector {
    /// A single stream, in per-stream order.
    Stream(EventStreamName),
    /// The union of all streams, in global sequence order.
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        let stream = EventStreamName::ContentStream(ContentStreamId::new("cs-1").unwrap());
        assert_eq!(stream.to_string(), "content-stream:cs-1");
        let stream = EventStreamName::Workspace(WorkspaceName::new("user-a").unwrap());
        assert_eq!(stream.to_string(), "workspace:user-a");
    }
}
