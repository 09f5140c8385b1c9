//! Content stream read model.

use serde::{Deserialize, Serialize};
use strata_eventlog::Version;
use strata_types::{ContentStreamId, ContentStreamStatus};

/// Projected bookkeeping for one content stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentStream {
    pub id: ContentStreamId,
    /// Count of node events applied to this stream.
    pub version: Version,
    pub status: ContentStreamStatus,
    /// For forked streams: the stream this one was forked off, and the
    /// source's version at fork time.
    pub source_content_stream_id: Option<ContentStreamId>,
    pub source_version: Option<Version>,
}

impl ContentStream {
    /// Returns `true` if the stream accepts further node events.
    pub fn is_open(&self) -> bool {
        self.status == ContentStreamStatus::Open
    }
}
