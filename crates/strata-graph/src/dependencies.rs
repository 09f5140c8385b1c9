//! The read-side facade command handlers validate against.

use strata_types::{ContentStreamId, Workspace, WorkspaceName};

use crate::content_stream::ContentStream;
use crate::error::GraphError;
use crate::subgraph::ContentGraph;

/// Read access used by command handlers for soft-constraint checks.
///
/// Implemented by the repository runtime, which also decides which content
/// stream a workspace name currently resolves to. During publishing, the
/// runtime may temporarily rebind a workspace name to a candidate stream;
/// handlers see that binding transparently through this trait.
pub trait CommandHandlingDependencies: Send + Sync {
    /// The durable workspace record, ignoring any temporary rebinding.
    fn find_workspace_by_name(&self, workspace_name: &WorkspaceName) -> Option<Workspace>;

    /// The content stream the workspace currently writes to, honoring a
    /// temporary rebinding when one is active.
    fn current_content_stream_id(&self, workspace_name: &WorkspaceName)
        -> Option<ContentStreamId>;

    /// Projected bookkeeping of one content stream.
    fn find_content_stream(&self, content_stream_id: &ContentStreamId) -> Option<ContentStream>;

    /// A graph view of the workspace's current content stream.
    fn content_graph(&self, workspace_name: &WorkspaceName) -> Result<ContentGraph, GraphError>;

    fn content_stream_exists(&self, content_stream_id: &ContentStreamId) -> bool {
        self.find_content_stream(content_stream_id).is_some()
    }

    fn content_stream_version(
        &self,
        content_stream_id: &ContentStreamId,
    ) -> Option<strata_eventlog::Version> {
        self.find_content_stream(content_stream_id)
            .map(|stream| stream.version)
    }
}
