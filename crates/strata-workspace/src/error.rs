//! Error types for workspace operations.

use strata_eventlog::EventLogError;
use strata_graph::GraphError;
use strata_types::{ContentStreamId, WorkspaceName};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace {workspace_name} already exists")]
    WorkspaceAlreadyExists { workspace_name: WorkspaceName },

    #[error("workspace {workspace_name} does not exist")]
    WorkspaceDoesNotExist { workspace_name: WorkspaceName },

    #[error("base workspace {base_workspace_name} does not exist")]
    BaseWorkspaceDoesNotExist { base_workspace_name: WorkspaceName },

    #[error("workspace {workspace_name} is a root workspace and has no base to publish to")]
    WorkspaceHasNoBase { workspace_name: WorkspaceName },

    #[error(
        "cannot base {workspace_name} on {base_workspace_name}: \
         the base chain would form a cycle"
    )]
    BaseWorkspaceCycle {
        workspace_name: WorkspaceName,
        base_workspace_name: WorkspaceName,
    },

    #[error("workspace {workspace_name} has unpublished changes")]
    WorkspaceHasUnpublishedChanges { workspace_name: WorkspaceName },

    #[error(
        "a pending event of workspace {workspace_name} affects both selected and \
         unselected nodes; publish the affected nodes together"
    )]
    PendingEventStraddlesSelection { workspace_name: WorkspaceName },

    #[error("content stream {content_stream_id} does not exist")]
    ContentStreamDoesNotExist { content_stream_id: ContentStreamId },

    #[error(transparent)]
    EventLog(#[from] EventLogError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
