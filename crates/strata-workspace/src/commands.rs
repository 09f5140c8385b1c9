//! Workspace lifecycle and publishing commands.
//!
//! Commands carry the ids of the content streams they will bring into
//! existence, so callers can refer to them before the command is handled.
//! The `new` constructors fill those ids with fresh random ones.

use strata_types::{ContentStreamId, NodeAggregateId, WorkspaceName};

/// Create a workspace without a base (typically "live"), on a fresh, empty
/// content stream.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateRootWorkspace {
    pub workspace_name: WorkspaceName,
    pub content_stream_id: ContentStreamId,
}

impl CreateRootWorkspace {
    pub fn new(workspace_name: WorkspaceName) -> Self {
        Self {
            workspace_name,
            content_stream_id: ContentStreamId::random(),
        }
    }
}

/// Create a workspace on top of a base workspace, forking the base's current
/// content stream.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateWorkspace {
    pub workspace_name: WorkspaceName,
    pub base_workspace_name: WorkspaceName,
    pub content_stream_id: ContentStreamId,
}

impl CreateWorkspace {
    pub fn new(workspace_name: WorkspaceName, base_workspace_name: WorkspaceName) -> Self {
        Self {
            workspace_name,
            base_workspace_name,
            content_stream_id: ContentStreamId::random(),
        }
    }
}

/// Re-target a workspace onto a different base workspace.
///
/// Only allowed while the workspace has no unpublished changes; the workspace
/// continues on a fresh fork of the new base's stream.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeBaseWorkspace {
    pub workspace_name: WorkspaceName,
    pub base_workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

impl ChangeBaseWorkspace {
    pub fn new(workspace_name: WorkspaceName, base_workspace_name: WorkspaceName) -> Self {
        Self {
            workspace_name,
            base_workspace_name,
            new_content_stream_id: ContentStreamId::random(),
        }
    }
}

/// Append all pending events of a workspace to its base, then continue on a
/// fresh fork of the base.
#[derive(Clone, Debug, PartialEq)]
pub struct PublishWorkspace {
    pub workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

impl PublishWorkspace {
    pub fn new(workspace_name: WorkspaceName) -> Self {
        Self {
            workspace_name,
            new_content_stream_id: ContentStreamId::random(),
        }
    }
}

/// Publish only the pending events affecting the given node aggregates; the
/// rest is re-materialized on the remaining-part stream the workspace
/// continues on.
#[derive(Clone, Debug, PartialEq)]
pub struct PublishIndividualNodesFromWorkspace {
    pub workspace_name: WorkspaceName,
    pub nodes_to_publish: Vec<NodeAggregateId>,
    pub content_stream_id_for_remaining_part: ContentStreamId,
}

impl PublishIndividualNodesFromWorkspace {
    pub fn new(workspace_name: WorkspaceName, nodes_to_publish: Vec<NodeAggregateId>) -> Self {
        Self {
            workspace_name,
            nodes_to_publish,
            content_stream_id_for_remaining_part: ContentStreamId::random(),
        }
    }
}

/// Drop all pending events of a workspace and continue on a fresh fork of its
/// base's current stream.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscardWorkspace {
    pub workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

impl DiscardWorkspace {
    pub fn new(workspace_name: WorkspaceName) -> Self {
        Self {
            workspace_name,
            new_content_stream_id: ContentStreamId::random(),
        }
    }
}
