//! The top-level error of the repository runtime.

use strata_eventlog::EventLogError;
use strata_graph::GraphError;
use strata_types::WorkspaceName;
use strata_workspace::WorkspaceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    EventLog(#[from] EventLogError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Scoped content stream overrides must not nest per workspace; the
    /// caller holds a guard for the whole scope.
    #[error("a content stream override is already active for workspace {workspace_name}")]
    OverrideAlreadyActive { workspace_name: WorkspaceName },
}
