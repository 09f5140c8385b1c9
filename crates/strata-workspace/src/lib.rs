//! Workspace branching for Strata.
//!
//! Workspaces are named branches of the content graph. Each one points at a
//! content stream; creating a workspace forks its base's stream, and
//! publishing moves the pending events of that fork into the base's stream
//! before continuing on a fresh fork.
//!
//! # Modules
//!
//! - [`error`] — Error types for workspace operations
//! - [`registry`] — The [`WorkspaceRegistryProjection`] read model
//! - [`commands`] — Workspace lifecycle and publishing commands
//! - [`handler`] — The [`WorkspaceCommandHandler`] turning commands into
//!   ordered event batches

pub mod commands;
pub mod error;
pub mod handler;
pub mod registry;

pub use commands::{
    ChangeBaseWorkspace, CreateRootWorkspace, CreateWorkspace, DiscardWorkspace,
    PublishIndividualNodesFromWorkspace, PublishWorkspace,
};
pub use error::WorkspaceError;
pub use handler::WorkspaceCommandHandler;
pub use registry::WorkspaceRegistryProjection;
