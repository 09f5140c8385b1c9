//! Content graph projection and read model for Strata.
//!
//! This crate owns the derived queryable state: it consumes committed events
//! in sequence order and maintains, per content stream, the node records,
//! reference edges, and stream version/status bookkeeping. Workspace-scoped
//! [`ContentGraph`] views answer dimension- and visibility-aware queries.
//!
//! The projection is the *only* writer of this state; everything it hands out
//! ([`Node`], [`References`], …) is an immutable value.

pub mod commands;
pub mod content_stream;
pub mod dependencies;
pub mod error;
pub mod node;
pub mod projection;
pub mod property;
pub mod reference;
pub mod subgraph;

pub use commands::{
    CreateNodeAggregateWithNode, NodeAggregateCommandHandler, RemoveNodeAggregate,
    SetNodeProperties, SetNodeReferences, TagSubtree, UntagSubtree,
};
pub use content_stream::ContentStream;
pub use dependencies::CommandHandlingDependencies;
pub use error::GraphError;
pub use node::{Node, Nodes};
pub use projection::ContentGraphProjection;
pub use property::PropertyCollection;
pub use reference::{Reference, References};
pub use subgraph::ContentGraph;
