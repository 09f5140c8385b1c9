//! Foundation types for Strata, the branchable content graph engine.
//!
//! This crate provides the identity, workspace, and dimension-space types used
//! throughout the Strata system. Every other Strata crate depends on
//! `strata-types`.
//!
//! # Key Types
//!
//! - [`ContentStreamId`] — identifier of one append-only line of edit history
//! - [`WorkspaceName`] — stable, human-referenced name of a branch
//! - [`Workspace`] — a named branch pointing at its current content stream
//! - [`NodeAggregateId`] — identity of a node aggregate across all variants
//! - [`DimensionSpacePoint`] — coordinate selecting one content variant
//! - [`SubtreeTags`] / [`VisibilityConstraints`] — subtree visibility model

pub mod dimension;
pub mod error;
pub mod ids;
pub mod tags;
pub mod workspace;

pub use dimension::{DimensionSpacePoint, DimensionSpacePointSet};
pub use error::TypeError;
pub use ids::{ContentRepositoryId, ContentStreamId, NodeAggregateId, NodeTypeName, PropertyName};
pub use tags::{SubtreeTag, SubtreeTags, VisibilityConstraints};
pub use workspace::{ContentStreamStatus, Workspace, WorkspaceName};
