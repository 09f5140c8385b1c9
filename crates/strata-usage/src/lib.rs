//! Cross-workspace asset usage indexing for Strata.
//!
//! Editors embed assets in node properties as `asset://<id>` URIs. This crate
//! keeps a queryable index of where each asset is used: which node, in which
//! dimension space point, under which property, in which workspace.
//!
//! Usages are de-duplicated along the workspace base chain: a usage already
//! recorded in an ancestor workspace is not recorded again in a descendant.
//! Publishing therefore migrates usages upwards, purging the now-redundant
//! descendant rows.
//!
//! # Modules
//!
//! - [`usage`] — [`AssetId`] and the [`AssetUsage`] row
//! - [`extract`] — Extraction of asset ids from property values
//! - [`index`] — The [`AssetUsageIndex`] trait and in-memory implementation
//! - [`relations`] — Workspace relation lookup and its cache
//! - [`service`] — The event-driven [`AssetUsageIndexingService`]

pub mod error;
pub mod extract;
pub mod index;
pub mod relations;
pub mod service;
pub mod usage;

pub use error::UsageError;
pub use extract::extract_asset_ids;
pub use index::{AssetUsageIndex, InMemoryAssetUsageIndex};
pub use relations::{WorkspaceRelationCache, WorkspaceRelations};
pub use service::AssetUsageIndexingService;
pub use usage::{AssetId, AssetUsage};
