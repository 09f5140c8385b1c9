//! The asset usage index boundary and its in-memory implementation.

use std::collections::BTreeSet;
use std::sync::RwLock;

use strata_types::{
    DimensionSpacePoint, DimensionSpacePointSet, NodeAggregateId, PropertyName, WorkspaceName,
};

use crate::usage::{AssetId, AssetUsage};

/// Storage backend for asset usage rows.
///
/// Rows are identified by their full value; adding an existing row is a
/// no-op, as is removing an absent one.
pub trait AssetUsageIndex: Send + Sync {
    fn add(&self, usage: AssetUsage);

    fn remove(&self, usage: &AssetUsage);

    /// All usages of one asset, across workspaces, ordered by row.
    fn usages_of_asset(&self, asset_id: &AssetId) -> Vec<AssetUsage>;

    /// All usages recorded in one workspace, ordered by row.
    fn usages_in_workspace(&self, workspace_name: &WorkspaceName) -> Vec<AssetUsage>;

    /// The asset ids recorded for one (workspace, node, point, property)
    /// slot.
    fn asset_ids_in_slot(
        &self,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        property_name: &PropertyName,
    ) -> BTreeSet<AssetId>;

    /// Whether the usage (ignoring its workspace) is recorded in any of the
    /// given workspaces.
    fn is_recorded_in_any_workspace(
        &self,
        usage: &AssetUsage,
        workspaces: &[WorkspaceName],
    ) -> bool;

    /// Drop all usages of one node in one workspace, restricted to the given
    /// dimension space points (all points if the set is empty).
    fn remove_node(
        &self,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        affected_dimension_space_points: &DimensionSpacePointSet,
    );

    /// Drop all usages recorded in one workspace.
    fn remove_workspace(&self, workspace_name: &WorkspaceName);

    fn remove_all(&self);
}

/// In-memory [`AssetUsageIndex`] backed by an ordered row set.
#[derive(Default)]
pub struct InMemoryAssetUsageIndex {
    rows: RwLock<BTreeSet<AssetUsage>>,
}

impl InMemoryAssetUsageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().expect("usage index lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetUsageIndex for InMemoryAssetUsageIndex {
    fn add(&self, usage: AssetUsage) {
        let mut rows = self.rows.write().expect("usage index lock poisoned");
        rows.insert(usage);
    }

    fn remove(&self, usage: &AssetUsage) {
        let mut rows = self.rows.write().expect("usage index lock poisoned");
        rows.remove(usage);
    }

    fn usages_of_asset(&self, asset_id: &AssetId) -> Vec<AssetUsage> {
        let rows = self.rows.read().expect("usage index lock poisoned");
        rows.iter()
            .filter(|row| &row.asset_id == asset_id)
            .cloned()
            .collect()
    }

    fn usages_in_workspace(&self, workspace_name: &WorkspaceName) -> Vec<AssetUsage> {
        let rows = self.rows.read().expect("usage index lock poisoned");
        rows.iter()
            .filter(|row| &row.workspace_name == workspace_name)
            .cloned()
            .collect()
    }

    fn asset_ids_in_slot(
        &self,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        property_name: &PropertyName,
    ) -> BTreeSet<AssetId> {
        let rows = self.rows.read().expect("usage index lock poisoned");
        rows.iter()
            .filter(|row| {
                &row.workspace_name == workspace_name
                    && &row.node_aggregate_id == node_aggregate_id
                    && &row.dimension_space_point == dimension_space_point
                    && &row.property_name == property_name
            })
            .map(|row| row.asset_id.clone())
            .collect()
    }

    fn is_recorded_in_any_workspace(
        &self,
        usage: &AssetUsage,
        workspaces: &[WorkspaceName],
    ) -> bool {
        let rows = self.rows.read().expect("usage index lock poisoned");
        workspaces
            .iter()
            .any(|workspace| rows.contains(&usage.in_workspace(workspace.clone())))
    }

    fn remove_node(
        &self,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        affected_dimension_space_points: &DimensionSpacePointSet,
    ) {
        let mut rows = self.rows.write().expect("usage index lock poisoned");
        rows.retain(|row| {
            !(&row.workspace_name == workspace_name
                && &row.node_aggregate_id == node_aggregate_id
                && (affected_dimension_space_points.is_empty()
                    || affected_dimension_space_points.contains(&row.dimension_space_point)))
        });
    }

    fn remove_workspace(&self, workspace_name: &WorkspaceName) {
        let mut rows = self.rows.write().expect("usage index lock poisoned");
        rows.retain(|row| &row.workspace_name != workspace_name);
    }

    fn remove_all(&self) {
        let mut rows = self.rows.write().expect("usage index lock poisoned");
        rows.clear();
    }
}
