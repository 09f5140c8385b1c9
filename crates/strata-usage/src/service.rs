//! Event-driven maintenance of the asset usage index.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use strata_eventlog::{Event, EventEnvelope, EventStreamName, Projection};
use strata_types::{
    ContentRepositoryId, DimensionSpacePoint, NodeAggregateId, PropertyName, WorkspaceName,
};

use crate::extract::extract_asset_ids;
use crate::index::AssetUsageIndex;
use crate::relations::{WorkspaceRelationCache, WorkspaceRelations};
use crate::usage::{AssetId, AssetUsage};

/// Keeps the usage index in step with committed events.
///
/// A usage is recorded in the lowest workspace that introduced it, and only
/// if no ancestor workspace records the same usage already. When an event
/// re-introduces a usage higher up (publishing), the same usage is purged
/// from all dependent workspaces, so each logical usage exists at most once
/// per base chain.
pub struct AssetUsageIndexingService {
    content_repository_id: ContentRepositoryId,
    index: Arc<dyn AssetUsageIndex>,
    relations: Arc<dyn WorkspaceRelations>,
    cache: WorkspaceRelationCache,
}

impl AssetUsageIndexingService {
    pub fn new(
        content_repository_id: ContentRepositoryId,
        index: Arc<dyn AssetUsageIndex>,
        relations: Arc<dyn WorkspaceRelations>,
    ) -> Self {
        let cache = WorkspaceRelationCache::new(Arc::clone(&relations));
        Self {
            content_repository_id,
            index,
            relations,
            cache,
        }
    }

    pub fn index(&self) -> &Arc<dyn AssetUsageIndex> {
        &self.index
    }

    fn update_index(&self, event: &Event, envelope: &EventEnvelope) {
        match event {
            Event::NodeAggregateWithNodeWasCreated {
                node_aggregate_id,
                origin_dimension_space_point,
                initial_property_values,
                ..
            } => {
                let Some(workspace) = self.workspace_for(envelope) else {
                    return;
                };
                for (property, value) in initial_property_values {
                    self.update_slot(
                        &workspace,
                        node_aggregate_id,
                        origin_dimension_space_point,
                        property,
                        extract_asset_ids(value),
                    );
                }
            }
            Event::NodePropertiesWereSet {
                node_aggregate_id,
                origin_dimension_space_point,
                property_values,
            } => {
                let Some(workspace) = self.workspace_for(envelope) else {
                    return;
                };
                for (property, value) in property_values {
                    self.update_slot(
                        &workspace,
                        node_aggregate_id,
                        origin_dimension_space_point,
                        property,
                        extract_asset_ids(value),
                    );
                }
            }
            Event::NodeReferencesWereSet {
                node_aggregate_id,
                origin_dimension_space_point,
                reference_name,
                references,
            } => {
                let Some(workspace) = self.workspace_for(envelope) else {
                    return;
                };
                // Reference edges can carry asset-bearing properties of
                // their own; they are indexed under the reference name.
                let mut ids = BTreeSet::new();
                for reference in references {
                    for value in reference.properties.values() {
                        ids.append(&mut extract_asset_ids(value));
                    }
                }
                self.update_slot(
                    &workspace,
                    node_aggregate_id,
                    origin_dimension_space_point,
                    reference_name,
                    ids,
                );
            }
            Event::NodeAggregateWasRemoved {
                node_aggregate_id,
                affected_dimension_space_points,
            } => {
                let Some(workspace) = self.workspace_for(envelope) else {
                    return;
                };
                self.index.remove_node(
                    &workspace,
                    node_aggregate_id,
                    affected_dimension_space_points,
                );
            }
            Event::WorkspaceWasDiscarded { workspace_name, .. } => {
                self.index.remove_workspace(workspace_name);
                self.cache.invalidate(workspace_name);
            }
            Event::RootWorkspaceWasCreated { workspace_name, .. }
            | Event::WorkspaceWasCreated { workspace_name, .. }
            | Event::WorkspaceBaseWorkspaceWasChanged { workspace_name, .. }
            | Event::WorkspaceWasPublished { workspace_name, .. }
            | Event::WorkspaceWasPartiallyPublished { workspace_name, .. } => {
                self.cache.invalidate(workspace_name);
            }
            _ => {}
        }
    }

    /// Bring one (workspace, node, point, property) slot in line with the
    /// asset ids its value now references.
    fn update_slot(
        &self,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        property_name: &PropertyName,
        new_ids: BTreeSet<AssetId>,
    ) {
        let current = self.index.asset_ids_in_slot(
            workspace_name,
            node_aggregate_id,
            dimension_space_point,
            property_name,
        );

        // Removals only ever touch this workspace's own rows; an ancestor
        // recording the same usage keeps it.
        for dropped in current.difference(&new_ids) {
            self.index.remove(&self.usage_row(
                workspace_name,
                node_aggregate_id,
                dimension_space_point,
                property_name,
                dropped,
            ));
        }

        for added in new_ids.difference(&current) {
            let usage = self.usage_row(
                workspace_name,
                node_aggregate_id,
                dimension_space_point,
                property_name,
                added,
            );
            let ancestors = self.cache.ancestors_including_self(workspace_name);
            if self.index.is_recorded_in_any_workspace(&usage, &ancestors) {
                debug!(asset = %added, workspace = %workspace_name, "usage already recorded in base chain");
                continue;
            }
            for dependent in self.cache.transitive_dependents(workspace_name) {
                self.index.remove(&usage.in_workspace(dependent));
            }
            self.index.add(usage);
        }
    }

    fn usage_row(
        &self,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        property_name: &PropertyName,
        asset_id: &AssetId,
    ) -> AssetUsage {
        AssetUsage {
            content_repository_id: self.content_repository_id.clone(),
            workspace_name: workspace_name.clone(),
            node_aggregate_id: node_aggregate_id.clone(),
            dimension_space_point: dimension_space_point.clone(),
            property_name: property_name.clone(),
            asset_id: asset_id.clone(),
        }
    }

    fn workspace_for(&self, envelope: &EventEnvelope) -> Option<WorkspaceName> {
        let EventStreamName::ContentStream(content_stream_id) = &envelope.stream_name else {
            warn!(stream = %envelope.stream_name, "node event outside a content stream; not indexed");
            return None;
        };
        let workspace = self.relations.workspace_for_content_stream(content_stream_id);
        if workspace.is_none() {
            warn!(stream = %content_stream_id, "no workspace bound to stream; not indexed");
        }
        workspace
    }
}

impl Projection for AssetUsageIndexingService {
    fn can_handle(&self, event: &Event) -> bool {
        !matches!(
            event,
            Event::ContentStreamWasCreated { .. }
                | Event::ContentStreamWasForked { .. }
                | Event::ContentStreamWasClosed { .. }
                | Event::SubtreeWasTagged { .. }
                | Event::SubtreeWasUntagged { .. }
        )
    }

    fn apply(&self, event: &Event, envelope: &EventEnvelope) {
        self.update_index(event, envelope);
    }
}
