//! Node-scoped commands and their handler.
//!
//! Each handler method validates soft constraints against the current read
//! model, then returns the event(s) to persist, addressed to the workspace's
//! current content stream under an exact version expectation. A concurrent
//! writer advancing the stream in between turns the commit into a concurrency
//! conflict; the caller decides whether to retry.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use strata_eventlog::{
    Event, Events, EventsToPublish, EventStreamName, ExpectedVersion, SerializedReference,
};
use strata_types::{
    ContentStreamId, DimensionSpacePoint, DimensionSpacePointSet, NodeAggregateId, NodeTypeName,
    PropertyName, SubtreeTag, VisibilityConstraints, WorkspaceName,
};

use crate::content_stream::ContentStream;
use crate::dependencies::CommandHandlingDependencies;
use crate::error::GraphError;

/// Bring a node aggregate into existence with its first variant.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateNodeAggregateWithNode {
    pub workspace_name: WorkspaceName,
    pub node_aggregate_id: NodeAggregateId,
    pub node_type_name: NodeTypeName,
    pub origin_dimension_space_point: DimensionSpacePoint,
    pub initial_property_values: BTreeMap<PropertyName, Value>,
}

/// Partially update the properties of one node variant. Explicit nulls unset.
#[derive(Clone, Debug, PartialEq)]
pub struct SetNodeProperties {
    pub workspace_name: WorkspaceName,
    pub node_aggregate_id: NodeAggregateId,
    pub origin_dimension_space_point: DimensionSpacePoint,
    pub property_values: BTreeMap<PropertyName, Value>,
}

/// Replace the ordered reference edges under one name. An empty list clears
/// the reference.
#[derive(Clone, Debug, PartialEq)]
pub struct SetNodeReferences {
    pub workspace_name: WorkspaceName,
    pub node_aggregate_id: NodeAggregateId,
    pub origin_dimension_space_point: DimensionSpacePoint,
    pub reference_name: PropertyName,
    pub references: Vec<SerializedReference>,
}

/// Attach a subtree tag to one node variant.
#[derive(Clone, Debug, PartialEq)]
pub struct TagSubtree {
    pub workspace_name: WorkspaceName,
    pub node_aggregate_id: NodeAggregateId,
    pub dimension_space_point: DimensionSpacePoint,
    pub tag: SubtreeTag,
}

/// Detach a subtree tag from one node variant.
#[derive(Clone, Debug, PartialEq)]
pub struct UntagSubtree {
    pub workspace_name: WorkspaceName,
    pub node_aggregate_id: NodeAggregateId,
    pub dimension_space_point: DimensionSpacePoint,
    pub tag: SubtreeTag,
}

/// Remove a node aggregate in the given dimension space points (all variants
/// if the set is empty).
#[derive(Clone, Debug, PartialEq)]
pub struct RemoveNodeAggregate {
    pub workspace_name: WorkspaceName,
    pub node_aggregate_id: NodeAggregateId,
    pub affected_dimension_space_points: DimensionSpacePointSet,
}

/// Stateless handler for all node-scoped commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeAggregateCommandHandler;

impl NodeAggregateCommandHandler {
    pub fn handle_create_node_aggregate_with_node(
        &self,
        command: CreateNodeAggregateWithNode,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<EventsToPublish, GraphError> {
        let stream = self.require_open_stream(&command.workspace_name, deps)?;
        let graph = deps.content_graph(&command.workspace_name)?;
        if graph
            .find_node_by_id(
                &command.node_aggregate_id,
                &command.origin_dimension_space_point,
                &VisibilityConstraints::unrestricted(),
            )
            .is_some()
        {
            return Err(GraphError::NodeAggregateAlreadyExists {
                node_aggregate_id: command.node_aggregate_id,
                dimension_space_point: command.origin_dimension_space_point,
                content_stream_id: stream.id,
            });
        }
        debug!(
            workspace = %command.workspace_name,
            node = %command.node_aggregate_id,
            "creating node aggregate"
        );
        Ok(publish_to(
            stream,
            Event::NodeAggregateWithNodeWasCreated {
                node_aggregate_id: command.node_aggregate_id,
                node_type_name: command.node_type_name,
                origin_dimension_space_point: command.origin_dimension_space_point,
                initial_property_values: command.initial_property_values,
            },
        ))
    }

    pub fn handle_set_node_properties(
        &self,
        command: SetNodeProperties,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<EventsToPublish, GraphError> {
        let stream = self.require_open_stream(&command.workspace_name, deps)?;
        self.require_node(
            &command.workspace_name,
            &command.node_aggregate_id,
            &command.origin_dimension_space_point,
            &stream.id,
            deps,
        )?;
        Ok(publish_to(
            stream,
            Event::NodePropertiesWereSet {
                node_aggregate_id: command.node_aggregate_id,
                origin_dimension_space_point: command.origin_dimension_space_point,
                property_values: command.property_values,
            },
        ))
    }

    pub fn handle_set_node_references(
        &self,
        command: SetNodeReferences,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<EventsToPublish, GraphError> {
        let stream = self.require_open_stream(&command.workspace_name, deps)?;
        self.require_node(
            &command.workspace_name,
            &command.node_aggregate_id,
            &command.origin_dimension_space_point,
            &stream.id,
            deps,
        )?;
        let graph = deps.content_graph(&command.workspace_name)?;
        for reference in &command.references {
            if graph
                .find_node_by_id(
                    &reference.target,
                    &command.origin_dimension_space_point,
                    &VisibilityConstraints::unrestricted(),
                )
                .is_none()
            {
                return Err(GraphError::ReferenceTargetDoesNotExist {
                    target: reference.target.clone(),
                    dimension_space_point: command.origin_dimension_space_point,
                    content_stream_id: stream.id,
                });
            }
        }
        Ok(publish_to(
            stream,
            Event::NodeReferencesWereSet {
                node_aggregate_id: command.node_aggregate_id,
                origin_dimension_space_point: command.origin_dimension_space_point,
                reference_name: command.reference_name,
                references: command.references,
            },
        ))
    }

    pub fn handle_tag_subtree(
        &self,
        command: TagSubtree,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<EventsToPublish, GraphError> {
        let stream = self.require_open_stream(&command.workspace_name, deps)?;
        self.require_node(
            &command.workspace_name,
            &command.node_aggregate_id,
            &command.dimension_space_point,
            &stream.id,
            deps,
        )?;
        Ok(publish_to(
            stream,
            Event::SubtreeWasTagged {
                node_aggregate_id: command.node_aggregate_id,
                dimension_space_point: command.dimension_space_point,
                tag: command.tag,
            },
        ))
    }

    pub fn handle_untag_subtree(
        &self,
        command: UntagSubtree,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<EventsToPublish, GraphError> {
        let stream = self.require_open_stream(&command.workspace_name, deps)?;
        self.require_node(
            &command.workspace_name,
            &command.node_aggregate_id,
            &command.dimension_space_point,
            &stream.id,
            deps,
        )?;
        Ok(publish_to(
            stream,
            Event::SubtreeWasUntagged {
                node_aggregate_id: command.node_aggregate_id,
                dimension_space_point: command.dimension_space_point,
                tag: command.tag,
            },
        ))
    }

    pub fn handle_remove_node_aggregate(
        &self,
        command: RemoveNodeAggregate,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<EventsToPublish, GraphError> {
        let stream = self.require_open_stream(&command.workspace_name, deps)?;
        // Removal in specific points requires a variant in at least one of
        // them; a full removal (empty set) requires any variant at all. The
        // graph view is per-point, so check the listed points directly.
        if !command.affected_dimension_space_points.is_empty() {
            let graph = deps.content_graph(&command.workspace_name)?;
            let any_variant = command.affected_dimension_space_points.iter().any(|dsp| {
                graph
                    .find_node_by_id(
                        &command.node_aggregate_id,
                        dsp,
                        &VisibilityConstraints::unrestricted(),
                    )
                    .is_some()
            });
            if !any_variant {
                let first = command
                    .affected_dimension_space_points
                    .iter()
                    .next()
                    .cloned()
                    .unwrap_or_default();
                return Err(GraphError::NodeAggregateDoesNotExist {
                    node_aggregate_id: command.node_aggregate_id,
                    dimension_space_point: first,
                    content_stream_id: stream.id,
                });
            }
        }
        Ok(publish_to(
            stream,
            Event::NodeAggregateWasRemoved {
                node_aggregate_id: command.node_aggregate_id,
                affected_dimension_space_points: command.affected_dimension_space_points,
            },
        ))
    }

    fn require_open_stream(
        &self,
        workspace_name: &WorkspaceName,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<ContentStream, GraphError> {
        let content_stream_id = deps.current_content_stream_id(workspace_name).ok_or_else(
            || GraphError::WorkspaceDoesNotExist {
                workspace_name: workspace_name.clone(),
            },
        )?;
        let stream = deps.find_content_stream(&content_stream_id).ok_or_else(|| {
            GraphError::ContentStreamDoesNotExist {
                content_stream_id: content_stream_id.clone(),
            }
        })?;
        if !stream.is_open() {
            return Err(GraphError::ContentStreamNotOpen {
                content_stream_id: stream.id,
                status: stream.status,
            });
        }
        Ok(stream)
    }

    fn require_node(
        &self,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        content_stream_id: &ContentStreamId,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<(), GraphError> {
        let graph = deps.content_graph(workspace_name)?;
        if graph
            .find_node_by_id(
                node_aggregate_id,
                dimension_space_point,
                &VisibilityConstraints::unrestricted(),
            )
            .is_none()
        {
            return Err(GraphError::NodeAggregateDoesNotExist {
                node_aggregate_id: node_aggregate_id.clone(),
                dimension_space_point: dimension_space_point.clone(),
                content_stream_id: content_stream_id.clone(),
            });
        }
        Ok(())
    }
}

fn publish_to(stream: ContentStream, event: Event) -> EventsToPublish {
    EventsToPublish::new(
        EventStreamName::ContentStream(stream.id),
        Events::with(event),
        ExpectedVersion::Exactly(stream.version),
    )
}
