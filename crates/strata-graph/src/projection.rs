//! The content graph projection.
//!
//! Applies committed events, in sequence order, to per-content-stream graph
//! state: node records, reference edges, and stream version/status
//! bookkeeping. Forking a stream copies the source's state at fork time, so
//! later edits to the source never leak into the fork.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use strata_eventlog::{Event, EventEnvelope, EventStreamName, Projection, Version};
use strata_types::{
    ContentStreamId, ContentStreamStatus, DimensionSpacePoint, NodeAggregateId, NodeTypeName,
    SubtreeTags, VisibilityConstraints, WorkspaceName,
};

use crate::content_stream::ContentStream;
use crate::node::Node;
use crate::property::PropertyCollection;
use crate::reference::{Reference, References};
use crate::subgraph::ContentGraph;

type NodeKey = (NodeAggregateId, DimensionSpacePoint);

#[derive(Clone)]
struct NodeRecord {
    node_type_name: NodeTypeName,
    properties: PropertyCollection,
    subtree_tags: SubtreeTags,
}

#[derive(Clone)]
struct ReferenceRecord {
    name: strata_types::PropertyName,
    target: NodeAggregateId,
    properties: PropertyCollection,
}

#[derive(Clone)]
struct StreamState {
    version: Version,
    status: ContentStreamStatus,
    source: Option<(ContentStreamId, Version)>,
    nodes: BTreeMap<NodeKey, NodeRecord>,
    references: BTreeMap<NodeKey, Vec<ReferenceRecord>>,
}

impl StreamState {
    fn empty(source: Option<(ContentStreamId, Version)>) -> Self {
        Self {
            version: Version(0),
            status: ContentStreamStatus::Open,
            source,
            nodes: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }
}

#[derive(Default)]
struct GraphState {
    streams: BTreeMap<ContentStreamId, StreamState>,
    /// Current stream per workspace, kept to transition superseded streams
    /// through `Rebasing` when a workspace repoints.
    workspace_streams: BTreeMap<WorkspaceName, ContentStreamId>,
}

/// The projection maintaining all per-stream graph state.
///
/// This is the only writer of the content graph read model; everything it
/// returns is an immutable value detached from the internal state.
#[derive(Default)]
pub struct ContentGraphProjection {
    state: RwLock<GraphState>,
}

impl ContentGraphProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projected bookkeeping of one content stream.
    pub fn find_content_stream(&self, id: &ContentStreamId) -> Option<ContentStream> {
        let state = self.state.read().expect("graph state lock poisoned");
        state.streams.get(id).map(|stream| ContentStream {
            id: id.clone(),
            version: stream.version,
            status: stream.status,
            source_content_stream_id: stream.source.as_ref().map(|(source, _)| source.clone()),
            source_version: stream.source.as_ref().map(|(_, version)| *version),
        })
    }

    /// A workspace-scoped graph view bound to the given content stream.
    ///
    /// The binding is not validated here; command handling may bind a
    /// workspace name to a stream that is not durable yet (scoped override).
    pub fn graph_for(
        self: &Arc<Self>,
        workspace_name: WorkspaceName,
        content_stream_id: ContentStreamId,
    ) -> ContentGraph {
        ContentGraph::new(Arc::clone(self), workspace_name, content_stream_id)
    }

    pub(crate) fn node_in_stream(
        &self,
        content_stream_id: &ContentStreamId,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        constraints: &VisibilityConstraints,
    ) -> Option<Node> {
        let state = self.state.read().expect("graph state lock poisoned");
        let stream = state.streams.get(content_stream_id)?;
        let record = stream
            .nodes
            .get(&(node_aggregate_id.clone(), dimension_space_point.clone()))?;
        if !constraints.allows(&record.subtree_tags) {
            return None;
        }
        Some(materialize(
            record,
            node_aggregate_id,
            dimension_space_point,
            workspace_name,
        ))
    }

    pub(crate) fn references_in_stream(
        &self,
        content_stream_id: &ContentStreamId,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        reference_name: Option<&strata_types::PropertyName>,
        constraints: &VisibilityConstraints,
    ) -> References {
        let state = self.state.read().expect("graph state lock poisoned");
        let Some(stream) = state.streams.get(content_stream_id) else {
            return References::empty();
        };
        let key = (node_aggregate_id.clone(), dimension_space_point.clone());
        let Some(records) = stream.references.get(&key) else {
            return References::empty();
        };
        records
            .iter()
            .filter(|record| reference_name.map_or(true, |name| &record.name == name))
            .filter_map(|record| {
                let target_key = (record.target.clone(), dimension_space_point.clone());
                let target = stream.nodes.get(&target_key)?;
                if !constraints.allows(&target.subtree_tags) {
                    return None;
                }
                Some(Reference {
                    name: record.name.clone(),
                    node: materialize(
                        target,
                        &record.target,
                        dimension_space_point,
                        workspace_name,
                    ),
                    properties: record.properties.clone(),
                })
            })
            .collect()
    }

    pub(crate) fn back_references_in_stream(
        &self,
        content_stream_id: &ContentStreamId,
        workspace_name: &WorkspaceName,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        reference_name: Option<&strata_types::PropertyName>,
        constraints: &VisibilityConstraints,
    ) -> References {
        let state = self.state.read().expect("graph state lock poisoned");
        let Some(stream) = state.streams.get(content_stream_id) else {
            return References::empty();
        };
        stream
            .references
            .iter()
            .filter(|((_, dsp), _)| dsp == dimension_space_point)
            .flat_map(|((source, _), records)| {
                records.iter().map(move |record| (source, record))
            })
            .filter(|(_, record)| &record.target == node_aggregate_id)
            .filter(|(_, record)| reference_name.map_or(true, |name| &record.name == name))
            .filter_map(|(source, record)| {
                let source_key = (source.clone(), dimension_space_point.clone());
                let source_record = stream.nodes.get(&source_key)?;
                if !constraints.allows(&source_record.subtree_tags) {
                    return None;
                }
                Some(Reference {
                    name: record.name.clone(),
                    node: materialize(
                        source_record,
                        source,
                        dimension_space_point,
                        workspace_name,
                    ),
                    properties: record.properties.clone(),
                })
            })
            .collect()
    }

    fn apply_to_state(&self, event: &Event, envelope: &EventEnvelope) {
        let mut state = self.state.write().expect("graph state lock poisoned");
        match event {
            Event::ContentStreamWasCreated { content_stream_id } => {
                state
                    .streams
                    .insert(content_stream_id.clone(), StreamState::empty(None));
            }
            Event::ContentStreamWasForked {
                content_stream_id,
                source_content_stream_id,
                source_version,
            } => {
                let forked = match state.streams.get(source_content_stream_id) {
                    Some(source) => {
                        let mut forked = StreamState::empty(Some((
                            source_content_stream_id.clone(),
                            *source_version,
                        )));
                        forked.nodes = source.nodes.clone();
                        forked.references = source.references.clone();
                        forked
                    }
                    None => {
                        warn!(
                            source = %source_content_stream_id,
                            "fork source unknown; starting empty"
                        );
                        StreamState::empty(Some((
                            source_content_stream_id.clone(),
                            *source_version,
                        )))
                    }
                };
                state.streams.insert(content_stream_id.clone(), forked);
                debug!(stream = %content_stream_id, source = %source_content_stream_id, "stream forked");
            }
            Event::ContentStreamWasClosed { content_stream_id } => {
                if let Some(stream) = state.streams.get_mut(content_stream_id) {
                    stream.status = ContentStreamStatus::Closed;
                }
            }
            Event::RootWorkspaceWasCreated {
                workspace_name,
                content_stream_id,
            }
            | Event::WorkspaceWasCreated {
                workspace_name,
                content_stream_id,
                ..
            } => {
                state
                    .workspace_streams
                    .insert(workspace_name.clone(), content_stream_id.clone());
            }
            Event::WorkspaceBaseWorkspaceWasChanged {
                workspace_name,
                new_content_stream_id,
                ..
            }
            | Event::WorkspaceWasPublished {
                workspace_name,
                new_content_stream_id,
            }
            | Event::WorkspaceWasPartiallyPublished {
                workspace_name,
                new_content_stream_id,
            }
            | Event::WorkspaceWasDiscarded {
                workspace_name,
                new_content_stream_id,
            } => {
                let previous = state
                    .workspace_streams
                    .insert(workspace_name.clone(), new_content_stream_id.clone());
                // The superseded stream is rebasing until its closure event,
                // which follows in the same committed batch, lands.
                if let Some(previous) = previous.filter(|p| p != new_content_stream_id) {
                    if let Some(stream) = state.streams.get_mut(&previous) {
                        if stream.status == ContentStreamStatus::Open {
                            stream.status = ContentStreamStatus::Rebasing;
                        }
                    }
                }
            }
            Event::NodeAggregateWithNodeWasCreated {
                node_aggregate_id,
                node_type_name,
                origin_dimension_space_point,
                initial_property_values,
            } => {
                with_node_stream(&mut state, envelope, |stream| {
                    stream.nodes.insert(
                        (
                            node_aggregate_id.clone(),
                            origin_dimension_space_point.clone(),
                        ),
                        NodeRecord {
                            node_type_name: node_type_name.clone(),
                            properties: PropertyCollection::empty()
                                .with_values(initial_property_values),
                            subtree_tags: SubtreeTags::empty(),
                        },
                    );
                });
            }
            Event::NodePropertiesWereSet {
                node_aggregate_id,
                origin_dimension_space_point,
                property_values,
            } => {
                with_node_stream(&mut state, envelope, |stream| {
                    let key = (
                        node_aggregate_id.clone(),
                        origin_dimension_space_point.clone(),
                    );
                    match stream.nodes.get_mut(&key) {
                        Some(record) => {
                            record.properties = record.properties.with_values(property_values);
                        }
                        None => warn!(node = %node_aggregate_id, "property set on unknown node"),
                    }
                });
            }
            Event::NodeReferencesWereSet {
                node_aggregate_id,
                origin_dimension_space_point,
                reference_name,
                references,
            } => {
                with_node_stream(&mut state, envelope, |stream| {
                    let key = (
                        node_aggregate_id.clone(),
                        origin_dimension_space_point.clone(),
                    );
                    let edges = stream.references.entry(key).or_default();
                    // Replace all edges under this name, keeping edges of
                    // other names and the relative order of the new set.
                    edges.retain(|record| &record.name != reference_name);
                    edges.extend(references.iter().map(|reference| ReferenceRecord {
                        name: reference_name.clone(),
                        target: reference.target.clone(),
                        properties: PropertyCollection::empty()
                            .with_values(&reference.properties),
                    }));
                });
            }
            Event::SubtreeWasTagged {
                node_aggregate_id,
                dimension_space_point,
                tag,
            } => {
                with_node_stream(&mut state, envelope, |stream| {
                    let key = (node_aggregate_id.clone(), dimension_space_point.clone());
                    if let Some(record) = stream.nodes.get_mut(&key) {
                        record.subtree_tags = record.subtree_tags.with(tag.clone());
                    }
                });
            }
            Event::SubtreeWasUntagged {
                node_aggregate_id,
                dimension_space_point,
                tag,
            } => {
                with_node_stream(&mut state, envelope, |stream| {
                    let key = (node_aggregate_id.clone(), dimension_space_point.clone());
                    if let Some(record) = stream.nodes.get_mut(&key) {
                        record.subtree_tags = record.subtree_tags.without(tag);
                    }
                });
            }
            Event::NodeAggregateWasRemoved {
                node_aggregate_id,
                affected_dimension_space_points,
            } => {
                with_node_stream(&mut state, envelope, |stream| {
                    let affects = |dsp: &DimensionSpacePoint| {
                        affected_dimension_space_points.is_empty()
                            || affected_dimension_space_points.contains(dsp)
                    };
                    stream
                        .nodes
                        .retain(|(id, dsp), _| id != node_aggregate_id || !affects(dsp));
                    stream
                        .references
                        .retain(|(id, dsp), _| id != node_aggregate_id || !affects(dsp));
                });
            }
        }
    }
}

/// Locate the stream state addressed by a node event's envelope and hand it
/// to `f`, bumping the stream version.
fn with_node_stream(
    state: &mut GraphState,
    envelope: &EventEnvelope,
    f: impl FnOnce(&mut StreamState),
) {
    let EventStreamName::ContentStream(id) = &envelope.stream_name else {
        warn!(stream = %envelope.stream_name, "node event outside a content stream; skipped");
        return;
    };
    let stream = state
        .streams
        .entry(id.clone())
        .or_insert_with(|| StreamState::empty(None));
    stream.version = envelope.version;
    f(stream);
}

fn materialize(
    record: &NodeRecord,
    node_aggregate_id: &NodeAggregateId,
    dimension_space_point: &DimensionSpacePoint,
    workspace_name: &WorkspaceName,
) -> Node {
    Node {
        aggregate_id: node_aggregate_id.clone(),
        workspace_name: workspace_name.clone(),
        dimension_space_point: dimension_space_point.clone(),
        node_type_name: record.node_type_name.clone(),
        properties: record.properties.clone(),
        subtree_tags: record.subtree_tags.clone(),
    }
}

impl Projection for ContentGraphProjection {
    fn can_handle(&self, _event: &Event) -> bool {
        // The graph projection maintains stream bookkeeping for the whole
        // closed event set.
        true
    }

    fn apply(&self, event: &Event, envelope: &EventEnvelope) {
        self.apply_to_state(event, envelope);
    }
}
