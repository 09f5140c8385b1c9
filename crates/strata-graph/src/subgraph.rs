//! Workspace-scoped graph views.

use std::sync::Arc;

use strata_types::{
    ContentStreamId, DimensionSpacePoint, NodeAggregateId, PropertyName, VisibilityConstraints,
    WorkspaceName,
};

use crate::node::Node;
use crate::projection::ContentGraphProjection;
use crate::reference::References;

/// A read-only view of one workspace's content graph.
///
/// Bound to the content stream the workspace pointed at (or was overridden
/// to) when the view was obtained. All queries are dimension-aware and honor
/// the caller's [`VisibilityConstraints`].
#[derive(Clone)]
pub struct ContentGraph {
    projection: Arc<ContentGraphProjection>,
    workspace_name: WorkspaceName,
    content_stream_id: ContentStreamId,
}

impl ContentGraph {
    pub(crate) fn new(
        projection: Arc<ContentGraphProjection>,
        workspace_name: WorkspaceName,
        content_stream_id: ContentStreamId,
    ) -> Self {
        Self {
            projection,
            workspace_name,
            content_stream_id,
        }
    }

    pub fn workspace_name(&self) -> &WorkspaceName {
        &self.workspace_name
    }

    pub fn content_stream_id(&self) -> &ContentStreamId {
        &self.content_stream_id
    }

    /// The node variant at (aggregate id, dimension space point), if it
    /// exists and is visible.
    pub fn find_node_by_id(
        &self,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        constraints: &VisibilityConstraints,
    ) -> Option<Node> {
        self.projection.node_in_stream(
            &self.content_stream_id,
            &self.workspace_name,
            node_aggregate_id,
            dimension_space_point,
            constraints,
        )
    }

    /// Outgoing references of a node, optionally restricted to one reference
    /// name. Edges to missing or invisible targets are omitted.
    pub fn find_references(
        &self,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        reference_name: Option<&PropertyName>,
        constraints: &VisibilityConstraints,
    ) -> References {
        self.projection.references_in_stream(
            &self.content_stream_id,
            &self.workspace_name,
            node_aggregate_id,
            dimension_space_point,
            reference_name,
            constraints,
        )
    }

    /// Incoming references: which visible nodes point at this one, and under
    /// which reference name.
    pub fn find_back_references(
        &self,
        node_aggregate_id: &NodeAggregateId,
        dimension_space_point: &DimensionSpacePoint,
        reference_name: Option<&PropertyName>,
        constraints: &VisibilityConstraints,
    ) -> References {
        self.projection.back_references_in_stream(
            &self.content_stream_id,
            &self.workspace_name,
            node_aggregate_id,
            dimension_space_point,
            reference_name,
            constraints,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use serde_json::Value;
    use strata_eventlog::{
        Event, EventEnvelope, EventNormalizer, EventStreamName, Projection, SequenceNumber,
        SerializedReference, Version,
    };
    use strata_types::{NodeTypeName, SubtreeTag};

    use super::*;
    use crate::projection::ContentGraphProjection;

    fn stream_id(s: &str) -> ContentStreamId {
        ContentStreamId::new(s).unwrap()
    }

    fn node_id(s: &str) -> NodeAggregateId {
        NodeAggregateId::new(s).unwrap()
    }

    fn prop(s: &str) -> PropertyName {
        PropertyName::new(s).unwrap()
    }

    fn dsp() -> DimensionSpacePoint {
        DimensionSpacePoint::from_coordinates([("language", "en")])
    }

    /// Apply `events` to the projection as if committed to `stream` starting
    /// at version `base`.
    fn apply_all(
        projection: &ContentGraphProjection,
        stream: &EventStreamName,
        base: u64,
        events: &[Event],
    ) {
        let normalizer = EventNormalizer;
        for (offset, event) in events.iter().enumerate() {
            let envelope = EventEnvelope {
                stream_name: stream.clone(),
                event: normalizer.normalize(event).unwrap(),
                version: Version(base + offset as u64 + 1),
                sequence_number: SequenceNumber(base + offset as u64 + 1),
            };
            projection.apply(event, &envelope);
        }
    }

    fn created(id: &str, title: &str) -> Event {
        Event::NodeAggregateWithNodeWasCreated {
            node_aggregate_id: node_id(id),
            node_type_name: NodeTypeName::new("acme.site:document").unwrap(),
            origin_dimension_space_point: dsp(),
            initial_property_values: BTreeMap::from([(prop("title"), Value::from(title))]),
        }
    }

    fn graph(projection: &Arc<ContentGraphProjection>, stream: &str) -> ContentGraph {
        projection.graph_for(WorkspaceName::new("live").unwrap(), stream_id(stream))
    }

    #[test]
    fn created_node_is_queryable_with_its_properties() {
        let projection = Arc::new(ContentGraphProjection::new());
        let stream = EventStreamName::ContentStream(stream_id("cs-live"));
        apply_all(&projection, &stream, 0, &[created("n1", "Hello")]);

        let graph = graph(&projection, "cs-live");
        let node = graph
            .find_node_by_id(&node_id("n1"), &dsp(), &VisibilityConstraints::unrestricted())
            .unwrap();
        assert_eq!(node.properties.get(&prop("title")), Some(&Value::from("Hello")));
        assert_eq!(node.workspace_name, WorkspaceName::new("live").unwrap());

        // Other dimension space points hold no variant.
        assert!(graph
            .find_node_by_id(
                &node_id("n1"),
                &DimensionSpacePoint::empty(),
                &VisibilityConstraints::unrestricted()
            )
            .is_none());
    }

    #[test]
    fn fork_copies_state_and_isolates_further_edits() {
        let projection = Arc::new(ContentGraphProjection::new());
        let live = EventStreamName::ContentStream(stream_id("cs-live"));
        apply_all(&projection, &live, 0, &[created("n1", "Hello")]);

        let fork = Event::ContentStreamWasForked {
            content_stream_id: stream_id("cs-user"),
            source_content_stream_id: stream_id("cs-live"),
            source_version: Version(1),
        };
        apply_all(
            &projection,
            &EventStreamName::Workspace(WorkspaceName::new("user-a").unwrap()),
            0,
            &[fork],
        );

        // Edit in the fork only.
        apply_all(
            &projection,
            &EventStreamName::ContentStream(stream_id("cs-user")),
            0,
            &[Event::NodePropertiesWereSet {
                node_aggregate_id: node_id("n1"),
                origin_dimension_space_point: dsp(),
                property_values: BTreeMap::from([(prop("title"), Value::from("Edited"))]),
            }],
        );

        let unrestricted = VisibilityConstraints::unrestricted();
        let live_node = graph(&projection, "cs-live")
            .find_node_by_id(&node_id("n1"), &dsp(), &unrestricted)
            .unwrap();
        let user_node = graph(&projection, "cs-user")
            .find_node_by_id(&node_id("n1"), &dsp(), &unrestricted)
            .unwrap();
        assert_eq!(live_node.properties.get(&prop("title")), Some(&Value::from("Hello")));
        assert_eq!(user_node.properties.get(&prop("title")), Some(&Value::from("Edited")));

        let forked = projection.find_content_stream(&stream_id("cs-user")).unwrap();
        assert_eq!(forked.version, Version(1));
        assert_eq!(forked.source_content_stream_id, Some(stream_id("cs-live")));
        assert_eq!(forked.source_version, Some(Version(1)));
    }

    #[test]
    fn references_and_back_references_are_ordered_and_name_filtered() {
        let projection = Arc::new(ContentGraphProjection::new());
        let stream = EventStreamName::ContentStream(stream_id("cs-live"));
        apply_all(
            &projection,
            &stream,
            0,
            &[
                created("a", "A"),
                created("b", "B"),
                created("c", "C"),
                Event::NodeReferencesWereSet {
                    node_aggregate_id: node_id("a"),
                    origin_dimension_space_point: dsp(),
                    reference_name: prop("related"),
                    references: vec![
                        SerializedReference {
                            target: node_id("c"),
                            properties: BTreeMap::new(),
                        },
                        SerializedReference {
                            target: node_id("b"),
                            properties: BTreeMap::from([(prop("weight"), Value::from(2))]),
                        },
                    ],
                },
            ],
        );

        let graph = graph(&projection, "cs-live");
        let unrestricted = VisibilityConstraints::unrestricted();

        let refs = graph.find_references(&node_id("a"), &dsp(), Some(&prop("related")), &unrestricted);
        let targets: Vec<&str> = refs.iter().map(|r| r.node.aggregate_id.as_str()).collect();
        assert_eq!(targets, vec!["c", "b"]);
        assert_eq!(
            refs.get(1).unwrap().properties.get(&prop("weight")),
            Some(&Value::from(2))
        );

        let back = graph.find_back_references(&node_id("b"), &dsp(), None, &unrestricted);
        assert_eq!(back.len(), 1);
        assert_eq!(back.get(0).unwrap().node.aggregate_id, node_id("a"));
        assert_eq!(back.get(0).unwrap().name, prop("related"));

        // Unknown name filters everything out.
        assert!(graph
            .find_references(&node_id("a"), &dsp(), Some(&prop("other")), &unrestricted)
            .is_empty());
    }

    #[test]
    fn tagged_nodes_are_hidden_from_constrained_viewers() {
        let projection = Arc::new(ContentGraphProjection::new());
        let stream = EventStreamName::ContentStream(stream_id("cs-live"));
        apply_all(
            &projection,
            &stream,
            0,
            &[
                created("n1", "Hello"),
                Event::SubtreeWasTagged {
                    node_aggregate_id: node_id("n1"),
                    dimension_space_point: dsp(),
                    tag: SubtreeTag::new("disabled").unwrap(),
                },
            ],
        );

        let graph = graph(&projection, "cs-live");
        let restricted = VisibilityConstraints::excluding(
            strata_types::SubtreeTags::single(SubtreeTag::new("disabled").unwrap()),
        );
        assert!(graph.find_node_by_id(&node_id("n1"), &dsp(), &restricted).is_none());
        assert!(graph
            .find_node_by_id(&node_id("n1"), &dsp(), &VisibilityConstraints::unrestricted())
            .is_some());
    }

    #[test]
    fn removal_drops_the_affected_variants_only() {
        let projection = Arc::new(ContentGraphProjection::new());
        let stream = EventStreamName::ContentStream(stream_id("cs-live"));
        let other_dsp = DimensionSpacePoint::from_coordinates([("language", "de")]);
        apply_all(
            &projection,
            &stream,
            0,
            &[
                created("n1", "Hello"),
                Event::NodeAggregateWithNodeWasCreated {
                    node_aggregate_id: node_id("n1"),
                    node_type_name: NodeTypeName::new("acme.site:document").unwrap(),
                    origin_dimension_space_point: other_dsp.clone(),
                    initial_property_values: BTreeMap::new(),
                },
                Event::NodeAggregateWasRemoved {
                    node_aggregate_id: node_id("n1"),
                    affected_dimension_space_points: [dsp()].into_iter().collect(),
                },
            ],
        );

        let graph = graph(&projection, "cs-live");
        let unrestricted = VisibilityConstraints::unrestricted();
        assert!(graph.find_node_by_id(&node_id("n1"), &dsp(), &unrestricted).is_none());
        assert!(graph
            .find_node_by_id(&node_id("n1"), &other_dsp, &unrestricted)
            .is_some());
    }
}
