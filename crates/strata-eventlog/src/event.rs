//! The closed set of Strata domain events.
//!
//! Node-scoped events are deliberately stream-agnostic: which content stream
//! they affect is carried by the envelope's stream name, never by the
//! payload. That is what allows publishing to move a workspace's pending
//! events into its base's stream verbatim, preserving order and content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strata_types::{
    ContentStreamId, DimensionSpacePoint, DimensionSpacePointSet, NodeAggregateId, NodeTypeName,
    PropertyName, SubtreeTag, WorkspaceName,
};

use crate::envelope::EventData;
use crate::error::EventLogError;
use crate::stream::EventStreamName;
use crate::version::{ExpectedVersion, Version};

/// A reference edge in serialized form, as carried by events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedReference {
    pub target: NodeAggregateId,
    pub properties: BTreeMap<PropertyName, Value>,
}

/// One domain event.
///
/// The set is closed: projection and index consumers dispatch via pattern
/// match, not open-ended lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload")]
pub enum Event {
    /// A fresh, empty content stream was allocated (root workspaces).
    ContentStreamWasCreated { content_stream_id: ContentStreamId },

    /// A content stream was forked off another one, copying the source's
    /// graph state at `source_version`.
    ContentStreamWasForked {
        content_stream_id: ContentStreamId,
        source_content_stream_id: ContentStreamId,
        source_version: Version,
    },

    /// A content stream was superseded and is closed for writes (terminal).
    ContentStreamWasClosed { content_stream_id: ContentStreamId },

    /// A root workspace (no base) was created.
    RootWorkspaceWasCreated {
        workspace_name: WorkspaceName,
        content_stream_id: ContentStreamId,
    },

    /// A workspace was created on top of a base workspace.
    WorkspaceWasCreated {
        workspace_name: WorkspaceName,
        base_workspace_name: WorkspaceName,
        content_stream_id: ContentStreamId,
    },

    /// A workspace was re-targeted onto a different base workspace.
    WorkspaceBaseWorkspaceWasChanged {
        workspace_name: WorkspaceName,
        base_workspace_name: WorkspaceName,
        new_content_stream_id: ContentStreamId,
    },

    /// All pending events of a workspace were appended to its base; the
    /// workspace continues on a fresh stream.
    WorkspaceWasPublished {
        workspace_name: WorkspaceName,
        new_content_stream_id: ContentStreamId,
    },

    /// A subset of pending events was appended to the base; the rest was
    /// re-materialized on the new (remainder) stream.
    WorkspaceWasPartiallyPublished {
        workspace_name: WorkspaceName,
        new_content_stream_id: ContentStreamId,
    },

    /// Pending events were dropped; the workspace continues on a fresh stream
    /// anchored at its base's current tip.
    WorkspaceWasDiscarded {
        workspace_name: WorkspaceName,
        new_content_stream_id: ContentStreamId,
    },

    /// A node aggregate came into existence with its first variant.
    NodeAggregateWithNodeWasCreated {
        node_aggregate_id: NodeAggregateId,
        node_type_name: NodeTypeName,
        origin_dimension_space_point: DimensionSpacePoint,
        initial_property_values: BTreeMap<PropertyName, Value>,
    },

    /// Properties of one node variant were set (partial update; absent keys
    /// keep their value, explicit nulls unset).
    NodePropertiesWereSet {
        node_aggregate_id: NodeAggregateId,
        origin_dimension_space_point: DimensionSpacePoint,
        property_values: BTreeMap<PropertyName, Value>,
    },

    /// The ordered reference edges under one name were replaced.
    NodeReferencesWereSet {
        node_aggregate_id: NodeAggregateId,
        origin_dimension_space_point: DimensionSpacePoint,
        reference_name: PropertyName,
        references: Vec<SerializedReference>,
    },

    /// A subtree tag was added to one node variant.
    SubtreeWasTagged {
        node_aggregate_id: NodeAggregateId,
        dimension_space_point: DimensionSpacePoint,
        tag: SubtreeTag,
    },

    /// A subtree tag was removed from one node variant.
    SubtreeWasUntagged {
        node_aggregate_id: NodeAggregateId,
        dimension_space_point: DimensionSpacePoint,
        tag: SubtreeTag,
    },

    /// A node aggregate was removed in the given dimension space points (all
    /// variants if the set is empty).
    NodeAggregateWasRemoved {
        node_aggregate_id: NodeAggregateId,
        affected_dimension_space_points: DimensionSpacePointSet,
    },
}

impl Event {
    /// The stable type tag used in storage-neutral form.
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ContentStreamWasCreated { .. } => "ContentStreamWasCreated",
            Event::ContentStreamWasForked { .. } => "ContentStreamWasForked",
            Event::ContentStreamWasClosed { .. } => "ContentStreamWasClosed",
            Event::RootWorkspaceWasCreated { .. } => "RootWorkspaceWasCreated",
            Event::WorkspaceWasCreated { .. } => "WorkspaceWasCreated",
            Event::WorkspaceBaseWorkspaceWasChanged { .. } => "WorkspaceBaseWorkspaceWasChanged",
            Event::WorkspaceWasPublished { .. } => "WorkspaceWasPublished",
            Event::WorkspaceWasPartiallyPublished { .. } => "WorkspaceWasPartiallyPublished",
            Event::WorkspaceWasDiscarded { .. } => "WorkspaceWasDiscarded",
            Event::NodeAggregateWithNodeWasCreated { .. } => "NodeAggregateWithNodeWasCreated",
            Event::NodePropertiesWereSet { .. } => "NodePropertiesWereSet",
            Event::NodeReferencesWereSet { .. } => "NodeReferencesWereSet",
            Event::SubtreeWasTagged { .. } => "SubtreeWasTagged",
            Event::SubtreeWasUntagged { .. } => "SubtreeWasUntagged",
            Event::NodeAggregateWasRemoved { .. } => "NodeAggregateWasRemoved",
        }
    }

    /// The node aggregates this event affects, used to partition pending
    /// events for per-node publishing. Lifecycle events affect none.
    pub fn affected_node_aggregate_ids(&self) -> Vec<NodeAggregateId> {
        match self {
            Event::NodeAggregateWithNodeWasCreated {
                node_aggregate_id, ..
            }
            | Event::NodePropertiesWereSet {
                node_aggregate_id, ..
            }
            | Event::SubtreeWasTagged {
                node_aggregate_id, ..
            }
            | Event::SubtreeWasUntagged {
                node_aggregate_id, ..
            }
            | Event::NodeAggregateWasRemoved {
                node_aggregate_id, ..
            }
            // Reference edits touch the source node only; targets keep their
            // own state untouched.
            | Event::NodeReferencesWereSet {
                node_aggregate_id, ..
            } => vec![node_aggregate_id.clone()],
            _ => Vec::new(),
        }
    }
}

/// An ordered, immutable sequence of domain events.
///
/// Order matters and defines application order. Any composition produces a
/// new collection; in-place mutation is not offered.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Events {
    events: Vec<Event>,
}

impl Events {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(event: Event) -> Self {
        Self {
            events: vec![event],
        }
    }

    pub fn from_vec(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// A new collection holding `self`'s events followed by `other`'s, both
    /// in their original order.
    pub fn with_appended_events(&self, other: &Events) -> Self {
        let mut events = self.events.clone();
        events.extend(other.events.iter().cloned());
        Self { events }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl FromIterator<Event> for Events {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Events {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a Events {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// What a command handler wants persisted: events for one stream under one
/// version expectation.
#[derive(Clone, Debug, PartialEq)]
pub struct EventsToPublish {
    pub stream_name: EventStreamName,
    pub events: Events,
    pub expected_version: ExpectedVersion,
}

impl EventsToPublish {
    pub fn new(
        stream_name: EventStreamName,
        events: Events,
        expected_version: ExpectedVersion,
    ) -> Self {
        Self {
            stream_name,
            events,
            expected_version,
        }
    }
}

/// Converts between domain events and their storage-neutral form.
#[derive(Clone, Copy, Debug, Default)]
pub struct EventNormalizer;

impl EventNormalizer {
    pub fn normalize(&self, event: &Event) -> Result<EventData, EventLogError> {
        let value =
            serde_json::to_value(event).map_err(|e| EventLogError::Normalization(e.to_string()))?;
        let payload = value
            .get("payload")
            .cloned()
            .ok_or_else(|| EventLogError::Normalization("missing payload".into()))?;
        Ok(EventData {
            event_type: event.event_type().to_string(),
            payload,
        })
    }

    pub fn denormalize(&self, data: &EventData) -> Result<Event, EventLogError> {
        let value = serde_json::json!({
            "event_type": data.event_type,
            "payload": data.payload,
        });
        serde_json::from_value(value).map_err(|e| {
            EventLogError::Normalization(format!(
                "cannot map stored event of type {:?}: {e}",
                data.event_type
            ))
        })
    }
}
