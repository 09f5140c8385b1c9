//! Graph-level command and query errors.

use strata_eventlog::EventLogError;
use strata_types::{
    ContentStreamId, ContentStreamStatus, DimensionSpacePoint, NodeAggregateId, WorkspaceName,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("workspace {workspace_name} does not exist")]
    WorkspaceDoesNotExist { workspace_name: WorkspaceName },

    #[error("content stream {content_stream_id} does not exist")]
    ContentStreamDoesNotExist { content_stream_id: ContentStreamId },

    #[error("content stream {content_stream_id} is {status}, not open for writes")]
    ContentStreamNotOpen {
        content_stream_id: ContentStreamId,
        status: ContentStreamStatus,
    },

    #[error(
        "node aggregate {node_aggregate_id} has no variant at {dimension_space_point} \
         in content stream {content_stream_id}"
    )]
    NodeAggregateDoesNotExist {
        node_aggregate_id: NodeAggregateId,
        dimension_space_point: DimensionSpacePoint,
        content_stream_id: ContentStreamId,
    },

    #[error(
        "node aggregate {node_aggregate_id} already has a variant at \
         {dimension_space_point} in content stream {content_stream_id}"
    )]
    NodeAggregateAlreadyExists {
        node_aggregate_id: NodeAggregateId,
        dimension_space_point: DimensionSpacePoint,
        content_stream_id: ContentStreamId,
    },

    #[error(
        "reference target {target} has no variant at {dimension_space_point} \
         in content stream {content_stream_id}"
    )]
    ReferenceTargetDoesNotExist {
        target: NodeAggregateId,
        dimension_space_point: DimensionSpacePoint,
        content_stream_id: ContentStreamId,
    },

    #[error(transparent)]
    EventLog(#[from] EventLogError),
}
