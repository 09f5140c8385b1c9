//! Workspace command handling.
//!
//! Every handler method returns the ordered event batches to persist. Each
//! batch targets one stream under one version expectation; the caller commits
//! and projects them in order, so later batches observe the effects of
//! earlier ones.
//!
//! Publishing is where optimistic concurrency bites: the batch appending a
//! workspace's pending events to its base expects the base stream to still be
//! at the version recorded when the workspace's stream was forked. A base
//! that moved on turns the commit into a concurrency conflict, surfaced
//! unretried.

use tracing::{debug, info};

use strata_eventlog::{
    Event, EventLogError, EventNormalizer, Events, EventsToPublish, EventStore, EventStreamName,
    ExpectedVersion, StreamSelector, Version,
};
use strata_graph::{CommandHandlingDependencies, ContentStream};
use strata_types::{ContentStreamId, NodeAggregateId, Workspace, WorkspaceName};

use crate::commands::{
    ChangeBaseWorkspace, CreateRootWorkspace, CreateWorkspace, DiscardWorkspace,
    PublishIndividualNodesFromWorkspace, PublishWorkspace,
};
use crate::error::WorkspaceError;

/// Stateless handler for all workspace-scoped commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkspaceCommandHandler;

impl WorkspaceCommandHandler {
    pub fn handle_create_root_workspace(
        &self,
        command: CreateRootWorkspace,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<Vec<EventsToPublish>, WorkspaceError> {
        if deps.find_workspace_by_name(&command.workspace_name).is_some() {
            return Err(WorkspaceError::WorkspaceAlreadyExists {
                workspace_name: command.workspace_name,
            });
        }
        info!(workspace = %command.workspace_name, "creating root workspace");
        Ok(vec![EventsToPublish::new(
            EventStreamName::Workspace(command.workspace_name.clone()),
            Events::from_vec(vec![
                Event::ContentStreamWasCreated {
                    content_stream_id: command.content_stream_id.clone(),
                },
                Event::RootWorkspaceWasCreated {
                    workspace_name: command.workspace_name,
                    content_stream_id: command.content_stream_id,
                },
            ]),
            ExpectedVersion::NoStream,
        )])
    }

    pub fn handle_create_workspace(
        &self,
        command: CreateWorkspace,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<Vec<EventsToPublish>, WorkspaceError> {
        if deps.find_workspace_by_name(&command.workspace_name).is_some() {
            return Err(WorkspaceError::WorkspaceAlreadyExists {
                workspace_name: command.workspace_name,
            });
        }
        let base = deps
            .find_workspace_by_name(&command.base_workspace_name)
            .ok_or_else(|| WorkspaceError::BaseWorkspaceDoesNotExist {
                base_workspace_name: command.base_workspace_name.clone(),
            })?;
        let base_stream = require_stream(deps, &base.current_content_stream_id)?;
        info!(
            workspace = %command.workspace_name,
            base = %command.base_workspace_name,
            "creating workspace"
        );
        Ok(vec![EventsToPublish::new(
            EventStreamName::Workspace(command.workspace_name.clone()),
            Events::from_vec(vec![
                Event::ContentStreamWasForked {
                    content_stream_id: command.content_stream_id.clone(),
                    source_content_stream_id: base.current_content_stream_id,
                    source_version: base_stream.version,
                },
                Event::WorkspaceWasCreated {
                    workspace_name: command.workspace_name,
                    base_workspace_name: command.base_workspace_name,
                    content_stream_id: command.content_stream_id,
                },
            ]),
            ExpectedVersion::NoStream,
        )])
    }

    /// Append all pending events to the base stream, then continue the
    /// workspace on a fresh fork of the base.
    pub fn handle_publish_workspace(
        &self,
        command: PublishWorkspace,
        deps: &dyn CommandHandlingDependencies,
        store: &dyn EventStore,
    ) -> Result<Vec<EventsToPublish>, WorkspaceError> {
        let (workspace, base, workspace_stream) = require_publishable(deps, &command.workspace_name)?;
        let source_version =
            require_up_to_date_fork(&workspace_stream, &base, deps)?;
        let pending = pending_events(store, &workspace.current_content_stream_id)?;
        let pending_count = pending.len() as u64;
        info!(
            workspace = %command.workspace_name,
            base = %base.workspace_name,
            events = pending_count,
            "publishing workspace"
        );

        let mut batches = Vec::new();
        if !pending.is_empty() {
            batches.push(EventsToPublish::new(
                EventStreamName::ContentStream(base.current_content_stream_id.clone()),
                pending,
                ExpectedVersion::Exactly(source_version),
            ));
        }
        batches.push(EventsToPublish::new(
            EventStreamName::Workspace(command.workspace_name.clone()),
            Events::from_vec(vec![
                Event::WorkspaceWasPublished {
                    workspace_name: command.workspace_name,
                    new_content_stream_id: command.new_content_stream_id.clone(),
                },
                Event::ContentStreamWasForked {
                    content_stream_id: command.new_content_stream_id,
                    source_content_stream_id: base.current_content_stream_id,
                    source_version: Version(source_version.value() + pending_count),
                },
                Event::ContentStreamWasClosed {
                    content_stream_id: workspace.current_content_stream_id,
                },
            ]),
            ExpectedVersion::Any,
        ));
        Ok(batches)
    }

    /// Publish only the pending events affecting the selected node
    /// aggregates; re-materialize the rest on the remaining-part stream.
    ///
    /// A pending event affecting selected and unselected nodes at once cannot
    /// be split; such a selection is rejected before anything is committed.
    pub fn handle_publish_individual_nodes(
        &self,
        command: PublishIndividualNodesFromWorkspace,
        deps: &dyn CommandHandlingDependencies,
        store: &dyn EventStore,
    ) -> Result<Vec<EventsToPublish>, WorkspaceError> {
        let (workspace, base, workspace_stream) = require_publishable(deps, &command.workspace_name)?;
        let source_version =
            require_up_to_date_fork(&workspace_stream, &base, deps)?;
        let pending = pending_events(store, &workspace.current_content_stream_id)?;
        let (selected, remainder) = partition_by_nodes(
            &command.workspace_name,
            pending,
            &command.nodes_to_publish,
        )?;
        let selected_count = selected.len() as u64;
        info!(
            workspace = %command.workspace_name,
            base = %base.workspace_name,
            selected = selected_count,
            remaining = remainder.len(),
            "partially publishing workspace"
        );

        let mut batches = Vec::new();
        if !selected.is_empty() {
            batches.push(EventsToPublish::new(
                EventStreamName::ContentStream(base.current_content_stream_id.clone()),
                selected,
                ExpectedVersion::Exactly(source_version),
            ));
        }
        batches.push(EventsToPublish::new(
            EventStreamName::Workspace(command.workspace_name.clone()),
            Events::from_vec(vec![
                Event::WorkspaceWasPartiallyPublished {
                    workspace_name: command.workspace_name,
                    new_content_stream_id: command.content_stream_id_for_remaining_part.clone(),
                },
                Event::ContentStreamWasForked {
                    content_stream_id: command.content_stream_id_for_remaining_part.clone(),
                    source_content_stream_id: base.current_content_stream_id,
                    source_version: Version(source_version.value() + selected_count),
                },
                Event::ContentStreamWasClosed {
                    content_stream_id: workspace.current_content_stream_id,
                },
            ]),
            ExpectedVersion::Any,
        ));
        if !remainder.is_empty() {
            batches.push(EventsToPublish::new(
                EventStreamName::ContentStream(command.content_stream_id_for_remaining_part),
                remainder,
                ExpectedVersion::Exactly(Version(0)),
            ));
        }
        Ok(batches)
    }

    /// Drop all pending events and continue on a fresh fork of the base's
    /// current stream.
    pub fn handle_discard_workspace(
        &self,
        command: DiscardWorkspace,
        deps: &dyn CommandHandlingDependencies,
    ) -> Result<Vec<EventsToPublish>, WorkspaceError> {
        let (workspace, base, _) = require_publishable(deps, &command.workspace_name)?;
        let base_stream = require_stream(deps, &base.current_content_stream_id)?;
        info!(workspace = %command.workspace_name, "discarding workspace changes");
        Ok(vec![EventsToPublish::new(
            EventStreamName::Workspace(command.workspace_name.clone()),
            Events::from_vec(vec![
                Event::WorkspaceWasDiscarded {
                    workspace_name: command.workspace_name,
                    new_content_stream_id: command.new_content_stream_id.clone(),
                },
                Event::ContentStreamWasForked {
                    content_stream_id: command.new_content_stream_id,
                    source_content_stream_id: base.current_content_stream_id,
                    source_version: base_stream.version,
                },
                Event::ContentStreamWasClosed {
                    content_stream_id: workspace.current_content_stream_id,
                },
            ]),
            ExpectedVersion::Any,
        )])
    }

    /// Re-target a workspace onto a different base. Only allowed while the
    /// workspace has nothing pending; the fresh stream forks off the new
    /// base's current tip.
    pub fn handle_change_base_workspace(
        &self,
        command: ChangeBaseWorkspace,
        deps: &dyn CommandHandlingDependencies,
        store: &dyn EventStore,
    ) -> Result<Vec<EventsToPublish>, WorkspaceError> {
        let workspace = require_workspace(deps, &command.workspace_name)?;
        let new_base = deps
            .find_workspace_by_name(&command.base_workspace_name)
            .ok_or_else(|| WorkspaceError::BaseWorkspaceDoesNotExist {
                base_workspace_name: command.base_workspace_name.clone(),
            })?;
        ensure_no_base_cycle(deps, &command.workspace_name, &command.base_workspace_name)?;
        if !pending_events(store, &workspace.current_content_stream_id)?.is_empty() {
            return Err(WorkspaceError::WorkspaceHasUnpublishedChanges {
                workspace_name: command.workspace_name,
            });
        }
        let new_base_stream = require_stream(deps, &new_base.current_content_stream_id)?;
        debug!(
            workspace = %command.workspace_name,
            base = %command.base_workspace_name,
            "changing base workspace"
        );
        Ok(vec![EventsToPublish::new(
            EventStreamName::Workspace(command.workspace_name.clone()),
            Events::from_vec(vec![
                Event::WorkspaceBaseWorkspaceWasChanged {
                    workspace_name: command.workspace_name,
                    base_workspace_name: command.base_workspace_name,
                    new_content_stream_id: command.new_content_stream_id.clone(),
                },
                Event::ContentStreamWasForked {
                    content_stream_id: command.new_content_stream_id,
                    source_content_stream_id: new_base.current_content_stream_id,
                    source_version: new_base_stream.version,
                },
                Event::ContentStreamWasClosed {
                    content_stream_id: workspace.current_content_stream_id,
                },
            ]),
            ExpectedVersion::Any,
        )])
    }
}

fn require_workspace(
    deps: &dyn CommandHandlingDependencies,
    workspace_name: &WorkspaceName,
) -> Result<Workspace, WorkspaceError> {
    deps.find_workspace_by_name(workspace_name)
        .ok_or_else(|| WorkspaceError::WorkspaceDoesNotExist {
            workspace_name: workspace_name.clone(),
        })
}

fn require_stream(
    deps: &dyn CommandHandlingDependencies,
    content_stream_id: &ContentStreamId,
) -> Result<ContentStream, WorkspaceError> {
    deps.find_content_stream(content_stream_id).ok_or_else(|| {
        WorkspaceError::ContentStreamDoesNotExist {
            content_stream_id: content_stream_id.clone(),
        }
    })
}

/// Resolve workspace, base workspace and the workspace's stream record for
/// operations that move changes towards the base.
fn require_publishable(
    deps: &dyn CommandHandlingDependencies,
    workspace_name: &WorkspaceName,
) -> Result<(Workspace, Workspace, ContentStream), WorkspaceError> {
    let workspace = require_workspace(deps, workspace_name)?;
    let base_name = workspace.base_workspace_name.clone().ok_or_else(|| {
        WorkspaceError::WorkspaceHasNoBase {
            workspace_name: workspace_name.clone(),
        }
    })?;
    let base = deps.find_workspace_by_name(&base_name).ok_or_else(|| {
        WorkspaceError::BaseWorkspaceDoesNotExist {
            base_workspace_name: base_name,
        }
    })?;
    let workspace_stream = require_stream(deps, &workspace.current_content_stream_id)?;
    Ok((workspace, base, workspace_stream))
}

/// The version the base stream must still be at for pending events to land
/// verbatim: the one recorded when the workspace's stream was forked.
///
/// A base that has been rotated to a different stream since the fork can
/// never match; that is reported as a concurrency conflict on the base stream
/// without touching the store.
fn require_up_to_date_fork(
    workspace_stream: &ContentStream,
    base: &Workspace,
    deps: &dyn CommandHandlingDependencies,
) -> Result<Version, WorkspaceError> {
    let (fork_source, source_version) = match (
        &workspace_stream.source_content_stream_id,
        workspace_stream.source_version,
    ) {
        (Some(source), Some(version)) => (source, version),
        _ => {
            // A workspace on a never-forked stream (root-style) has no base
            // tip to compare against; treat the base's current tip as the
            // anchor.
            let base_stream = require_stream(deps, &base.current_content_stream_id)?;
            return Ok(base_stream.version);
        }
    };
    if fork_source != &base.current_content_stream_id {
        let base_stream = require_stream(deps, &base.current_content_stream_id)?;
        return Err(WorkspaceError::EventLog(EventLogError::ConcurrencyConflict {
            stream_name: EventStreamName::ContentStream(base.current_content_stream_id.clone())
                .to_string(),
            expected: ExpectedVersion::Exactly(source_version),
            actual: base_stream.version,
        }));
    }
    Ok(source_version)
}

/// Walk the would-be base's chain; finding the workspace there means the new
/// relation closes a loop.
fn ensure_no_base_cycle(
    deps: &dyn CommandHandlingDependencies,
    workspace_name: &WorkspaceName,
    base_workspace_name: &WorkspaceName,
) -> Result<(), WorkspaceError> {
    let mut current = Some(base_workspace_name.clone());
    while let Some(name) = current {
        if &name == workspace_name {
            return Err(WorkspaceError::BaseWorkspaceCycle {
                workspace_name: workspace_name.clone(),
                base_workspace_name: base_workspace_name.clone(),
            });
        }
        current = deps
            .find_workspace_by_name(&name)
            .and_then(|workspace| workspace.base_workspace_name);
    }
    Ok(())
}

/// Load the pending (unpublished) events of a content stream, in commit
/// order.
fn pending_events(
    store: &dyn EventStore,
    content_stream_id: &ContentStreamId,
) -> Result<Events, WorkspaceError> {
    let normalizer = EventNormalizer;
    let stream = store.load(&StreamSelector::Stream(EventStreamName::ContentStream(
        content_stream_id.clone(),
    )));
    stream
        .iter()
        .map(|envelope| normalizer.denormalize(&envelope.event))
        .collect::<Result<Events, _>>()
        .map_err(WorkspaceError::from)
}

/// Split pending events into (selected, remainder) by node selection. Events
/// affecting no node stay with the remainder.
fn partition_by_nodes(
    workspace_name: &WorkspaceName,
    pending: Events,
    nodes_to_publish: &[NodeAggregateId],
) -> Result<(Events, Events), WorkspaceError> {
    let mut selected = Vec::new();
    let mut remainder = Vec::new();
    for event in pending {
        let affected = event.affected_node_aggregate_ids();
        if affected.is_empty() {
            remainder.push(event);
            continue;
        }
        let matching = affected
            .iter()
            .filter(|id| nodes_to_publish.contains(id))
            .count();
        if matching == 0 {
            remainder.push(event);
        } else if matching == affected.len() {
            selected.push(event);
        } else {
            return Err(WorkspaceError::PendingEventStraddlesSelection {
                workspace_name: workspace_name.clone(),
            });
        }
    }
    Ok((Events::from_vec(selected), Events::from_vec(remainder)))
}
