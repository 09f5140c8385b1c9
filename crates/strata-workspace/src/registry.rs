//! The workspace registry read model.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;

use strata_eventlog::{Event, EventEnvelope, Projection};
use strata_types::{Workspace, WorkspaceName};

/// Projects workspace lifecycle events into the name → workspace map.
///
/// Tracks, per workspace, the base workspace (if any) and the current content
/// stream. Node-scoped events are not its concern.
#[derive(Default)]
pub struct WorkspaceRegistryProjection {
    state: RwLock<BTreeMap<WorkspaceName, Workspace>>,
}

impl WorkspaceRegistryProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_workspace_by_name(&self, workspace_name: &WorkspaceName) -> Option<Workspace> {
        let state = self.state.read().expect("workspace registry lock poisoned");
        state.get(workspace_name).cloned()
    }

    /// All workspaces, ordered by name.
    pub fn all_workspaces(&self) -> Vec<Workspace> {
        let state = self.state.read().expect("workspace registry lock poisoned");
        state.values().cloned().collect()
    }

    /// The workspaces directly based on `base_workspace_name`, ordered by
    /// name.
    pub fn dependents_of(&self, base_workspace_name: &WorkspaceName) -> Vec<WorkspaceName> {
        let state = self.state.read().expect("workspace registry lock poisoned");
        state
            .values()
            .filter(|workspace| {
                workspace.base_workspace_name.as_ref() == Some(base_workspace_name)
            })
            .map(|workspace| workspace.workspace_name.clone())
            .collect()
    }

    /// The base chain of a workspace, starting with its direct base and
    /// ending at the root.
    pub fn base_chain(&self, workspace_name: &WorkspaceName) -> Vec<WorkspaceName> {
        let state = self.state.read().expect("workspace registry lock poisoned");
        let mut chain = Vec::new();
        let mut current = state
            .get(workspace_name)
            .and_then(|workspace| workspace.base_workspace_name.clone());
        while let Some(name) = current {
            // Registries built from committed events have no cycles; stop
            // anyway if one ever shows up.
            if chain.contains(&name) {
                break;
            }
            current = state
                .get(&name)
                .and_then(|workspace| workspace.base_workspace_name.clone());
            chain.push(name);
        }
        chain
    }

    fn apply_to_state(&self, event: &Event) {
        let mut state = self.state.write().expect("workspace registry lock poisoned");
        match event {
            Event::RootWorkspaceWasCreated {
                workspace_name,
                content_stream_id,
            } => {
                state.insert(
                    workspace_name.clone(),
                    Workspace {
                        workspace_name: workspace_name.clone(),
                        base_workspace_name: None,
                        current_content_stream_id: content_stream_id.clone(),
                    },
                );
                debug!(workspace = %workspace_name, "root workspace registered");
            }
            Event::WorkspaceWasCreated {
                workspace_name,
                base_workspace_name,
                content_stream_id,
            } => {
                state.insert(
                    workspace_name.clone(),
                    Workspace {
                        workspace_name: workspace_name.clone(),
                        base_workspace_name: Some(base_workspace_name.clone()),
                        current_content_stream_id: content_stream_id.clone(),
                    },
                );
                debug!(workspace = %workspace_name, base = %base_workspace_name, "workspace registered");
            }
            Event::WorkspaceBaseWorkspaceWasChanged {
                workspace_name,
                base_workspace_name,
                new_content_stream_id,
            } => {
                if let Some(workspace) = state.get_mut(workspace_name) {
                    workspace.base_workspace_name = Some(base_workspace_name.clone());
                    workspace.current_content_stream_id = new_content_stream_id.clone();
                }
            }
            Event::WorkspaceWasPublished {
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
                if let Some(workspace) = state.get_mut(workspace_name) {
                    workspace.current_content_stream_id = new_content_stream_id.clone();
                }
            }
            _ => {}
        }
    }
}

impl Projection for WorkspaceRegistryProjection {
    fn can_handle(&self, event: &Event) -> bool {
        matches!(
            event,
            Event::RootWorkspaceWasCreated { .. }
                | Event::WorkspaceWasCreated { .. }
                | Event::WorkspaceBaseWorkspaceWasChanged { .. }
                | Event::WorkspaceWasPublished { .. }
                | Event::WorkspaceWasPartiallyPublished { .. }
                | Event::WorkspaceWasDiscarded { .. }
        )
    }

    fn apply(&self, event: &Event, _envelope: &EventEnvelope) {
        self.apply_to_state(event);
    }
}

#[cfg(test)]
mod tests {
    use strata_eventlog::{EventData, EventStreamName, SequenceNumber, Version};
    use strata_types::ContentStreamId;

    use super::*;

    fn name(s: &str) -> WorkspaceName {
        WorkspaceName::new(s).unwrap()
    }

    fn stream(s: &str) -> ContentStreamId {
        ContentStreamId::new(s).unwrap()
    }

    fn apply(registry: &WorkspaceRegistryProjection, event: Event) {
        let envelope = EventEnvelope {
            stream_name: EventStreamName::Workspace(name("live")),
            event: EventData {
                event_type: event.event_type().to_string(),
                payload: serde_json::Value::Null,
            },
            version: Version(1),
            sequence_number: SequenceNumber(1),
        };
        registry.apply(&event, &envelope);
    }

    fn seeded() -> WorkspaceRegistryProjection {
        let registry = WorkspaceRegistryProjection::new();
        apply(
            &registry,
            Event::RootWorkspaceWasCreated {
                workspace_name: name("live"),
                content_stream_id: stream("cs-live"),
            },
        );
        apply(
            &registry,
            Event::WorkspaceWasCreated {
                workspace_name: name("user-a"),
                base_workspace_name: name("live"),
                content_stream_id: stream("cs-user-a"),
            },
        );
        registry
    }

    #[test]
    fn registers_workspaces_with_their_base() {
        let registry = seeded();
        let live = registry.find_workspace_by_name(&name("live")).unwrap();
        assert!(live.is_root_workspace());
        let user = registry.find_workspace_by_name(&name("user-a")).unwrap();
        assert_eq!(user.base_workspace_name, Some(name("live")));
        assert_eq!(user.current_content_stream_id, stream("cs-user-a"));
    }

    #[test]
    fn publish_repoints_the_current_stream() {
        let registry = seeded();
        apply(
            &registry,
            Event::WorkspaceWasPublished {
                workspace_name: name("user-a"),
                new_content_stream_id: stream("cs-user-a-2"),
            },
        );
        let user = registry.find_workspace_by_name(&name("user-a")).unwrap();
        assert_eq!(user.current_content_stream_id, stream("cs-user-a-2"));
        // The base relation is untouched.
        assert_eq!(user.base_workspace_name, Some(name("live")));
    }

    #[test]
    fn base_chain_walks_to_the_root() {
        let registry = seeded();
        apply(
            &registry,
            Event::WorkspaceWasCreated {
                workspace_name: name("review"),
                base_workspace_name: name("user-a"),
                content_stream_id: stream("cs-review"),
            },
        );
        assert_eq!(
            registry.base_chain(&name("review")),
            vec![name("user-a"), name("live")]
        );
        assert!(registry.base_chain(&name("live")).is_empty());
    }

    #[test]
    fn dependents_are_direct_only() {
        let registry = seeded();
        apply(
            &registry,
            Event::WorkspaceWasCreated {
                workspace_name: name("review"),
                base_workspace_name: name("user-a"),
                content_stream_id: stream("cs-review"),
            },
        );
        assert_eq!(registry.dependents_of(&name("live")), vec![name("user-a")]);
        assert_eq!(registry.dependents_of(&name("user-a")), vec![name("review")]);
        assert!(registry.dependents_of(&name("review")).is_empty());
    }

    #[test]
    fn change_base_updates_relation_and_stream() {
        let registry = seeded();
        apply(
            &registry,
            Event::RootWorkspaceWasCreated {
                workspace_name: name("staging"),
                content_stream_id: stream("cs-staging"),
            },
        );
        apply(
            &registry,
            Event::WorkspaceBaseWorkspaceWasChanged {
                workspace_name: name("user-a"),
                base_workspace_name: name("staging"),
                new_content_stream_id: stream("cs-user-a-2"),
            },
        );
        let user = registry.find_workspace_by_name(&name("user-a")).unwrap();
        assert_eq!(user.base_workspace_name, Some(name("staging")));
        assert_eq!(user.current_content_stream_id, stream("cs-user-a-2"));
    }
}
