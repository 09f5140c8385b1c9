//! The repository entry point.

use std::sync::Arc;

use tracing::info;

use strata_eventlog::{EventStore, EventsToPublish, InMemoryEventStore, Projection};
use strata_graph::{
    CommandHandlingDependencies, ContentGraph, ContentGraphProjection, ContentStream,
    NodeAggregateCommandHandler,
};
use strata_types::{ContentRepositoryId, ContentStreamId, Workspace, WorkspaceName};
use strata_usage::{
    AssetUsageIndex, AssetUsageIndexingService, InMemoryAssetUsageIndex, WorkspaceRelations,
};
use strata_workspace::{WorkspaceCommandHandler, WorkspaceRegistryProjection};

use crate::command::{Command, CommandResult};
use crate::context::CommandContext;
use crate::error::CoreError;
use crate::persister::EventPersister;

/// One event-sourced content repository: event log, projections and command
/// handling behind a single handle.
///
/// Commands are handled synchronously. When [`handle`](ContentRepository::handle)
/// returns, the resulting events are committed and every projection has
/// applied them, so reads immediately observe the command's effects.
pub struct ContentRepository {
    id: ContentRepositoryId,
    store: Arc<InMemoryEventStore>,
    graph: Arc<ContentGraphProjection>,
    registry: Arc<WorkspaceRegistryProjection>,
    usage_index: Arc<InMemoryAssetUsageIndex>,
    persister: EventPersister,
    context: CommandContext,
    node_handler: NodeAggregateCommandHandler,
    workspace_handler: WorkspaceCommandHandler,
}

/// Workspace relation lookup for the usage index, backed by the registry.
struct RegistryRelations {
    registry: Arc<WorkspaceRegistryProjection>,
}

impl WorkspaceRelations for RegistryRelations {
    fn base_workspace_of(&self, workspace_name: &WorkspaceName) -> Option<WorkspaceName> {
        self.registry
            .find_workspace_by_name(workspace_name)
            .and_then(|workspace| workspace.base_workspace_name)
    }

    fn direct_dependents_of(&self, workspace_name: &WorkspaceName) -> Vec<WorkspaceName> {
        self.registry.dependents_of(workspace_name)
    }

    fn workspace_for_content_stream(
        &self,
        content_stream_id: &ContentStreamId,
    ) -> Option<WorkspaceName> {
        self.registry
            .all_workspaces()
            .into_iter()
            .find(|workspace| &workspace.current_content_stream_id == content_stream_id)
            .map(|workspace| workspace.workspace_name)
    }
}

impl ContentRepository {
    pub fn new(id: ContentRepositoryId) -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let graph = Arc::new(ContentGraphProjection::new());
        let registry = Arc::new(WorkspaceRegistryProjection::new());
        let usage_index = Arc::new(InMemoryAssetUsageIndex::new());
        let usage_service = Arc::new(AssetUsageIndexingService::new(
            id.clone(),
            Arc::clone(&usage_index) as Arc<dyn AssetUsageIndex>,
            Arc::new(RegistryRelations {
                registry: Arc::clone(&registry),
            }) as Arc<dyn WorkspaceRelations>,
        ));
        let persister = EventPersister::new(
            Arc::clone(&store) as Arc<dyn EventStore>,
            vec![
                Arc::clone(&graph) as Arc<dyn Projection>,
                Arc::clone(&registry) as Arc<dyn Projection>,
                usage_service as Arc<dyn Projection>,
            ],
        );
        let context = CommandContext::new(Arc::clone(&graph), Arc::clone(&registry));
        info!(repository = %id, "content repository initialized");
        Self {
            id,
            store,
            graph,
            registry,
            usage_index,
            persister,
            context,
            node_handler: NodeAggregateCommandHandler,
            workspace_handler: WorkspaceCommandHandler,
        }
    }

    pub fn id(&self) -> &ContentRepositoryId {
        &self.id
    }

    /// Handle one command to completion: validate, commit, project.
    pub fn handle(&self, command: impl Into<Command>) -> Result<CommandResult, CoreError> {
        match command.into() {
            Command::CreateRootWorkspace(command) => self.publish_all(
                self.workspace_handler
                    .handle_create_root_workspace(command, &self.context)?,
            )?,
            Command::CreateWorkspace(command) => self.publish_all(
                self.workspace_handler
                    .handle_create_workspace(command, &self.context)?,
            )?,
            Command::ChangeBaseWorkspace(command) => self.publish_all(
                self.workspace_handler.handle_change_base_workspace(
                    command,
                    &self.context,
                    &*self.store,
                )?,
            )?,
            Command::PublishWorkspace(command) => self.publish_all(
                self.workspace_handler.handle_publish_workspace(
                    command,
                    &self.context,
                    &*self.store,
                )?,
            )?,
            Command::PublishIndividualNodesFromWorkspace(command) => self.publish_all(
                self.workspace_handler.handle_publish_individual_nodes(
                    command,
                    &self.context,
                    &*self.store,
                )?,
            )?,
            Command::DiscardWorkspace(command) => self.publish_all(
                self.workspace_handler
                    .handle_discard_workspace(command, &self.context)?,
            )?,
            Command::CreateNodeAggregateWithNode(command) => self.publish_one(
                self.node_handler
                    .handle_create_node_aggregate_with_node(command, &self.context)?,
            )?,
            Command::SetNodeProperties(command) => self.publish_one(
                self.node_handler
                    .handle_set_node_properties(command, &self.context)?,
            )?,
            Command::SetNodeReferences(command) => self.publish_one(
                self.node_handler
                    .handle_set_node_references(command, &self.context)?,
            )?,
            Command::TagSubtree(command) => self.publish_one(
                self.node_handler.handle_tag_subtree(command, &self.context)?,
            )?,
            Command::UntagSubtree(command) => self.publish_one(
                self.node_handler
                    .handle_untag_subtree(command, &self.context)?,
            )?,
            Command::RemoveNodeAggregate(command) => self.publish_one(
                self.node_handler
                    .handle_remove_node_aggregate(command, &self.context)?,
            )?,
        }
        Ok(CommandResult { _private: () })
    }

    fn publish_one(&self, batch: EventsToPublish) -> Result<(), CoreError> {
        self.persister.publish_events(batch).map_err(CoreError::from)
    }

    fn publish_all(&self, batches: Vec<EventsToPublish>) -> Result<(), CoreError> {
        for batch in batches {
            self.persister.publish_events(batch)?;
        }
        Ok(())
    }

    // ---- Read access ----

    pub fn content_graph(&self, workspace_name: &WorkspaceName) -> Result<ContentGraph, CoreError> {
        self.context
            .content_graph(workspace_name)
            .map_err(CoreError::from)
    }

    pub fn find_workspace_by_name(&self, workspace_name: &WorkspaceName) -> Option<Workspace> {
        self.registry.find_workspace_by_name(workspace_name)
    }

    pub fn find_content_stream(&self, content_stream_id: &ContentStreamId) -> Option<ContentStream> {
        self.graph.find_content_stream(content_stream_id)
    }

    pub fn asset_usage_index(&self) -> &Arc<InMemoryAssetUsageIndex> {
        &self.usage_index
    }

    /// The read-side facade, including the scoped override API.
    pub fn command_context(&self) -> &CommandContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::{json, Value};
    use strata_eventlog::{EventLogError, Version};
    use strata_graph::{CreateNodeAggregateWithNode, SetNodeProperties};
    use strata_types::{
        DimensionSpacePoint, NodeAggregateId, NodeTypeName, PropertyName, VisibilityConstraints,
    };
    use strata_usage::{AssetId, AssetUsageIndex};
    use strata_workspace::{
        CreateRootWorkspace, CreateWorkspace, DiscardWorkspace,
        PublishIndividualNodesFromWorkspace, PublishWorkspace, WorkspaceError,
    };

    use super::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn name(s: &str) -> WorkspaceName {
        WorkspaceName::new(s).unwrap()
    }

    fn node(s: &str) -> NodeAggregateId {
        NodeAggregateId::new(s).unwrap()
    }

    fn prop(s: &str) -> PropertyName {
        PropertyName::new(s).unwrap()
    }

    fn dsp() -> DimensionSpacePoint {
        DimensionSpacePoint::from_coordinates([("language", "en")])
    }

    /// Repository with a "live" root and a "user-a" workspace on top.
    fn repository() -> ContentRepository {
        init_tracing();
        let repository = ContentRepository::new(ContentRepositoryId::new("default").unwrap());
        repository
            .handle(CreateRootWorkspace::new(name("live")))
            .unwrap();
        repository
            .handle(CreateWorkspace::new(name("user-a"), name("live")))
            .unwrap();
        repository
    }

    fn create_node(repository: &ContentRepository, workspace: &str, id: &str, title: &str) {
        repository
            .handle(CreateNodeAggregateWithNode {
                workspace_name: name(workspace),
                node_aggregate_id: node(id),
                node_type_name: NodeTypeName::new("acme.site:document").unwrap(),
                origin_dimension_space_point: dsp(),
                initial_property_values: BTreeMap::from([(prop("title"), Value::from(title))]),
            })
            .unwrap();
    }

    fn title_in(repository: &ContentRepository, workspace: &str, id: &str) -> Option<Value> {
        repository
            .content_graph(&name(workspace))
            .unwrap()
            .find_node_by_id(&node(id), &dsp(), &VisibilityConstraints::unrestricted())
            .and_then(|n| n.properties.get(&prop("title")).cloned())
    }

    fn current_stream_version(repository: &ContentRepository, workspace: &str) -> Version {
        let ws = repository.find_workspace_by_name(&name(workspace)).unwrap();
        repository
            .find_content_stream(&ws.current_content_stream_id)
            .unwrap()
            .version
    }

    #[test]
    fn edits_are_isolated_until_published() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "Hello");

        assert_eq!(title_in(&repository, "user-a", "n1"), Some(Value::from("Hello")));
        assert_eq!(title_in(&repository, "live", "n1"), None);
        assert_eq!(current_stream_version(&repository, "user-a"), Version(1));
        assert_eq!(current_stream_version(&repository, "live"), Version(0));
    }

    #[test]
    fn each_edit_advances_the_stream_version_by_one() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "Hello");
        repository
            .handle(SetNodeProperties {
                workspace_name: name("user-a"),
                node_aggregate_id: node("n1"),
                origin_dimension_space_point: dsp(),
                property_values: BTreeMap::from([(prop("title"), Value::from("Hello 2"))]),
            })
            .unwrap();
        assert_eq!(current_stream_version(&repository, "user-a"), Version(2));
        assert_eq!(title_in(&repository, "user-a", "n1"), Some(Value::from("Hello 2")));
    }

    #[test]
    fn publish_moves_changes_and_resets_the_workspace() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "Hello");
        let old_stream = repository
            .find_workspace_by_name(&name("user-a"))
            .unwrap()
            .current_content_stream_id;

        repository
            .handle(PublishWorkspace::new(name("user-a")))
            .unwrap();

        // The base received the change.
        assert_eq!(title_in(&repository, "live", "n1"), Some(Value::from("Hello")));
        assert_eq!(current_stream_version(&repository, "live"), Version(1));

        // The workspace continues on a fresh stream with nothing pending.
        assert_eq!(current_stream_version(&repository, "user-a"), Version(0));
        let new_stream = repository
            .find_workspace_by_name(&name("user-a"))
            .unwrap()
            .current_content_stream_id;
        assert_ne!(new_stream, old_stream);
        assert!(!repository.find_content_stream(&old_stream).unwrap().is_open());

        // And it still sees the published content through the fork.
        assert_eq!(title_in(&repository, "user-a", "n1"), Some(Value::from("Hello")));
    }

    #[test]
    fn publish_conflict_is_surfaced_not_retried() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "Hello");
        // The base advances after user-a's fork.
        create_node(&repository, "live", "other", "Base change");

        let err = repository
            .handle(PublishWorkspace::new(name("user-a")))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::EventLog(EventLogError::ConcurrencyConflict { .. })
        ));
        // The workspace still has its pending change.
        assert_eq!(current_stream_version(&repository, "user-a"), Version(1));
        assert_eq!(title_in(&repository, "live", "n1"), None);
    }

    #[test]
    fn partial_publish_keeps_unselected_changes_pending() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "First");
        create_node(&repository, "user-a", "n2", "Second");

        repository
            .handle(PublishIndividualNodesFromWorkspace::new(
                name("user-a"),
                vec![node("n1")],
            ))
            .unwrap();

        assert_eq!(title_in(&repository, "live", "n1"), Some(Value::from("First")));
        assert_eq!(title_in(&repository, "live", "n2"), None);
        // The unselected change survived the stream rotation.
        assert_eq!(title_in(&repository, "user-a", "n2"), Some(Value::from("Second")));
        assert_eq!(current_stream_version(&repository, "user-a"), Version(1));
    }

    #[test]
    fn discard_drops_pending_changes() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "Hello");
        repository
            .handle(DiscardWorkspace::new(name("user-a")))
            .unwrap();
        assert_eq!(title_in(&repository, "user-a", "n1"), None);
        assert_eq!(current_stream_version(&repository, "user-a"), Version(0));
    }

    #[test]
    fn asset_usage_follows_the_publication() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "See asset://img-1");

        let asset = AssetId::new("img-1").unwrap();
        let usages = repository.asset_usage_index().usages_of_asset(&asset);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].workspace_name, name("user-a"));

        repository
            .handle(PublishWorkspace::new(name("user-a")))
            .unwrap();

        // De-duplicated along the base chain: one row, now at live.
        let usages = repository.asset_usage_index().usages_of_asset(&asset);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].workspace_name, name("live"));
    }

    #[test]
    fn discarded_workspaces_leave_no_usage_rows() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "See asset://img-1");
        repository
            .handle(DiscardWorkspace::new(name("user-a")))
            .unwrap();
        let asset = AssetId::new("img-1").unwrap();
        assert!(repository.asset_usage_index().usages_of_asset(&asset).is_empty());
    }

    #[test]
    fn root_workspace_cannot_be_published() {
        let repository = repository();
        let err = repository
            .handle(PublishWorkspace::new(name("live")))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Workspace(WorkspaceError::WorkspaceHasNoBase { .. })
        ));
    }

    #[test]
    fn override_scopes_reads_to_a_candidate_stream() {
        let repository = repository();
        create_node(&repository, "user-a", "n1", "Hello");
        let user_stream = repository
            .find_workspace_by_name(&name("user-a"))
            .unwrap()
            .current_content_stream_id;

        // Rebind "live" to user-a's stream: the pending node becomes visible
        // under the live name, but only inside the scope.
        let context = repository.command_context();
        let seen = context
            .with_content_stream_override(name("live"), user_stream, || {
                repository
                    .content_graph(&name("live"))
                    .unwrap()
                    .find_node_by_id(&node("n1"), &dsp(), &VisibilityConstraints::unrestricted())
                    .is_some()
            })
            .unwrap();
        assert!(seen);
        assert_eq!(title_in(&repository, "live", "n1"), None);
    }

    #[test]
    fn json_property_values_round_trip_through_publishing() {
        let repository = repository();
        repository
            .handle(CreateNodeAggregateWithNode {
                workspace_name: name("user-a"),
                node_aggregate_id: node("n1"),
                node_type_name: NodeTypeName::new("acme.site:page").unwrap(),
                origin_dimension_space_point: dsp(),
                initial_property_values: BTreeMap::from([(
                    prop("settings"),
                    json!({ "columns": 2, "sticky": true }),
                )]),
            })
            .unwrap();
        repository
            .handle(PublishWorkspace::new(name("user-a")))
            .unwrap();
        let settings = repository
            .content_graph(&name("live"))
            .unwrap()
            .find_node_by_id(&node("n1"), &dsp(), &VisibilityConstraints::unrestricted())
            .unwrap()
            .properties
            .get(&prop("settings"))
            .cloned();
        assert_eq!(settings, Some(json!({ "columns": 2, "sticky": true })));
    }
}
