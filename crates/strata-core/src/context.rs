//! The read-side facade handed to command handlers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use strata_graph::{
    CommandHandlingDependencies, ContentGraph, ContentGraphProjection, ContentStream, GraphError,
};
use strata_types::{ContentStreamId, Workspace, WorkspaceName};
use strata_workspace::WorkspaceRegistryProjection;

use crate::error::CoreError;

/// Resolves workspace names for command handlers, honoring scoped content
/// stream overrides.
///
/// An override temporarily rebinds one workspace name to a candidate stream,
/// so constraint checks run against state that is not (yet) the workspace's
/// durable stream. Overrides are scoped by a guard and must not nest per
/// workspace.
pub struct CommandContext {
    projection: Arc<ContentGraphProjection>,
    registry: Arc<WorkspaceRegistryProjection>,
    overrides: RwLock<HashMap<WorkspaceName, ContentStreamId>>,
}

impl CommandContext {
    pub fn new(
        projection: Arc<ContentGraphProjection>,
        registry: Arc<WorkspaceRegistryProjection>,
    ) -> Self {
        Self {
            projection,
            registry,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Rebind `workspace_name` to `content_stream_id` for the guard's
    /// lifetime. Fails if an override for the workspace is already active.
    pub fn content_stream_override(
        &self,
        workspace_name: WorkspaceName,
        content_stream_id: ContentStreamId,
    ) -> Result<ContentStreamOverrideGuard<'_>, CoreError> {
        let mut overrides = self.overrides.write().expect("override table lock poisoned");
        if overrides.contains_key(&workspace_name) {
            return Err(CoreError::OverrideAlreadyActive { workspace_name });
        }
        debug!(workspace = %workspace_name, stream = %content_stream_id, "content stream override active");
        overrides.insert(workspace_name.clone(), content_stream_id);
        Ok(ContentStreamOverrideGuard {
            context: self,
            workspace_name,
        })
    }

    /// Run `f` with `workspace_name` rebound to `content_stream_id`. The
    /// override is removed when `f` returns, panic or not.
    pub fn with_content_stream_override<R>(
        &self,
        workspace_name: WorkspaceName,
        content_stream_id: ContentStreamId,
        f: impl FnOnce() -> R,
    ) -> Result<R, CoreError> {
        let _guard = self.content_stream_override(workspace_name, content_stream_id)?;
        Ok(f())
    }

    fn overridden_stream(&self, workspace_name: &WorkspaceName) -> Option<ContentStreamId> {
        self.overrides
            .read()
            .expect("override table lock poisoned")
            .get(workspace_name)
            .cloned()
    }
}

impl CommandHandlingDependencies for CommandContext {
    fn find_workspace_by_name(&self, workspace_name: &WorkspaceName) -> Option<Workspace> {
        self.registry.find_workspace_by_name(workspace_name)
    }

    fn current_content_stream_id(&self, workspace_name: &WorkspaceName) -> Option<ContentStreamId> {
        if let Some(overridden) = self.overridden_stream(workspace_name) {
            return Some(overridden);
        }
        self.registry
            .find_workspace_by_name(workspace_name)
            .map(|workspace| workspace.current_content_stream_id)
    }

    fn find_content_stream(&self, content_stream_id: &ContentStreamId) -> Option<ContentStream> {
        self.projection.find_content_stream(content_stream_id)
    }

    fn content_graph(&self, workspace_name: &WorkspaceName) -> Result<ContentGraph, GraphError> {
        let content_stream_id = self.current_content_stream_id(workspace_name).ok_or_else(
            || GraphError::WorkspaceDoesNotExist {
                workspace_name: workspace_name.clone(),
            },
        )?;
        Ok(self
            .projection
            .graph_for(workspace_name.clone(), content_stream_id))
    }
}

/// Removes its override when dropped.
pub struct ContentStreamOverrideGuard<'a> {
    context: &'a CommandContext,
    workspace_name: WorkspaceName,
}

impl std::fmt::Debug for ContentStreamOverrideGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStreamOverrideGuard")
            .field("workspace_name", &self.workspace_name)
            .finish_non_exhaustive()
    }
}

impl Drop for ContentStreamOverrideGuard<'_> {
    fn drop(&mut self) {
        let mut overrides = self
            .context
            .overrides
            .write()
            .expect("override table lock poisoned");
        overrides.remove(&self.workspace_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CommandContext {
        CommandContext::new(
            Arc::new(ContentGraphProjection::new()),
            Arc::new(WorkspaceRegistryProjection::new()),
        )
    }

    fn name(s: &str) -> WorkspaceName {
        WorkspaceName::new(s).unwrap()
    }

    fn stream(s: &str) -> ContentStreamId {
        ContentStreamId::new(s).unwrap()
    }

    #[test]
    fn override_rebinds_and_unbinds() {
        let context = context();
        assert_eq!(context.current_content_stream_id(&name("live")), None);
        {
            let _guard = context
                .content_stream_override(name("live"), stream("cs-candidate"))
                .unwrap();
            assert_eq!(
                context.current_content_stream_id(&name("live")),
                Some(stream("cs-candidate"))
            );
        }
        assert_eq!(context.current_content_stream_id(&name("live")), None);
    }

    #[test]
    fn overrides_must_not_nest_per_workspace() {
        let context = context();
        let _guard = context
            .content_stream_override(name("live"), stream("cs-a"))
            .unwrap();
        let err = context
            .content_stream_override(name("live"), stream("cs-b"))
            .unwrap_err();
        assert!(matches!(err, CoreError::OverrideAlreadyActive { .. }));
        // A different workspace can be overridden concurrently.
        assert!(context
            .content_stream_override(name("user-a"), stream("cs-c"))
            .is_ok());
    }

    #[test]
    fn closure_scope_removes_the_override() {
        let context = context();
        let seen = context
            .with_content_stream_override(name("live"), stream("cs-a"), || {
                context.current_content_stream_id(&name("live"))
            })
            .unwrap();
        assert_eq!(seen, Some(stream("cs-a")));
        assert_eq!(context.current_content_stream_id(&name("live")), None);
    }
}
