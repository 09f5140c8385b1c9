//! Workspace relation lookup and its cache.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use strata_types::{ContentStreamId, WorkspaceName};

/// Read access to the workspace forest, as the indexing service needs it.
///
/// Implemented by the repository runtime on top of its workspace registry.
pub trait WorkspaceRelations: Send + Sync {
    fn base_workspace_of(&self, workspace_name: &WorkspaceName) -> Option<WorkspaceName>;

    /// Workspaces directly based on the given one.
    fn direct_dependents_of(&self, workspace_name: &WorkspaceName) -> Vec<WorkspaceName>;

    /// The workspace currently bound to a content stream, if any.
    fn workspace_for_content_stream(
        &self,
        content_stream_id: &ContentStreamId,
    ) -> Option<WorkspaceName>;
}

#[derive(Default)]
struct CacheState {
    ancestors: BTreeMap<WorkspaceName, Vec<WorkspaceName>>,
    descendants: BTreeMap<WorkspaceName, Vec<WorkspaceName>>,
}

/// Memoizes ancestor chains and transitive dependents.
///
/// The workspace forest changes rarely but is consulted for every indexed
/// event. Lifecycle events invalidate explicitly; entries never expire on
/// their own.
pub struct WorkspaceRelationCache {
    relations: Arc<dyn WorkspaceRelations>,
    state: RwLock<CacheState>,
}

impl WorkspaceRelationCache {
    pub fn new(relations: Arc<dyn WorkspaceRelations>) -> Self {
        Self {
            relations,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// The workspace itself followed by its base chain up to the root.
    pub fn ancestors_including_self(&self, workspace_name: &WorkspaceName) -> Vec<WorkspaceName> {
        {
            let state = self.state.read().expect("relation cache lock poisoned");
            if let Some(chain) = state.ancestors.get(workspace_name) {
                return chain.clone();
            }
        }
        let mut chain = vec![workspace_name.clone()];
        let mut current = self.relations.base_workspace_of(workspace_name);
        while let Some(name) = current {
            if chain.contains(&name) {
                break;
            }
            current = self.relations.base_workspace_of(&name);
            chain.push(name);
        }
        let mut state = self.state.write().expect("relation cache lock poisoned");
        state
            .ancestors
            .insert(workspace_name.clone(), chain.clone());
        chain
    }

    /// All workspaces transitively based on the given one, breadth-first.
    pub fn transitive_dependents(&self, workspace_name: &WorkspaceName) -> Vec<WorkspaceName> {
        {
            let state = self.state.read().expect("relation cache lock poisoned");
            if let Some(dependents) = state.descendants.get(workspace_name) {
                return dependents.clone();
            }
        }
        let mut dependents = Vec::new();
        let mut queue = self.relations.direct_dependents_of(workspace_name);
        while let Some(name) = queue.pop() {
            if dependents.contains(&name) {
                continue;
            }
            queue.extend(self.relations.direct_dependents_of(&name));
            dependents.push(name);
        }
        let mut state = self.state.write().expect("relation cache lock poisoned");
        state
            .descendants
            .insert(workspace_name.clone(), dependents.clone());
        dependents
    }

    /// Drop every cached chain the given workspace takes part in. Dropping
    /// all entries would also be correct; this keeps unrelated subtrees warm.
    pub fn invalidate(&self, workspace_name: &WorkspaceName) {
        let mut state = self.state.write().expect("relation cache lock poisoned");
        state
            .ancestors
            .retain(|key, chain| key != workspace_name && !chain.contains(workspace_name));
        state
            .descendants
            .retain(|key, dependents| key != workspace_name && !dependents.contains(workspace_name));
    }

    pub fn clear(&self) {
        let mut state = self.state.write().expect("relation cache lock poisoned");
        state.ancestors.clear();
        state.descendants.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Relations over a fixed parent map, counting lookups.
    struct FixedRelations {
        bases: BTreeMap<WorkspaceName, WorkspaceName>,
        lookups: Mutex<usize>,
    }

    impl FixedRelations {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                bases: pairs
                    .iter()
                    .map(|(child, base)| {
                        (
                            WorkspaceName::new(*child).unwrap(),
                            WorkspaceName::new(*base).unwrap(),
                        )
                    })
                    .collect(),
                lookups: Mutex::new(0),
            }
        }
    }

    impl WorkspaceRelations for FixedRelations {
        fn base_workspace_of(&self, workspace_name: &WorkspaceName) -> Option<WorkspaceName> {
            *self.lookups.lock().unwrap() += 1;
            self.bases.get(workspace_name).cloned()
        }

        fn direct_dependents_of(&self, workspace_name: &WorkspaceName) -> Vec<WorkspaceName> {
            self.bases
                .iter()
                .filter(|(_, base)| *base == workspace_name)
                .map(|(child, _)| child.clone())
                .collect()
        }

        fn workspace_for_content_stream(
            &self,
            _content_stream_id: &ContentStreamId,
        ) -> Option<WorkspaceName> {
            None
        }
    }

    fn name(s: &str) -> WorkspaceName {
        WorkspaceName::new(s).unwrap()
    }

    #[test]
    fn ancestors_start_with_self_and_end_at_root() {
        let relations = Arc::new(FixedRelations::new(&[
            ("user-a", "live"),
            ("review", "user-a"),
        ]));
        let cache = WorkspaceRelationCache::new(relations);
        assert_eq!(
            cache.ancestors_including_self(&name("review")),
            vec![name("review"), name("user-a"), name("live")]
        );
        assert_eq!(
            cache.ancestors_including_self(&name("live")),
            vec![name("live")]
        );
    }

    #[test]
    fn transitive_dependents_cover_the_whole_subtree() {
        let relations = Arc::new(FixedRelations::new(&[
            ("user-a", "live"),
            ("user-b", "live"),
            ("review", "user-a"),
        ]));
        let cache = WorkspaceRelationCache::new(relations);
        let mut dependents = cache.transitive_dependents(&name("live"));
        dependents.sort();
        assert_eq!(dependents, vec![name("review"), name("user-a"), name("user-b")]);
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let relations = Arc::new(FixedRelations::new(&[("user-a", "live")]));
        let cache = WorkspaceRelationCache::new(Arc::clone(&relations) as Arc<dyn WorkspaceRelations>);
        cache.ancestors_including_self(&name("user-a"));
        let after_first = *relations.lookups.lock().unwrap();
        cache.ancestors_including_self(&name("user-a"));
        assert_eq!(*relations.lookups.lock().unwrap(), after_first);
    }

    #[test]
    fn invalidate_drops_chains_containing_the_workspace() {
        let relations = Arc::new(FixedRelations::new(&[
            ("user-a", "live"),
            ("other", "standalone"),
        ]));
        let cache = WorkspaceRelationCache::new(Arc::clone(&relations) as Arc<dyn WorkspaceRelations>);
        cache.ancestors_including_self(&name("user-a"));
        cache.ancestors_including_self(&name("other"));
        let baseline = *relations.lookups.lock().unwrap();

        cache.invalidate(&name("live"));
        // user-a's chain is recomputed, other's is still cached.
        cache.ancestors_including_self(&name("other"));
        assert_eq!(*relations.lookups.lock().unwrap(), baseline);
        cache.ancestors_including_self(&name("user-a"));
        assert!(*relations.lookups.lock().unwrap() > baseline);
    }
}
