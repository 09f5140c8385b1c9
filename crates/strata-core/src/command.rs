//! The closed command set.

use strata_graph::{
    CreateNodeAggregateWithNode, RemoveNodeAggregate, SetNodeProperties, SetNodeReferences,
    TagSubtree, UntagSubtree,
};
use strata_workspace::{
    ChangeBaseWorkspace, CreateRootWorkspace, CreateWorkspace, DiscardWorkspace,
    PublishIndividualNodesFromWorkspace, PublishWorkspace,
};

/// Every command the repository handles.
///
/// The set is closed on purpose: dispatch is a pattern match, so adding a
/// command is a compile-time visible change, and no handler can be swapped in
/// at runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CreateRootWorkspace(CreateRootWorkspace),
    CreateWorkspace(CreateWorkspace),
    ChangeBaseWorkspace(ChangeBaseWorkspace),
    PublishWorkspace(PublishWorkspace),
    PublishIndividualNodesFromWorkspace(PublishIndividualNodesFromWorkspace),
    DiscardWorkspace(DiscardWorkspace),
    CreateNodeAggregateWithNode(CreateNodeAggregateWithNode),
    SetNodeProperties(SetNodeProperties),
    SetNodeReferences(SetNodeReferences),
    TagSubtree(TagSubtree),
    UntagSubtree(UntagSubtree),
    RemoveNodeAggregate(RemoveNodeAggregate),
}

macro_rules! command_from {
    ($($variant:ident($command:ty)),+ $(,)?) => {
        $(impl From<$command> for Command {
            fn from(command: $command) -> Self {
                Command::$variant(command)
            }
        })+
    };
}

command_from!(
    CreateRootWorkspace(CreateRootWorkspace),
    CreateWorkspace(CreateWorkspace),
    ChangeBaseWorkspace(ChangeBaseWorkspace),
    PublishWorkspace(PublishWorkspace),
    PublishIndividualNodesFromWorkspace(PublishIndividualNodesFromWorkspace),
    DiscardWorkspace(DiscardWorkspace),
    CreateNodeAggregateWithNode(CreateNodeAggregateWithNode),
    SetNodeProperties(SetNodeProperties),
    SetNodeReferences(SetNodeReferences),
    TagSubtree(TagSubtree),
    UntagSubtree(UntagSubtree),
    RemoveNodeAggregate(RemoveNodeAggregate),
);

/// Returned when a command has been fully handled.
///
/// By the time a caller holds this value, the events are committed and every
/// projection has applied them; reads through the repository observe the
/// command's effects. Carries no data today; it marks that point in time.
#[derive(Debug)]
pub struct CommandResult {
    pub(crate) _private: (),
}
