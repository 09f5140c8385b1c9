//! Node read model.

use serde::{Deserialize, Serialize};
use strata_types::{
    DimensionSpacePoint, NodeAggregateId, NodeTypeName, SubtreeTags, WorkspaceName,
};

use crate::property::PropertyCollection;

/// One node variant as seen through a workspace.
///
/// Identified by (aggregate id, dimension space point, workspace). A `Node`
/// is an immutable value; the projection produces a new value on each
/// relevant event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub aggregate_id: NodeAggregateId,
    pub workspace_name: WorkspaceName,
    pub dimension_space_point: DimensionSpacePoint,
    pub node_type_name: NodeTypeName,
    pub properties: PropertyCollection,
    pub subtree_tags: SubtreeTags,
}

/// An ordered, immutable collection of nodes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Nodes {
    nodes: Vec<Node>,
}

impl Nodes {
    pub fn from_vec(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<Node> for Nodes {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Nodes {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Nodes {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
