//! Reference edges between nodes.

use strata_types::PropertyName;

use crate::node::{Node, Nodes};
use crate::property::PropertyCollection;

/// An edge from one node to another, with its own property bag.
///
/// For outgoing references, `name` is the reference property on the source
/// node and `node` the target it points to. For back-references, `name` is
/// the reference property on the *referencing* node and `node` is that
/// referencing node.
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    pub name: PropertyName,
    pub node: Node,
    pub properties: PropertyCollection,
}

/// An ordered, 0-indexed, immutable collection of [`Reference`]s.
///
/// Duplicate names are allowed: a multi-valued reference property yields one
/// entry per edge, all under the same name. Any "edit" produces a new
/// collection; this one never changes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct References {
    references: Vec<Reference>,
}

impl References {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_vec(references: Vec<Reference>) -> Self {
        Self { references }
    }

    pub fn get(&self, index: usize) -> Option<&Reference> {
        self.references.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// The target (or referencing, for back-references) nodes, in edge order.
    pub fn nodes(&self) -> Nodes {
        self.references
            .iter()
            .map(|reference| reference.node.clone())
            .collect()
    }
}

impl FromIterator<Reference> for References {
    fn from_iter<I: IntoIterator<Item = Reference>>(iter: I) -> Self {
        Self {
            references: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for References {
    type Item = Reference;
    type IntoIter = std::vec::IntoIter<Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.references.into_iter()
    }
}

impl<'a> IntoIterator for &'a References {
    type Item = &'a Reference;
    type IntoIter = std::slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.references.iter()
    }
}
