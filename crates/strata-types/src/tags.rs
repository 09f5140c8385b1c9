//! Subtree tags and the visibility constraints derived from them.
//!
//! A subtree tag is a label attached to a node that (conceptually) covers the
//! node's whole subtree. Viewers carry [`VisibilityConstraints`]: the set of
//! tags whose subtrees are hidden from them. Constraints from several denied
//! privileges are merged via set union.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A label that can hide a node subtree from viewers lacking the matching
/// privilege.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtreeTag(String);

impl SubtreeTag {
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(TypeError::InvalidSubtreeTag {
                tag,
                reason: "must not be empty".into(),
            });
        }
        if !tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(TypeError::InvalidSubtreeTag {
                tag,
                reason: "only lowercase letters, digits, '-' and '_' are allowed".into(),
            });
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubtreeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SubtreeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubtreeTag({})", self.0)
    }
}

/// An immutable set of subtree tags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SubtreeTags {
    tags: BTreeSet<SubtreeTag>,
}

impl SubtreeTags {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(tag: SubtreeTag) -> Self {
        Self {
            tags: BTreeSet::from([tag]),
        }
    }

    pub fn contains(&self, tag: &SubtreeTag) -> bool {
        self.tags.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubtreeTag> {
        self.tags.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Set union, producing a new collection.
    pub fn merge(&self, other: &SubtreeTags) -> Self {
        Self {
            tags: self.tags.union(&other.tags).cloned().collect(),
        }
    }

    /// A new collection with `tag` added.
    pub fn with(&self, tag: SubtreeTag) -> Self {
        let mut tags = self.tags.clone();
        tags.insert(tag);
        Self { tags }
    }

    /// A new collection with `tag` removed.
    pub fn without(&self, tag: &SubtreeTag) -> Self {
        let mut tags = self.tags.clone();
        tags.remove(tag);
        Self { tags }
    }

    /// Returns `true` if the two sets share at least one tag.
    pub fn intersects(&self, other: &SubtreeTags) -> bool {
        self.tags.intersection(&other.tags).next().is_some()
    }
}

impl FromIterator<SubtreeTag> for SubtreeTags {
    fn from_iter<I: IntoIterator<Item = SubtreeTag>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

/// The set of subtree tags hidden from a particular viewer.
///
/// Built by merging the tag sets of all privileges the viewer was denied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VisibilityConstraints {
    excluded_subtree_tags: SubtreeTags,
}

impl VisibilityConstraints {
    /// No restrictions: every node is visible.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn excluding(excluded_subtree_tags: SubtreeTags) -> Self {
        Self {
            excluded_subtree_tags,
        }
    }

    pub fn excluded_subtree_tags(&self) -> &SubtreeTags {
        &self.excluded_subtree_tags
    }

    /// Merge with the constraints of another denied privilege (set union).
    pub fn merged_with(&self, other: &VisibilityConstraints) -> Self {
        Self {
            excluded_subtree_tags: self
                .excluded_subtree_tags
                .merge(&other.excluded_subtree_tags),
        }
    }

    /// Returns `true` if a node carrying `tags` is visible under these
    /// constraints.
    pub fn allows(&self, tags: &SubtreeTags) -> bool {
        !self.excluded_subtree_tags.intersects(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> SubtreeTag {
        SubtreeTag::new(s).unwrap()
    }

    #[test]
    fn tag_validation() {
        assert!(SubtreeTag::new("disabled").is_ok());
        assert!(SubtreeTag::new("internal_only").is_ok());
        assert!(SubtreeTag::new("").is_err());
        assert!(SubtreeTag::new("No Caps").is_err());
    }

    #[test]
    fn merge_is_set_union() {
        let a = SubtreeTags::single(tag("disabled"));
        let b = SubtreeTags::single(tag("embargoed")).with(tag("disabled"));
        let merged = a.merge(&b);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn constraints_hide_tagged_nodes() {
        let constraints = VisibilityConstraints::excluding(SubtreeTags::single(tag("disabled")));
        assert!(!constraints.allows(&SubtreeTags::single(tag("disabled"))));
        assert!(constraints.allows(&SubtreeTags::single(tag("embargoed"))));
        assert!(constraints.allows(&SubtreeTags::empty()));
    }

    #[test]
    fn merged_constraints_accumulate_exclusions() {
        let a = VisibilityConstraints::excluding(SubtreeTags::single(tag("disabled")));
        let b = VisibilityConstraints::excluding(SubtreeTags::single(tag("embargoed")));
        let merged = a.merged_with(&b);
        assert!(!merged.allows(&SubtreeTags::single(tag("disabled"))));
        assert!(!merged.allows(&SubtreeTags::single(tag("embargoed"))));
    }
}
