//! Asset ids and usage rows.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::{
    ContentRepositoryId, DimensionSpacePoint, NodeAggregateId, PropertyName, WorkspaceName,
};

use crate::error::UsageError;

/// Identifier of an asset, as referenced by `asset://<id>` URIs inside
/// property values. Assets themselves are managed outside this core.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Result<Self, UsageError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UsageError::InvalidAssetId {
                id,
                reason: "must not be empty".into(),
            });
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(UsageError::InvalidAssetId {
                id,
                reason: "only letters, digits, '-' and '_' are allowed".into(),
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

/// One usage row: this asset is referenced by this node variant, under this
/// property, in this workspace.
///
/// The same logical usage exists at most once along a workspace base chain;
/// see the indexing service for how that is maintained.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetUsage {
    pub content_repository_id: ContentRepositoryId,
    pub workspace_name: WorkspaceName,
    pub node_aggregate_id: NodeAggregateId,
    pub dimension_space_point: DimensionSpacePoint,
    pub property_name: PropertyName,
    pub asset_id: AssetId,
}

impl AssetUsage {
    /// The same usage, recorded in a different workspace.
    pub fn in_workspace(&self, workspace_name: WorkspaceName) -> Self {
        Self {
            workspace_name,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_validation() {
        assert!(AssetId::new("img-42").is_ok());
        assert!(AssetId::new("Hero_Image").is_ok());
        assert!(AssetId::new("").is_err());
        assert!(AssetId::new("img 42").is_err());
        assert!(AssetId::new("img/42").is_err());
    }
}
