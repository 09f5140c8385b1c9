/// Errors produced when constructing Strata value types from raw input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidId { value: String, reason: String },

    #[error("invalid workspace name {name:?}: {reason}")]
    InvalidWorkspaceName { name: String, reason: String },

    #[error("invalid subtree tag {tag:?}: {reason}")]
    InvalidSubtreeTag { tag: String, reason: String },

    #[error("invalid dimension axis {axis:?}: {reason}")]
    InvalidDimensionAxis { axis: String, reason: String },
}
