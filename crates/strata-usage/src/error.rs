//! Error types for asset usage handling.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    #[error("invalid asset id {id:?}: {reason}")]
    InvalidAssetId { id: String, reason: String },
}
