//! Workspace names and the workspace read model.
//!
//! A workspace is a named, user-facing branch of the content graph. It points
//! at its *current* content stream and optionally records a base workspace.
//! The base relation forms a forest: root workspaces (typically "live") have
//! no base.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::ContentStreamId;

/// Characters that are forbidden anywhere in a workspace name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '/', ':', '~', '^', '?', '*', '['];

/// Stable human-referenced identifier for a named branch.
///
/// Workspace names are lowercase, at most 36 characters, limited to `a-z`,
/// `0-9` and `-`, and must not start or end with a hyphen.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceName(String);

impl WorkspaceName {
    pub const MAX_LENGTH: usize = 36;

    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidWorkspaceName {
                name,
                reason: "must not be empty".into(),
            });
        }
        if name.len() > Self::MAX_LENGTH {
            return Err(TypeError::InvalidWorkspaceName {
                name,
                reason: format!("must not exceed {} characters", Self::MAX_LENGTH),
            });
        }
        for ch in FORBIDDEN_CHARS {
            if name.contains(*ch) {
                return Err(TypeError::InvalidWorkspaceName {
                    name: name.clone(),
                    reason: format!("contains forbidden character {ch:?}"),
                });
            }
        }
        if name.starts_with('-') || name.ends_with('-') {
            return Err(TypeError::InvalidWorkspaceName {
                name,
                reason: "must not start or end with '-'".into(),
            });
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(TypeError::InvalidWorkspaceName {
                name,
                reason: "only lowercase letters, digits and '-' are allowed".into(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkspaceName({})", self.0)
    }
}

/// Lifecycle status of a content stream.
///
/// Streams start `Open`, pass through `Rebasing` while being superseded by a
/// candidate stream, and end `Closed` (terminal).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentStreamStatus {
    Open,
    Rebasing,
    Closed,
}

impl fmt::Display for ContentStreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentStreamStatus::Open => "open",
            ContentStreamStatus::Rebasing => "rebasing",
            ContentStreamStatus::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// A named branch of the content graph.
///
/// Maps a [`WorkspaceName`] to its current content stream and its optional
/// base workspace. Ownership and role metadata live outside this core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_name: WorkspaceName,
    pub base_workspace_name: Option<WorkspaceName>,
    pub current_content_stream_id: ContentStreamId,
}

impl Workspace {
    /// Returns `true` if this workspace has no base (e.g. "live").
    pub fn is_root_workspace(&self) -> bool {
        self.base_workspace_name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_workspace_names() {
        assert!(WorkspaceName::new("live").is_ok());
        assert!(WorkspaceName::new("user-a").is_ok());
        assert!(WorkspaceName::new("review-2024").is_ok());
    }

    #[test]
    fn invalid_workspace_names() {
        assert!(WorkspaceName::new("").is_err());
        assert!(WorkspaceName::new("User-A").is_err());
        assert!(WorkspaceName::new("user a").is_err());
        assert!(WorkspaceName::new("-user").is_err());
        assert!(WorkspaceName::new("user/").is_err());
        assert!(WorkspaceName::new("a".repeat(37)).is_err());
    }

    #[test]
    fn root_workspace_has_no_base() {
        let ws = Workspace {
            workspace_name: WorkspaceName::new("live").unwrap(),
            base_workspace_name: None,
            current_content_stream_id: ContentStreamId::new("cs-live").unwrap(),
        };
        assert!(ws.is_root_workspace());
    }
}
