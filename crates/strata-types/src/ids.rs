//! Identifier newtypes shared across the Strata crates.
//!
//! All identifiers are lowercase strings drawn from a constrained charset so
//! they can double as stream-name and index-key components without escaping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Validate a lowercase identifier: `a-z`, `0-9` and `-`, non-empty, no
/// leading or trailing hyphen.
fn validate_identifier(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".into());
    }
    if value.len() > 64 {
        return Err("must not exceed 64 characters".into());
    }
    if value.starts_with('-') || value.ends_with('-') {
        return Err("must not start or end with '-'".into());
    }
    for ch in value.chars() {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
            return Err(format!("contains forbidden character {ch:?}"));
        }
    }
    Ok(())
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Construct from a raw string, validating the identifier charset.
            pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
                let value = value.into();
                validate_identifier(&value).map_err(|reason| TypeError::InvalidId {
                    value: value.clone(),
                    reason,
                })?;
                Ok(Self(value))
            }

            /// The raw string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

string_identifier!(
    /// Identifier of one content repository instance.
    ///
    /// Derived indexes are scoped by repository so several repositories can
    /// share one index store.
    ContentRepositoryId,
    "ContentRepositoryId"
);

string_identifier!(
    /// Identifier of an append-only event partition holding one line of edit
    /// history.
    ///
    /// A content stream is created when a workspace is created or re-forked
    /// and closed when superseded. See `strata-graph` for the projected
    /// version/status read model.
    ContentStreamId,
    "ContentStreamId"
);

string_identifier!(
    /// Identity of a node aggregate, stable across dimension variants and
    /// workspaces.
    NodeAggregateId,
    "NodeAggregateId"
);

string_identifier!(
    /// Name of a property on a node or reference.
    PropertyName,
    "PropertyName"
);

impl ContentStreamId {
    /// Allocate a fresh random stream id (uuid v7, so ids sort by creation
    /// time).
    pub fn random() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }
}

/// Name of a node type, e.g. `acme.site:document`.
///
/// Node types are declared outside this core; the engine only transports the
/// name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeName(String);

impl NodeTypeName {
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::InvalidId {
                value,
                reason: "must not be empty".into(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeTypeName({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_identifiers() {
        assert!(ContentStreamId::new("cs-one").is_ok());
        assert!(NodeAggregateId::new("nody-mc-nodeface").is_ok());
        assert!(ContentRepositoryId::new("default").is_ok());
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(ContentStreamId::new("").is_err());
        assert!(ContentStreamId::new("Upper").is_err());
        assert!(ContentStreamId::new("-leading").is_err());
        assert!(NodeAggregateId::new("with space").is_err());
    }

    #[test]
    fn random_stream_ids_are_valid_and_unique() {
        let a = ContentStreamId::random();
        let b = ContentStreamId::random();
        assert_ne!(a, b);
        assert!(ContentStreamId::new(a.as_str()).is_ok());
    }
}
