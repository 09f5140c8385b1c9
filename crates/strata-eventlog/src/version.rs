//! Sequence numbers and stream versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Global position of an event across all streams.
///
/// Sequence numbers start at 1 and are assigned in commit order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic count of events applied to one stream.
///
/// An empty stream has version 0; the n-th event carries version n.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Optimistic concurrency expectation for a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// No expectation; the commit always passes the version check.
    Any,
    /// The stream must not contain any events yet.
    NoStream,
    /// The stream must be at exactly this version.
    Exactly(Version),
}

impl ExpectedVersion {
    /// Returns `true` if a stream at `actual` satisfies this expectation.
    pub fn matches(self, actual: Version) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::NoStream => actual == Version(0),
            ExpectedVersion::Exactly(expected) => actual == expected,
        }
    }
}

impl fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedVersion::Any => f.write_str("any"),
            ExpectedVersion::NoStream => f.write_str("no-stream"),
            ExpectedVersion::Exactly(version) => write!(f, "{version}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expectation_matching() {
        assert!(ExpectedVersion::Any.matches(Version(17)));
        assert!(ExpectedVersion::NoStream.matches(Version(0)));
        assert!(!ExpectedVersion::NoStream.matches(Version(1)));
        assert!(ExpectedVersion::Exactly(Version(3)).matches(Version(3)));
        assert!(!ExpectedVersion::Exactly(Version(3)).matches(Version(4)));
    }
}
