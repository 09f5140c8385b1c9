//! The multi-axis dimension space.
//!
//! Content can exist in several variants at once (language, region, channel,
//! …). A [`DimensionSpacePoint`] picks exactly one variant by assigning one
//! coordinate per axis. Points are immutable value objects and are used as
//! map keys throughout the graph projection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable tuple of (axis → coordinate) pairs identifying one content
/// variant.
///
/// The empty point is valid and denotes dimension-less content.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DimensionSpacePoint {
    coordinates: BTreeMap<String, String>,
}

impl DimensionSpacePoint {
    /// The dimension-less point for repositories without content dimensions.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_coordinates(
        coordinates: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self {
            coordinates: coordinates
                .into_iter()
                .map(|(axis, coordinate)| (axis.into(), coordinate.into()))
                .collect(),
        }
    }

    /// The coordinate of the given axis, if this point spans it.
    pub fn coordinate(&self, axis: &str) -> Option<&str> {
        self.coordinates.get(axis).map(String::as_str)
    }

    pub fn coordinates(&self) -> impl Iterator<Item = (&str, &str)> {
        self.coordinates
            .iter()
            .map(|(axis, coordinate)| (axis.as_str(), coordinate.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// A new point with one coordinate replaced. The original is unchanged.
    pub fn with_coordinate(&self, axis: impl Into<String>, coordinate: impl Into<String>) -> Self {
        let mut coordinates = self.coordinates.clone();
        coordinates.insert(axis.into(), coordinate.into());
        Self { coordinates }
    }
}

impl fmt::Display for DimensionSpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (axis, coordinate) in &self.coordinates {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{axis}={coordinate}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for DimensionSpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DimensionSpacePoint({self})")
    }
}

/// An unordered, duplicate-free set of dimension space points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DimensionSpacePointSet {
    points: BTreeSet<DimensionSpacePoint>,
}

impl DimensionSpacePointSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, point: &DimensionSpacePoint) -> bool {
        self.points.contains(point)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionSpacePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<DimensionSpacePoint> for DimensionSpacePointSet {
    fn from_iter<I: IntoIterator<Item = DimensionSpacePoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
