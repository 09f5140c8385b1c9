//! Serialized property values of a node or reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strata_types::PropertyName;

/// An immutable collection of serialized property values.
///
/// Values are kept in storage form (`serde_json::Value`); interpreting them
/// against a node type schema happens outside this core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PropertyCollection {
    properties: BTreeMap<PropertyName, Value>,
}

impl PropertyCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(properties: BTreeMap<PropertyName, Value>) -> Self {
        Self { properties }
    }

    pub fn get(&self, name: &PropertyName) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &PropertyName) -> bool {
        self.properties.contains_key(name)
    }

    /// Iterate the serialized (name, value) pairs in name order.
    pub fn serialized(&self) -> impl Iterator<Item = (&PropertyName, &Value)> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// A new collection with `values` merged in: non-null values overwrite,
    /// explicit nulls unset. The original is unchanged.
    pub fn with_values(&self, values: &BTreeMap<PropertyName, Value>) -> Self {
        let mut properties = self.properties.clone();
        for (name, value) in values {
            if value.is_null() {
                properties.remove(name);
            } else {
                properties.insert(name.clone(), value.clone());
            }
        }
        Self { properties }
    }
}

impl FromIterator<(PropertyName, Value)> for PropertyCollection {
    fn from_iter<I: IntoIterator<Item = (PropertyName, Value)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}
