// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property sets and partial property deltas.
//!
//! Props are flat JSON objects keyed by prop name (`opacity`, `transform`,
//! `backgroundColor`, ...). Nested values are opaque: applying a delta replaces
//! a key's whole value, it never merges into nested objects.
use std::sync::Arc;

use serde_json::Value;

/// Raw key/value storage behind [`Props`] and [`PropsDelta`].
pub type PropMap = serde_json::Map<String, Value>;

/// Immutable property set attached to a [`crate::Node`].
///
/// Cloning is a reference-count bump; two `Props` may be the same allocation
/// (see [`Props::ptr_eq`]) or merely equal by value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props(Arc<PropMap>);

impl Props {
    /// Creates an empty property set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Iterates over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the set has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &PropMap {
        &self.0
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Folds `deltas` onto a copy of `self` in order.
    ///
    /// Each delta overwrites the keys it carries; on overlapping keys the
    /// later delta wins. Keys not mentioned by any delta keep their value.
    pub fn with_deltas<'a, I>(&self, deltas: I) -> Self
    where
        I: IntoIterator<Item = &'a PropsDelta>,
    {
        let mut merged = (*self.0).clone();
        for delta in deltas {
            for (key, value) in delta.iter() {
                merged.insert(key.clone(), value.clone());
            }
        }
        Self(Arc::new(merged))
    }

    /// Returns `true` if every key of `self` exists in `other` with an equal
    /// value. Keys present only in `other` are ignored.
    pub fn is_contained_in(&self, other: &Self) -> bool {
        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|theirs| theirs == value))
    }
}

impl From<PropMap> for Props {
    fn from(map: PropMap) -> Self {
        Self(Arc::new(map))
    }
}

/// Partial property update queued against one node.
///
/// A delta only lists the keys it changes. Deltas for the same node are kept
/// in arrival order and applied sequentially by the patcher.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropsDelta(Arc<PropMap>);

impl PropsDelta {
    /// Iterates over the `(key, value)` pairs carried by this delta.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of keys carried by this delta.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the delta carries no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<PropMap> for PropsDelta {
    fn from(map: PropMap) -> Self {
        Self(Arc::new(map))
    }
}
