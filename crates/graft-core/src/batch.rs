// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pending props deltas grouped by node.
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ident::Tag;
use crate::node::NodeFamily;
use crate::props::PropsDelta;

/// Ordered props deltas per node for one patch cycle.
///
/// Each tag appears at most once; its deltas are kept in the order they were
/// pushed and must be applied in that order. Entries added through
/// [`MutationBatch::insert_for`] or [`MutationBatch::push_for`] also carry the
/// node's family, which lets ancestor resolution skip the tag index.
#[derive(Clone, Debug, Default)]
pub struct MutationBatch {
    entries: FxHashMap<Tag, Vec<PropsDelta>>,
    families: FxHashMap<Tag, Arc<NodeFamily>>,
}

impl MutationBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `delta` to the queue of `tag`.
    pub fn push(&mut self, tag: Tag, delta: PropsDelta) {
        self.entries.entry(tag).or_default().push(delta);
    }

    /// Replaces the whole queue of `tag`.
    pub fn insert(&mut self, tag: Tag, deltas: Vec<PropsDelta>) {
        self.entries.insert(tag, deltas);
    }

    /// Appends `delta` to the queue of `family`'s node.
    pub fn push_for(&mut self, family: &Arc<NodeFamily>, delta: PropsDelta) {
        self.families
            .entry(family.tag)
            .or_insert_with(|| Arc::clone(family));
        self.push(family.tag, delta);
    }

    /// Replaces the whole queue of `family`'s node.
    pub fn insert_for(&mut self, family: Arc<NodeFamily>, deltas: Vec<PropsDelta>) {
        let tag = family.tag;
        self.families.insert(tag, family);
        self.insert(tag, deltas);
    }

    /// Family recorded for `tag`, if the entry was added with one.
    pub fn family(&self, tag: Tag) -> Option<&Arc<NodeFamily>> {
        self.families.get(&tag)
    }

    /// Queued deltas for `tag`, in application order.
    ///
    /// Returns `None` for unknown tags and for tags whose queue is empty, so
    /// an empty queue behaves exactly like no mutation.
    pub fn deltas(&self, tag: Tag) -> Option<&[PropsDelta]> {
        self.entries
            .get(&tag)
            .map(Vec::as_slice)
            .filter(|deltas| !deltas.is_empty())
    }

    /// Tags with a non-empty delta queue.
    pub fn mutated_tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries
            .iter()
            .filter(|(_, deltas)| !deltas.is_empty())
            .map(|(tag, _)| *tag)
    }

    /// Number of tags with a non-empty delta queue.
    pub fn len(&self) -> usize {
        self.mutated_tags().count()
    }

    /// Returns `true` when no tag has a queued delta.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(Tag, PropsDelta)> for MutationBatch {
    fn from_iter<I: IntoIterator<Item = (Tag, PropsDelta)>>(iter: I) -> Self {
        let mut batch = Self::new();
        for (tag, delta) in iter {
            batch.push(tag, delta);
        }
        batch
    }
}
