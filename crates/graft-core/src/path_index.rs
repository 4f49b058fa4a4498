// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Child slots on the paths from the root to mutated nodes.
use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::batch::MutationBatch;
use crate::ident::Tag;
use crate::snapshot::{Ancestor, Snapshot, TreeError};

/// For every ancestor of a mutated node, the child slots that lead toward at
/// least one mutation.
///
/// Built fresh for each patch cycle against the snapshot that is about to be
/// patched. The index is a pure union of root-to-node paths, so the order in
/// which mutated tags are added does not matter.
#[derive(Clone, Debug, Default)]
pub struct AncestorPathIndex {
    slots: FxHashMap<Tag, BTreeSet<usize>>,
}

impl AncestorPathIndex {
    /// Builds the index for `mutated` within `snapshot`.
    ///
    /// # Errors
    /// Propagates [`Snapshot::ancestors`] failures; every tag in `mutated` must
    /// be reachable from the snapshot root.
    pub fn build<I>(snapshot: &Snapshot, mutated: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut index = Self::default();
        for tag in mutated {
            index.insert_path(&snapshot.ancestors(tag)?);
        }
        Ok(index)
    }

    /// Builds the index for every mutated node of `batch`.
    ///
    /// Entries that carry a family resolve their ancestors through family
    /// links, so the snapshot is only indexed as a whole when some entry
    /// lacks a usable family.
    ///
    /// # Errors
    /// Propagates ancestor resolution failures, as [`AncestorPathIndex::build`].
    pub fn for_batch(snapshot: &Snapshot, batch: &MutationBatch) -> Result<Self, TreeError> {
        let mut index = Self::default();
        for tag in batch.mutated_tags() {
            let chain = match batch.family(tag) {
                Some(family) => snapshot.ancestors_of(family)?,
                None => snapshot.ancestors(tag)?,
            };
            index.insert_path(&chain);
        }
        Ok(index)
    }

    fn insert_path(&mut self, chain: &[Ancestor]) {
        // Set insertion already skips slots recorded by an earlier path.
        for step in chain.iter().rev() {
            self.slots
                .entry(step.node.tag())
                .or_default()
                .insert(step.index);
        }
    }

    /// Child slots of `tag` that must be patched, ascending.
    pub fn slots(&self, tag: Tag) -> Option<&BTreeSet<usize>> {
        self.slots.get(&tag)
    }

    /// Returns `true` if `tag` is an ancestor of some mutated node.
    pub fn contains(&self, tag: Tag) -> bool {
        self.slots.contains_key(&tag)
    }

    /// Number of ancestors recorded.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no ancestor is recorded (no mutation below the root).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
