// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Copy-on-write application of a [`MutationBatch`] to a snapshot.
//!
//! The patcher walks down from the root, but only along the slots recorded in
//! an [`AncestorPathIndex`]. A node is cloned iff it is mutated itself or is an
//! ancestor of a mutated node; every other subtree is shared with the input
//! snapshot by reference.
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, debug_span, trace};

use crate::batch::MutationBatch;
use crate::convergence::props_converged;
use crate::ident::Tag;
use crate::node::{FragmentProps, Node, NodeFragment};
use crate::path_index::AncestorPathIndex;
use crate::snapshot::{Snapshot, TreeError};

/// Errors raised while patching a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatchError {
    /// A mutated tag could not be resolved in the snapshot.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The path index recorded a slot the node does not have.
    ///
    /// Only possible when the index was built against a different snapshot.
    #[error("node {tag} has {len} children, slot {slot} is out of range")]
    SlotOutOfRange {
        /// Node whose children were indexed.
        tag: Tag,
        /// Offending slot.
        slot: usize,
        /// Number of children the node actually has.
        len: usize,
    },
}

/// Result of one patch cycle.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The patched snapshot. Shares every untouched subtree with the input.
    pub snapshot: Snapshot,
    /// Tags whose pending mutation turned out to be redundant, in visit order.
    pub removals: Vec<Tag>,
    /// Number of nodes cloned (mutated nodes plus their ancestors).
    pub cloned: usize,
}

/// Recursive clone-with-patch over one snapshot.
///
/// Holds the per-cycle inputs and accumulates the removal list while visiting.
pub struct TreePatcher<'a> {
    index: &'a AncestorPathIndex,
    batch: &'a MutationBatch,
    removals: Vec<Tag>,
    cloned: usize,
}

impl<'a> TreePatcher<'a> {
    /// Creates a patcher for `batch`, descending along `index`.
    pub fn new(index: &'a AncestorPathIndex, batch: &'a MutationBatch) -> Self {
        Self {
            index,
            batch,
            removals: Vec::new(),
            cloned: 0,
        }
    }

    /// Patches the tree rooted at `root`.
    ///
    /// # Errors
    /// [`PatchError::SlotOutOfRange`] if the index does not describe `root`'s
    /// tree.
    pub fn patch(mut self, root: &Node) -> Result<PatchOutcome, PatchError> {
        let root = self.visit(root)?;
        Ok(PatchOutcome {
            snapshot: Snapshot::new(root),
            removals: self.removals,
            cloned: self.cloned,
        })
    }

    fn visit(&mut self, node: &Node) -> Result<Node, PatchError> {
        let tag = node.tag();
        let slots = self.index.slots(tag);
        let deltas = self.batch.deltas(tag);
        if slots.is_none() && deltas.is_none() {
            return Ok(node.clone());
        }

        let children = match slots {
            Some(slots) => {
                let mut children = node.children().to_vec();
                let len = children.len();
                for &slot in slots {
                    let Some(child) = children.get_mut(slot) else {
                        return Err(PatchError::SlotOutOfRange { tag, slot, len });
                    };
                    let patched = self.visit(child)?;
                    *child = patched;
                }
                Some(Arc::from(children))
            }
            None => None,
        };

        let props = match deltas {
            Some(deltas) => {
                let current = node.props();
                let candidate = current.with_deltas(deltas);
                let converged = props_converged(&candidate, current);
                trace!(%tag, deltas = deltas.len(), converged, "applied pending props");
                if converged {
                    self.removals.push(tag);
                }
                FragmentProps::Replace(candidate)
            }
            None => FragmentProps::Placeholder,
        };

        self.cloned += 1;
        Ok(node.clone_with(NodeFragment { props, children }))
    }
}

/// Applies `batch` to `snapshot`, cloning only what the batch touches.
///
/// Builds the [`AncestorPathIndex`] for the batch's mutated nodes (see
/// [`AncestorPathIndex::for_batch`]) and runs a [`TreePatcher`] from the root.
///
/// # Errors
/// [`PatchError::Tree`] if the batch names a tag that is not part of
/// `snapshot`.
pub fn patch_snapshot(
    snapshot: &Snapshot,
    batch: &MutationBatch,
) -> Result<PatchOutcome, PatchError> {
    let span = debug_span!("graft.patch", surface = %snapshot.surface_id());
    let _enter = span.enter();

    let index = AncestorPathIndex::for_batch(snapshot, batch)?;
    let outcome = TreePatcher::new(&index, batch).patch(snapshot.root())?;
    debug!(
        mutated = batch.len(),
        ancestors = index.len(),
        cloned = outcome.cloned,
        converged = outcome.removals.len(),
        "patch cycle complete"
    );
    Ok(outcome)
}
