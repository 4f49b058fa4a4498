// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable tree snapshots and ancestor resolution.
//!
//! A snapshot is a root [`Node`] plus everything reachable from it. Nodes do
//! not point at their parents (parents change on every clone). Two ways lead
//! from a node back to the root:
//!
//! - [`Snapshot::ancestors_of`] follows [`NodeFamily::parent`] links upward
//!   and checks each step against the snapshot's children. It touches only
//!   the nodes on the path and their siblings.
//! - [`Snapshot::ancestors`] only knows a [`Tag`], so it builds a
//!   `Tag -> (parent, slot)` index over the whole tree on first use. The index
//!   is shared by every clone of the `Snapshot` handle.
use std::sync::{Arc, OnceLock};

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::trace;

use crate::ident::{SurfaceId, Tag};
use crate::node::{Node, NodeFamily};

/// Errors raised by snapshot primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The tag does not name any node reachable from the snapshot root.
    #[error("node {0} is not part of this snapshot")]
    UnknownTag(Tag),
    /// The same tag is reachable more than once from the root.
    #[error("node {0} appears more than once in the snapshot")]
    DuplicateTag(Tag),
}

/// One step of an ancestor chain: `node.children()[index]` leads toward the
/// node the chain was resolved for.
#[derive(Clone, Debug)]
pub struct Ancestor {
    /// The ancestor node as it exists in the snapshot.
    pub node: Node,
    /// Slot of the child on the path toward the target.
    pub index: usize,
}

#[derive(Clone)]
struct ParentLink {
    parent: Node,
    index: usize,
}

type ParentIndex = FxHashMap<Tag, ParentLink>;

/// Immutable version of one surface's tree.
#[derive(Clone)]
pub struct Snapshot {
    root: Node,
    parents: Arc<OnceLock<Result<ParentIndex, TreeError>>>,
}

impl Snapshot {
    /// Wraps `root` as a snapshot.
    pub fn new(root: Node) -> Self {
        Self {
            root,
            parents: Arc::new(OnceLock::new()),
        }
    }

    /// Root node of the snapshot.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Surface the snapshot's root is mounted on.
    pub fn surface_id(&self) -> SurfaceId {
        self.root.surface_id()
    }

    /// Consumes the snapshot and returns its root node.
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Returns `true` if both snapshots have the same root object.
    pub fn shares_root_with(&self, other: &Self) -> bool {
        self.root.ptr_eq(&other.root)
    }

    /// Resolves the ancestor chain of `tag`, ordered root-first.
    ///
    /// The last entry is the direct parent of `tag`. The root itself has no
    /// ancestors and yields an empty chain.
    ///
    /// # Errors
    /// [`TreeError::UnknownTag`] if `tag` is not reachable from the root, or
    /// [`TreeError::DuplicateTag`] if the tree reuses a tag.
    pub fn ancestors(&self, tag: Tag) -> Result<Vec<Ancestor>, TreeError> {
        let root_tag = self.root.tag();
        if tag == root_tag {
            return Ok(Vec::new());
        }
        let parents = self.parent_index()?;
        let mut chain = Vec::new();
        let mut current = tag;
        loop {
            let link = parents.get(&current).ok_or(TreeError::UnknownTag(tag))?;
            chain.push(Ancestor {
                node: link.parent.clone(),
                index: link.index,
            });
            current = link.parent.tag();
            if current == root_tag {
                break;
            }
        }
        chain.reverse();
        Ok(chain)
    }

    /// Resolves the ancestor chain of `family`'s node, ordered root-first.
    ///
    /// Walks up the family parent links and confirms every step against this
    /// snapshot's children, without indexing the tree. Falls back to
    /// [`Snapshot::ancestors`] when the links do not describe this snapshot,
    /// e.g. the node moved since or its family was never adopted.
    ///
    /// # Errors
    /// Same as [`Snapshot::ancestors`].
    pub fn ancestors_of(&self, family: &Arc<NodeFamily>) -> Result<Vec<Ancestor>, TreeError> {
        if let Some(chain) = self.linked_ancestors(family) {
            return Ok(chain);
        }
        trace!(tag = %family.tag, "family links do not match snapshot; using tag index");
        self.ancestors(family.tag)
    }

    fn linked_ancestors(&self, family: &Arc<NodeFamily>) -> Option<Vec<Ancestor>> {
        let root_family = self.root.family();
        if Arc::ptr_eq(family, root_family) {
            return Some(Vec::new());
        }

        // Families strictly between the root and the target, nearest first.
        let mut lineage = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = family.parent()?;
        while !Arc::ptr_eq(&current, root_family) {
            if !seen.insert(current.tag) {
                return None;
            }
            let parent = current.parent()?;
            lineage.push(current);
            current = parent;
        }

        let mut chain = Vec::with_capacity(lineage.len() + 1);
        let mut node = self.root.clone();
        for next in lineage.iter().rev().chain(std::iter::once(family)) {
            let (index, child) = node
                .children()
                .iter()
                .enumerate()
                .find(|(_, child)| Arc::ptr_eq(child.family(), next))
                .map(|(index, child)| (index, child.clone()))?;
            chain.push(Ancestor { node, index });
            node = child;
        }
        Some(chain)
    }

    /// Returns `true` once the whole-tree tag index has been built.
    pub fn is_indexed(&self) -> bool {
        self.parents.get().is_some()
    }

    /// Looks up the node carrying `tag`.
    pub fn find(&self, tag: Tag) -> Option<Node> {
        if tag == self.root.tag() {
            return Some(self.root.clone());
        }
        let link = self.parent_index().ok()?.get(&tag)?;
        link.parent.children().get(link.index).cloned()
    }

    /// Number of nodes reachable from the root.
    ///
    /// # Errors
    /// [`TreeError::DuplicateTag`] if the tree reuses a tag.
    pub fn node_count(&self) -> Result<usize, TreeError> {
        Ok(self.parent_index()?.len() + 1)
    }

    fn parent_index(&self) -> Result<&ParentIndex, TreeError> {
        self.parents
            .get_or_init(|| build_parent_index(&self.root))
            .as_ref()
            .map_err(|err| *err)
    }
}

impl core::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Snapshot")
            .field("surface_id", &self.surface_id())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn build_parent_index(root: &Node) -> Result<ParentIndex, TreeError> {
    let mut index = ParentIndex::default();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        for (slot, child) in node.children().iter().enumerate() {
            let tag = child.tag();
            if tag == root.tag() || index.contains_key(&tag) {
                return Err(TreeError::DuplicateTag(tag));
            }
            index.insert(
                tag,
                ParentLink {
                    parent: node.clone(),
                    index: slot,
                },
            );
            stack.push(child.clone());
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeFamily;
    use crate::props::Props;

    fn node(tag: u32, children: Vec<Node>) -> Node {
        Node::new(
            NodeFamily::new(Tag(tag), SurfaceId(1), "View"),
            Props::empty(),
            children,
        )
    }

    fn sample() -> Snapshot {
        // 1 -> [2 -> [4, 5], 3]
        Snapshot::new(node(
            1,
            vec![node(2, vec![node(4, vec![]), node(5, vec![])]), node(3, vec![])],
        ))
    }

    #[test]
    fn ancestors_are_root_first() {
        let snap = sample();
        let chain = snap.ancestors(Tag(5)).unwrap();
        let steps: Vec<(Tag, usize)> = chain.iter().map(|a| (a.node.tag(), a.index)).collect();
        assert_eq!(steps, vec![(Tag(1), 0), (Tag(2), 1)]);
    }

    #[test]
    fn root_has_no_ancestors() {
        assert!(sample().ancestors(Tag(1)).unwrap().is_empty());
    }

    #[test]
    fn unknown_tag_is_reported() {
        let err = sample().ancestors(Tag(99)).unwrap_err();
        assert_eq!(err, TreeError::UnknownTag(Tag(99)));
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let snap = Snapshot::new(node(1, vec![node(2, vec![]), node(2, vec![])]));
        assert_eq!(
            snap.ancestors(Tag(2)).unwrap_err(),
            TreeError::DuplicateTag(Tag(2))
        );
    }

    #[test]
    fn find_and_count() {
        let snap = sample();
        assert_eq!(snap.node_count().unwrap(), 5);
        assert_eq!(snap.find(Tag(4)).map(|n| n.tag()), Some(Tag(4)));
        assert!(snap.find(Tag(42)).is_none());
    }

    #[test]
    fn family_lookup_matches_tag_lookup() {
        let snap = sample();
        let target = snap.root().children()[0].children()[1].clone();

        let linked = snap.ancestors_of(target.family()).unwrap();
        assert!(!snap.is_indexed());

        let indexed = snap.ancestors(Tag(5)).unwrap();
        let steps = |chain: &[Ancestor]| -> Vec<(Tag, usize)> {
            chain.iter().map(|a| (a.node.tag(), a.index)).collect()
        };
        assert_eq!(steps(&linked), steps(&indexed));
        assert_eq!(steps(&linked), vec![(Tag(1), 0), (Tag(2), 1)]);
    }

    #[test]
    fn family_lookup_stays_on_the_path() {
        let wide: Vec<Node> = (100..50_100).map(|tag| node(tag, vec![])).collect();
        let snap = Snapshot::new(node(1, vec![node(2, vec![]), node(3, wide)]));
        let target = snap.root().children()[0].clone();

        let chain = snap.ancestors_of(target.family()).unwrap();

        assert_eq!(chain.len(), 1);
        assert_eq!((chain[0].node.tag(), chain[0].index), (Tag(1), 0));
        assert!(!snap.is_indexed());
    }

    #[test]
    fn stale_family_links_fall_back_to_the_tag_index() {
        let snap = sample();
        let moved = snap.root().children()[1].clone();
        // Tag 3 gets adopted elsewhere; `snap` still holds it under the root.
        let _elsewhere = node(9, vec![moved.clone()]);

        let chain = snap.ancestors_of(moved.family()).unwrap();

        assert_eq!(chain.len(), 1);
        assert_eq!((chain[0].node.tag(), chain[0].index), (Tag(1), 1));
        assert!(snap.is_indexed());
    }

    #[test]
    fn unadopted_family_resolves_by_tag() {
        let snap = sample();
        let detached = Arc::new(NodeFamily::new(Tag(4), SurfaceId(1), "View"));
        let chain = snap.ancestors_of(&detached).unwrap();
        assert_eq!(chain.len(), 2);

        let missing = Arc::new(NodeFamily::new(Tag(99), SurfaceId(1), "View"));
        assert_eq!(
            snap.ancestors_of(&missing).unwrap_err(),
            TreeError::UnknownTag(Tag(99))
        );
    }

    #[test]
    fn parent_index_is_shared_between_handles() {
        let snap = sample();
        let copy = snap.clone();
        snap.ancestors(Tag(4)).unwrap();
        assert!(copy.is_indexed());
    }
}
