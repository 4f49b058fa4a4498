// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable, reference-counted tree nodes.
//!
//! A [`Node`] never changes after construction. "Mutating" a node means
//! cloning it through [`Node::clone_with`]: the clone is a new allocation that
//! shares the source's [`NodeFamily`] (and therefore its [`Tag`]) and, unless
//! replaced, its props and children. Subtrees that are not replaced are shared
//! between the old and the new tree.
//!
//! Families remember the family of the node that last adopted them as a
//! child. The link survives cloning, which lets a snapshot resolve a node's
//! ancestors by walking up families instead of indexing the whole tree.
use std::any::Any;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::ident::{SurfaceId, Tag};
use crate::props::Props;

/// Identity shared by every clone of one logical node.
pub struct NodeFamily {
    /// Host-assigned node tag.
    pub tag: Tag,
    /// Surface the node is mounted on.
    pub surface_id: SurfaceId,
    /// Component name (e.g. `"View"`), used for diagnostics only.
    pub component: Arc<str>,
    parent: RwLock<Weak<NodeFamily>>,
}

impl NodeFamily {
    /// Creates a family for `tag` on `surface_id`, not yet adopted by a parent.
    pub fn new(tag: Tag, surface_id: SurfaceId, component: impl Into<Arc<str>>) -> Self {
        Self {
            tag,
            surface_id,
            component: component.into(),
            parent: RwLock::new(Weak::new()),
        }
    }

    /// Family of the node that most recently adopted this one as a child.
    ///
    /// A hint only: older snapshots may still hold the node elsewhere, and
    /// the link is gone once the parent family is dropped.
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.read().upgrade()
    }

    fn adopt_by(&self, parent: &Arc<Self>) {
        let mut link = self.parent.write();
        if !std::ptr::eq(link.as_ptr(), Arc::as_ptr(parent)) {
            *link = Arc::downgrade(parent);
        }
    }
}

impl core::fmt::Debug for NodeFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeFamily")
            .field("tag", &self.tag)
            .field("surface_id", &self.surface_id)
            .field("component", &self.component)
            .field("parent", &self.parent().map(|p| p.tag))
            .finish()
    }
}

/// Opaque host state carried through clones untouched.
pub type NodeState = Arc<dyn Any + Send + Sync>;

/// Props slot of a [`NodeFragment`].
#[derive(Clone, Debug, Default)]
pub enum FragmentProps {
    /// Keep the source node's props.
    #[default]
    Placeholder,
    /// Replace the props with the given set.
    Replace(Props),
}

/// Replacement parts for [`Node::clone_with`].
///
/// Opaque state is not part of the fragment: clones always inherit it.
#[derive(Clone, Debug, Default)]
pub struct NodeFragment {
    /// New props, or [`FragmentProps::Placeholder`] to keep the existing ones.
    pub props: FragmentProps,
    /// New children, or `None` to share the existing child list.
    pub children: Option<Arc<[Node]>>,
}

struct NodeInner {
    family: Arc<NodeFamily>,
    props: Props,
    children: Arc<[Node]>,
    state: Option<NodeState>,
}

/// Handle to an immutable tree node.
///
/// `Clone` on the handle shares the node; it does not create a new node. Use
/// [`Node::clone_with`] to derive a new node with the same identity.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    /// Creates a fresh node (new identity) with no opaque state.
    pub fn new(family: NodeFamily, props: Props, children: Vec<Self>) -> Self {
        Self::assemble(Arc::new(family), props, children.into(), None)
    }

    /// Creates a fresh node carrying opaque host `state`.
    pub fn with_state(
        family: NodeFamily,
        props: Props,
        children: Vec<Self>,
        state: NodeState,
    ) -> Self {
        Self::assemble(Arc::new(family), props, children.into(), Some(state))
    }

    fn assemble(
        family: Arc<NodeFamily>,
        props: Props,
        children: Arc<[Self]>,
        state: Option<NodeState>,
    ) -> Self {
        for child in children.iter() {
            child.0.family.adopt_by(&family);
        }
        Self(Arc::new(NodeInner {
            family,
            props,
            children,
            state,
        }))
    }

    /// Stable identity of this node.
    pub fn tag(&self) -> Tag {
        self.0.family.tag
    }

    /// Surface the node belongs to.
    pub fn surface_id(&self) -> SurfaceId {
        self.0.family.surface_id
    }

    /// Shared family (identity) record.
    pub fn family(&self) -> &Arc<NodeFamily> {
        &self.0.family
    }

    /// Current props.
    pub fn props(&self) -> &Props {
        &self.0.props
    }

    /// Ordered children.
    pub fn children(&self) -> &[Self] {
        &self.0.children
    }

    /// Opaque host state, if any.
    pub fn state(&self) -> Option<&NodeState> {
        self.0.state.as_ref()
    }

    /// Returns `true` if both handles refer to the same node object.
    ///
    /// Two clones of one logical node share a [`Tag`] but are not `ptr_eq`.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` if `other` shares this node's identity.
    pub fn same_family(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0.family, &other.0.family)
    }

    /// Derives a new node with the same identity and state.
    ///
    /// Replacement children are adopted by this node's family.
    pub fn clone_with(&self, fragment: NodeFragment) -> Self {
        let props = match fragment.props {
            FragmentProps::Placeholder => self.0.props.clone(),
            FragmentProps::Replace(props) => props,
        };
        match fragment.children {
            Some(children) => Self::assemble(
                Arc::clone(&self.0.family),
                props,
                children,
                self.0.state.clone(),
            ),
            None => Self(Arc::new(NodeInner {
                family: Arc::clone(&self.0.family),
                props,
                children: Arc::clone(&self.0.children),
                state: self.0.state.clone(),
            })),
        }
    }
}

impl core::fmt::Debug for Node {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Node")
            .field("tag", &self.tag())
            .field("component", &self.0.family.component)
            .field("props", self.props().as_map())
            .field("children", &self.children())
            .field("has_state", &self.0.state.is_some())
            .finish()
    }
}
