// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node and snapshot builders plus tree walkers.
//!
//! Fixtures default to surface `1` and component `"View"`; use [`node_on`]
//! for other surfaces.

use graft_core::{Node, NodeFamily, Snapshot, SurfaceId, Tag};
use serde_json::Value;

use crate::props::props;

/// Surface used by [`node`] and [`leaf`].
pub const DEFAULT_SURFACE: SurfaceId = SurfaceId(1);

/// Node with `tag`, JSON `props` and `children` on [`DEFAULT_SURFACE`].
pub fn node(tag: u32, props_json: Value, children: Vec<Node>) -> Node {
    node_on(DEFAULT_SURFACE, tag, props_json, children)
}

/// Childless node on [`DEFAULT_SURFACE`].
pub fn leaf(tag: u32, props_json: Value) -> Node {
    node(tag, props_json, Vec::new())
}

/// Node on an explicit surface.
pub fn node_on(surface: SurfaceId, tag: u32, props_json: Value, children: Vec<Node>) -> Node {
    Node::new(
        NodeFamily::new(Tag(tag), surface, "View"),
        props(props_json),
        children,
    )
}

/// Wraps `root` in a [`Snapshot`].
pub fn snapshot(root: Node) -> Snapshot {
    Snapshot::new(root)
}

/// Every node reachable from `root`, depth-first pre-order.
pub fn collect_nodes(root: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(n) = stack.pop() {
        stack.extend(n.children().iter().rev().cloned());
        out.push(n);
    }
    out
}
