// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for nodes and surfaces.

/// Stable identity of a logical tree node.
///
/// Every clone derived from one node shares its `Tag`; the clone objects
/// themselves are distinct (see [`crate::Node::ptr_eq`]). Tags are assigned by
/// the host and are unique within a surface.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Tag(pub u32);

impl Tag {
    /// Returns the raw host-assigned value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a rendering surface (one root tree per surface).
///
/// Surface ids are handed out by the host in increasing order; the
/// [`crate::SurfaceGate`] relies on that ordering to initialize companion
/// subsystems at most once per surface.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SurfaceId(pub i32);

impl SurfaceId {
    /// Returns the raw host-assigned value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
