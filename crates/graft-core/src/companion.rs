// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Layout-animation companion seam.

use crate::ident::SurfaceId;

/// Layout-animation subsystem driven alongside the commit hook.
///
/// The hook calls [`LayoutAnimations::initialize_for_surface`] at most once per
/// surface (see [`crate::SurfaceGate`]) and
/// [`LayoutAnimations::commit_finalized`] once per finalized commit attempt,
/// whether or not the commit succeeded.
pub trait LayoutAnimations {
    /// Installs the subsystem on a newly observed surface.
    fn initialize_for_surface(&self, surface: SurfaceId);

    /// The host finished a commit attempt on `surface`.
    fn commit_finalized(&self, surface: SurfaceId);
}

/// Companion that does nothing; for hosts without layout animations.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLayoutAnimations;

impl LayoutAnimations for NoLayoutAnimations {
    fn initialize_for_surface(&self, _surface: SurfaceId) {}

    fn commit_finalized(&self, _surface: SurfaceId) {}
}
