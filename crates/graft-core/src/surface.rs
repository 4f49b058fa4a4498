// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Once-per-surface companion initialization.

use parking_lot::Mutex;
use tracing::debug;

use crate::companion::LayoutAnimations;
use crate::ident::SurfaceId;

/// High-water mark of surfaces whose companion has been initialized.
///
/// Surface ids grow monotonically, so a single maximum is enough to tell new
/// surfaces from known ones: only an id strictly greater than the mark
/// initializes the companion and advances the mark. The mark has its own lock,
/// separate from the registry lock, because hosts consult it outside commit
/// attempts too.
#[derive(Debug, Default)]
pub struct SurfaceGate {
    max_initialized: Mutex<Option<SurfaceId>>,
}

impl SurfaceGate {
    /// Creates a gate that has seen no surface yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes `companion` for `surface` if the surface is new.
    ///
    /// Returns `true` if the companion was initialized by this call.
    pub fn maybe_initialize<L>(&self, surface: SurfaceId, companion: &L) -> bool
    where
        L: LayoutAnimations + ?Sized,
    {
        let mut max = self.max_initialized.lock();
        if max.is_some_and(|seen| surface <= seen) {
            return false;
        }
        companion.initialize_for_surface(surface);
        *max = Some(surface);
        debug!(%surface, "layout animations initialized for surface");
        true
    }

    /// Largest surface initialized so far.
    pub fn high_water_mark(&self) -> Option<SurfaceId> {
        *self.max_initialized.lock()
    }
}
