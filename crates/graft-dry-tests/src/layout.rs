// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording layout-animation companion.

use graft_core::{LayoutAnimations, SurfaceId};
use std::sync::Mutex;

/// One call observed by [`RecordingLayoutAnimations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    /// `initialize_for_surface` ran.
    Initialized(SurfaceId),
    /// `commit_finalized` ran.
    Finalized(SurfaceId),
}

/// Companion that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingLayoutAnimations {
    events: Mutex<Vec<LayoutEvent>>,
}

impl RecordingLayoutAnimations {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<LayoutEvent> {
        self.lock().clone()
    }

    /// Surfaces passed to `initialize_for_surface`, in call order.
    pub fn initialized(&self) -> Vec<SurfaceId> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                LayoutEvent::Initialized(s) => Some(*s),
                LayoutEvent::Finalized(_) => None,
            })
            .collect()
    }

    /// Number of `commit_finalized` calls.
    pub fn finalized_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, LayoutEvent::Finalized(_)))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LayoutEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LayoutAnimations for RecordingLayoutAnimations {
    fn initialize_for_surface(&self, surface: SurfaceId) {
        self.lock().push(LayoutEvent::Initialized(surface));
    }

    fn commit_finalized(&self, surface: SurfaceId) {
        self.lock().push(LayoutEvent::Finalized(surface));
    }
}
