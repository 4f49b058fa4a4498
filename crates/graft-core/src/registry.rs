// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared registry of props mutations not yet reflected by the host.
//!
//! Producers (the animation side) append deltas from their own thread. The
//! commit hook reads and prunes the registry only through a [`RegistryLease`],
//! which it obtains from [`PendingRegistry::acquire`] at the start of a commit
//! attempt and keeps until the attempt resolves. While a lease is alive,
//! producer writes block.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use rustc_hash::FxHashMap;

use crate::batch::MutationBatch;
use crate::ident::{SurfaceId, Tag};
use crate::node::NodeFamily;
use crate::props::PropsDelta;

/// Exclusive access to a [`PendingRegistry`] for one commit attempt.
///
/// Reading and pruning are only possible through a lease, so both always
/// happen with the registry lock held. Dropping the lease releases the lock.
pub trait RegistryLease {
    /// Copies the pending deltas of every node mounted on `surface`.
    fn snapshot_pending(&self, surface: SurfaceId) -> MutationBatch;

    /// Forgets the pending deltas of every tag in `tags`.
    ///
    /// Unknown tags are ignored.
    fn remove_all(&mut self, tags: &[Tag]);
}

/// Registry seam consumed by [`crate::CommitHook`].
pub trait PendingRegistry {
    /// Lease type handed out by [`PendingRegistry::acquire`].
    type Lease: RegistryLease;

    /// Blocks until exclusive access is available and returns it.
    fn acquire(&self) -> Self::Lease;

    /// Asks the animation side to skip its next self-originated commit.
    ///
    /// Called after a host commit has been patched with everything pending,
    /// which makes an in-flight animation commit redundant.
    fn please_skip_animation_commit(&self);
}

#[derive(Debug)]
struct PendingEntry {
    family: Arc<NodeFamily>,
    deltas: Vec<PropsDelta>,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: FxHashMap<Tag, PendingEntry>,
}

/// In-memory [`PendingRegistry`] shared between producers and the hook.
///
/// Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct PropsRegistry {
    state: Arc<Mutex<RegistryState>>,
    skip_animation_commit: Arc<AtomicBool>,
}

impl PropsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `delta` for the node identified by `family`.
    ///
    /// Deltas for one node are kept in call order. The most recent family
    /// seen for a tag is kept for ancestor resolution. Blocks while a commit
    /// attempt holds the registry.
    pub fn update(&self, family: &Arc<NodeFamily>, delta: PropsDelta) {
        let mut state = self.state.lock();
        let entry = state
            .entries
            .entry(family.tag)
            .or_insert_with(|| PendingEntry {
                family: Arc::clone(family),
                deltas: Vec::new(),
            });
        if !Arc::ptr_eq(&entry.family, family) {
            entry.family = Arc::clone(family);
        }
        entry.deltas.push(delta);
    }

    /// Drops every pending delta for `tag` (e.g. the node was unmounted).
    ///
    /// Returns `true` if the tag was pending.
    pub fn remove(&self, tag: Tag) -> bool {
        self.state.lock().entries.remove(&tag).is_some()
    }

    /// Returns `true` if `tag` has pending deltas.
    pub fn contains(&self, tag: Tag) -> bool {
        self.state.lock().entries.contains_key(&tag)
    }

    /// Number of pending deltas queued for `tag`.
    pub fn pending_deltas(&self, tag: Tag) -> usize {
        self.state
            .lock()
            .entries
            .get(&tag)
            .map_or(0, |entry| entry.deltas.len())
    }

    /// Pending tags in ascending order.
    pub fn pending_tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.state.lock().entries.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Number of pending tags.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Returns `true` if a commit attempt currently holds the registry.
    pub fn is_leased(&self) -> bool {
        self.state.is_locked()
    }

    /// Consumes the skip request raised by the hook, if any.
    pub fn take_skip_animation_commit(&self) -> bool {
        self.skip_animation_commit.swap(false, Ordering::AcqRel)
    }
}

impl PendingRegistry for PropsRegistry {
    type Lease = PropsRegistryLease;

    fn acquire(&self) -> Self::Lease {
        PropsRegistryLease {
            guard: self.state.lock_arc(),
        }
    }

    fn please_skip_animation_commit(&self) {
        self.skip_animation_commit.store(true, Ordering::Release);
    }
}

impl core::fmt::Debug for PropsRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropsRegistry")
            .field("leased", &self.is_leased())
            .field(
                "skip_animation_commit",
                &self.skip_animation_commit.load(Ordering::Acquire),
            )
            .finish_non_exhaustive()
    }
}

/// Owned lock on a [`PropsRegistry`].
pub struct PropsRegistryLease {
    guard: ArcMutexGuard<RawMutex, RegistryState>,
}

impl RegistryLease for PropsRegistryLease {
    fn snapshot_pending(&self, surface: SurfaceId) -> MutationBatch {
        let mut batch = MutationBatch::new();
        for entry in self.guard.entries.values() {
            if entry.family.surface_id == surface {
                batch.insert_for(Arc::clone(&entry.family), entry.deltas.clone());
            }
        }
        batch
    }

    fn remove_all(&mut self, tags: &[Tag]) {
        for tag in tags {
            self.guard.entries.remove(tag);
        }
    }
}

impl core::fmt::Debug for PropsRegistryLease {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropsRegistryLease")
            .field("pending", &self.guard.entries.len())
            .finish()
    }
}
