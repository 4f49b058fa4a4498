// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Commit hook: serializes props patching against the host commit pipeline.
//!
//! The host drives one commit attempt at a time through three phases:
//!
//! ```text
//! Idle --begin--> LockHeld --succeeded--> Committed --finalized--> Idle
//!                    |                                    ^
//!                    +------------finalized---------------+   (abandoned)
//! Idle --begin (patch error)--> Aborted --finalized--> Idle
//! Idle --begin (animation origin)--> Passthrough --succeeded--> Committed
//! ```
//!
//! `begin` acquires the registry lease and keeps it in the hook until the
//! attempt resolves. Converged tags are pruned from the registry only in
//! `succeeded`; an attempt the host abandons releases the lease in
//! `finalized` and leaves the registry untouched.
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, debug_span, trace, warn};

use crate::companion::LayoutAnimations;
use crate::config::HookConfig;
use crate::ident::{SurfaceId, Tag};
use crate::patcher::{patch_snapshot, PatchError};
use crate::registry::{PendingRegistry, RegistryLease};
use crate::snapshot::Snapshot;
use crate::surface::SurfaceGate;

/// Errors emitted by [`CommitHook`].
///
/// All of them reject the call without touching the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommitHookError {
    /// `begin` was called while another attempt is still unresolved.
    #[error("commit attempt already in progress ({0:?})")]
    ReentrantBegin(HookPhase),
    /// `succeeded` was called twice for one attempt.
    #[error("commit attempt already reported as succeeded")]
    AlreadySucceeded,
    /// `succeeded` was called for an attempt whose `begin` failed.
    #[error("commit attempt was aborted")]
    AttemptAborted,
    /// `succeeded` or `finalized` was called with no attempt in progress.
    #[error("no commit attempt in progress")]
    NoActiveAttempt,
    /// Patching the candidate snapshot failed; the attempt is aborted.
    #[error("patching the candidate snapshot failed: {0}")]
    Patch(#[from] PatchError),
}

/// Where a candidate commit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitOrigin {
    /// Regular host commit; pending props are applied on top of it.
    #[default]
    Host,
    /// Commit produced by the animation side itself. It already carries the
    /// animated props, so it passes through unpatched and unlocked.
    Animation,
}

/// Arguments of [`CommitHook::begin`].
#[derive(Debug, Clone, Copy)]
pub struct CommitRequest<'a> {
    /// Snapshot currently committed on the surface.
    pub old_root: &'a Snapshot,
    /// Candidate snapshot the host is about to commit.
    pub new_root: &'a Snapshot,
    /// Producer of the candidate.
    pub origin: CommitOrigin,
}

impl<'a> CommitRequest<'a> {
    /// Request for a host-originated commit.
    pub fn host(old_root: &'a Snapshot, new_root: &'a Snapshot) -> Self {
        Self {
            old_root,
            new_root,
            origin: CommitOrigin::Host,
        }
    }
}

/// Observable phase of a [`CommitHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// No attempt in progress.
    Idle,
    /// `begin` patched a host commit and holds the registry lease.
    LockHeld,
    /// `begin` accepted an animation-originated commit without locking.
    Passthrough,
    /// `succeeded` was reported; waiting for `finalized`.
    Committed,
    /// `begin` failed; waiting for `finalized`.
    Aborted,
}

/// How an attempt ended, as reported by [`CommitHook::finalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResolution {
    /// The host confirmed the commit.
    Committed,
    /// The host finalized without confirming; nothing was pruned.
    Abandoned,
    /// `begin` failed; nothing was pruned.
    Aborted,
}

struct Attempt<L> {
    surface: SurfaceId,
    lease: L,
    removals: Vec<Tag>,
}

enum HookState<L> {
    Idle,
    LockHeld(Attempt<L>),
    Passthrough(SurfaceId),
    Committed(SurfaceId),
    Aborted(SurfaceId),
}

impl<L> HookState<L> {
    const fn phase(&self) -> HookPhase {
        match self {
            Self::Idle => HookPhase::Idle,
            Self::LockHeld(_) => HookPhase::LockHeld,
            Self::Passthrough(_) => HookPhase::Passthrough,
            Self::Committed(_) => HookPhase::Committed,
            Self::Aborted(_) => HookPhase::Aborted,
        }
    }
}

/// Three-phase commit hook over a [`PendingRegistry`].
///
/// The hook is driven synchronously from the host's commit thread; methods
/// take `&mut self`, and a host that shares the hook across threads wraps it
/// in a lock of its own. A second `begin` before the previous attempt is
/// finalized is rejected rather than blocking on the registry.
pub struct CommitHook<R, A>
where
    R: PendingRegistry,
{
    registry: Arc<R>,
    layout_animations: Arc<A>,
    surface_gate: Arc<SurfaceGate>,
    config: HookConfig,
    state: HookState<R::Lease>,
}

impl<R, A> CommitHook<R, A>
where
    R: PendingRegistry,
    A: LayoutAnimations,
{
    /// Creates a hook with the default [`HookConfig`].
    pub fn new(registry: Arc<R>, layout_animations: Arc<A>) -> Self {
        Self::with_config(registry, layout_animations, HookConfig::default())
    }

    /// Creates a hook with an explicit configuration.
    pub fn with_config(registry: Arc<R>, layout_animations: Arc<A>, config: HookConfig) -> Self {
        Self {
            registry,
            layout_animations,
            surface_gate: Arc::new(SurfaceGate::new()),
            config,
            state: HookState::Idle,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> HookPhase {
        self.state.phase()
    }

    /// Active configuration.
    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// Shared registry.
    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Surface gate, shareable with contexts outside commit attempts.
    pub fn surface_gate(&self) -> Arc<SurfaceGate> {
        Arc::clone(&self.surface_gate)
    }

    /// Tags the current attempt will prune on success.
    ///
    /// Empty unless the hook is in [`HookPhase::LockHeld`].
    pub fn pending_removals(&self) -> &[Tag] {
        match &self.state {
            HookState::LockHeld(attempt) => &attempt.removals,
            _ => &[],
        }
    }

    /// Initializes layout animations for `surface` unless already done.
    ///
    /// Only takes the surface gate's own lock, never the registry lease.
    pub fn maybe_initialize_layout_animations(&self, surface: SurfaceId) -> bool {
        self.surface_gate
            .maybe_initialize(surface, self.layout_animations.as_ref())
    }

    /// Starts a commit attempt and returns the snapshot the host must commit.
    ///
    /// For host commits this takes the registry lease, patches
    /// `request.new_root` with every pending delta of its surface, and keeps
    /// the lease until the attempt resolves. Animation-originated commits are
    /// returned unchanged.
    ///
    /// # Errors
    /// - [`CommitHookError::ReentrantBegin`] if an attempt is already in
    ///   progress; the running attempt is left as is.
    /// - [`CommitHookError::Patch`] if the pending batch does not fit the
    ///   candidate. The lease is released and the attempt becomes
    ///   [`HookPhase::Aborted`]; the host still calls `finalized`.
    ///
    /// A registry entry whose node is no longer mounted on the surface fails
    /// every later host commit of that surface with
    /// [`crate::TreeError::UnknownTag`] until the entry is dropped. Hosts
    /// must call [`crate::PropsRegistry::remove`] (or their registry's
    /// equivalent) when a node is unmounted.
    ///
    /// Ancestors of pending nodes are resolved through their families while
    /// the lease is held, so the time producers stay blocked grows with the
    /// number of pending nodes times their depth, not with the tree size.
    pub fn begin(&mut self, request: CommitRequest<'_>) -> Result<Snapshot, CommitHookError> {
        let surface = request.new_root.surface_id();
        let span = debug_span!("commit_hook.begin", %surface, origin = ?request.origin);
        let _enter = span.enter();

        if !matches!(self.state, HookState::Idle) {
            let phase = self.state.phase();
            warn!(?phase, "rejected re-entrant begin");
            return Err(CommitHookError::ReentrantBegin(phase));
        }

        if self.config.initialize_layout_animations {
            self.maybe_initialize_layout_animations(surface);
        }

        if request.origin == CommitOrigin::Animation {
            debug!("animation commit passes through unpatched");
            self.state = HookState::Passthrough(surface);
            return Ok(request.new_root.clone());
        }

        if request.new_root.shares_root_with(request.old_root) {
            trace!("candidate reuses the committed root");
        }

        let lease = self.registry.acquire();
        let batch = lease.snapshot_pending(surface);
        match patch_snapshot(request.new_root, &batch) {
            Ok(outcome) => {
                if self.config.skip_animation_commit_after_host_commit {
                    self.registry.please_skip_animation_commit();
                }
                self.state = HookState::LockHeld(Attempt {
                    surface,
                    lease,
                    removals: outcome.removals,
                });
                Ok(outcome.snapshot)
            }
            Err(err) => {
                drop(lease);
                warn!(%err, "patch failed; attempt aborted");
                self.state = HookState::Aborted(surface);
                Err(err.into())
            }
        }
    }

    /// The host committed the snapshot returned by `begin`.
    ///
    /// Prunes converged tags from the registry and releases the lease.
    ///
    /// # Errors
    /// [`CommitHookError::AlreadySucceeded`], [`CommitHookError::AttemptAborted`]
    /// or [`CommitHookError::NoActiveAttempt`] when called out of order; the
    /// registry is not touched in those cases.
    pub fn succeeded(&mut self) -> Result<(), CommitHookError> {
        let span = debug_span!("commit_hook.succeeded");
        let _enter = span.enter();

        match std::mem::replace(&mut self.state, HookState::Idle) {
            HookState::LockHeld(mut attempt) => {
                if self.config.prune_converged && !attempt.removals.is_empty() {
                    attempt.lease.remove_all(&attempt.removals);
                    debug!(removed = attempt.removals.len(), "pruned converged props");
                }
                self.state = HookState::Committed(attempt.surface);
                Ok(())
            }
            HookState::Passthrough(surface) => {
                self.state = HookState::Committed(surface);
                Ok(())
            }
            state @ HookState::Committed(_) => {
                self.state = state;
                warn!("succeeded reported twice");
                Err(CommitHookError::AlreadySucceeded)
            }
            state @ HookState::Aborted(_) => {
                self.state = state;
                warn!("succeeded reported for an aborted attempt");
                Err(CommitHookError::AttemptAborted)
            }
            HookState::Idle => {
                warn!("succeeded reported with no attempt in progress");
                Err(CommitHookError::NoActiveAttempt)
            }
        }
    }

    /// The host is done with the attempt, successful or not.
    ///
    /// Releases the lease if `succeeded` never ran (discarding the removal
    /// list), notifies the layout-animation companion, and returns to idle.
    ///
    /// # Errors
    /// [`CommitHookError::NoActiveAttempt`] if no attempt is in progress.
    pub fn finalized(&mut self) -> Result<CommitResolution, CommitHookError> {
        let span = debug_span!("commit_hook.finalized");
        let _enter = span.enter();

        let (surface, resolution) = match std::mem::replace(&mut self.state, HookState::Idle) {
            HookState::Idle => {
                warn!("finalized reported with no attempt in progress");
                return Err(CommitHookError::NoActiveAttempt);
            }
            HookState::LockHeld(attempt) => {
                warn!(
                    discarded = attempt.removals.len(),
                    "commit abandoned; releasing registry unchanged"
                );
                (attempt.surface, CommitResolution::Abandoned)
            }
            HookState::Passthrough(surface) => (surface, CommitResolution::Abandoned),
            HookState::Committed(surface) => (surface, CommitResolution::Committed),
            HookState::Aborted(surface) => (surface, CommitResolution::Aborted),
        };
        self.layout_animations.commit_finalized(surface);
        debug!(%surface, ?resolution, "commit attempt finalized");
        Ok(resolution)
    }
}
