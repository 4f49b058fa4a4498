// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! graft-core: selective copy-on-write props patching for immutable trees.
//!
//! An out-of-band producer (typically an animation driver) queues partial
//! props updates for individual nodes in a shared [`PropsRegistry`]. Whenever
//! the host commits a new tree, the [`CommitHook`] applies every pending
//! update on top of the candidate [`Snapshot`], cloning only the mutated nodes
//! and their ancestors. Updates that turn out to match what the host already
//! committed are pruned from the registry once the host confirms the commit.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod batch;
mod companion;
/// Hook configuration and the config storage port.
pub mod config;
mod convergence;
mod hook;
mod ident;
mod node;
mod path_index;
mod patcher;
mod props;
mod registry;
mod snapshot;
mod surface;

/// Pending deltas grouped per node for one patch cycle.
pub use batch::MutationBatch;
/// Layout-animation companion seam.
pub use companion::{LayoutAnimations, NoLayoutAnimations};
/// Configuration types.
pub use config::{ConfigError, ConfigService, ConfigStore, HookConfig};
/// Convergence check between patched and committed props.
pub use convergence::props_converged;
/// Three-phase commit hook.
pub use hook::{
    CommitHook, CommitHookError, CommitOrigin, CommitRequest, CommitResolution, HookPhase,
};
/// Node and surface identifiers.
pub use ident::{SurfaceId, Tag};
/// Immutable nodes and clone fragments.
pub use node::{FragmentProps, Node, NodeFamily, NodeFragment, NodeState};
/// Ancestor path index.
pub use path_index::AncestorPathIndex;
/// Copy-on-write patcher.
pub use patcher::{patch_snapshot, PatchError, PatchOutcome, TreePatcher};
/// Props and props deltas.
pub use props::{PropMap, Props, PropsDelta};
/// Pending registry seam and in-memory implementation.
pub use registry::{PendingRegistry, PropsRegistry, PropsRegistryLease, RegistryLease};
/// Snapshots and ancestor resolution.
pub use snapshot::{Ancestor, Snapshot, TreeError};
/// Once-per-surface initialization gate.
pub use surface::SurfaceGate;
