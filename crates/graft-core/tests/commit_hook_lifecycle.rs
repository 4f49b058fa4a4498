// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Begin/succeeded/finalized protocol of the commit hook.

#![allow(missing_docs)]
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use graft_core::{
    CommitHook, CommitHookError, CommitOrigin, CommitRequest, CommitResolution, HookConfig,
    HookPhase, NodeFamily, PatchError, PropsRegistry, Snapshot, SurfaceId, Tag, TreeError,
};
use graft_dry_tests::{
    delta, init_tracing, leaf, node, node_on, snapshot, LayoutEvent, RecordingLayoutAnimations,
};
use serde_json::json;

type Hook = CommitHook<PropsRegistry, RecordingLayoutAnimations>;

fn family(tag: u32) -> Arc<NodeFamily> {
    Arc::new(NodeFamily::new(Tag(tag), SurfaceId(1), "View"))
}

/// A(1) -> [B(2), C(3)]
fn scene(b_opacity: f64) -> Snapshot {
    snapshot(node(
        1,
        json!({}),
        vec![leaf(2, json!({"opacity": b_opacity})), leaf(3, json!({"opacity": 1.0}))],
    ))
}

fn hook_with(config: HookConfig) -> (Hook, Arc<PropsRegistry>, Arc<RecordingLayoutAnimations>) {
    let registry = Arc::new(PropsRegistry::new());
    let layout = Arc::new(RecordingLayoutAnimations::new());
    let hook = CommitHook::with_config(Arc::clone(&registry), Arc::clone(&layout), config);
    (hook, registry, layout)
}

fn hook() -> (Hook, Arc<PropsRegistry>, Arc<RecordingLayoutAnimations>) {
    hook_with(HookConfig::default())
}

#[test]
fn converged_entries_are_pruned_after_success() {
    init_tracing();
    let (mut hook, registry, layout) = hook();
    registry.update(&family(2), delta(json!({"opacity": 0.5})));
    registry.update(&family(3), delta(json!({"opacity": 0.2})));
    let old = scene(1.0);
    // Host already committed B at 0.5, C still stale.
    let new = scene(0.5);

    let patched = hook.begin(CommitRequest::host(&old, &new)).unwrap();
    assert_eq!(hook.phase(), HookPhase::LockHeld);
    assert_eq!(hook.pending_removals(), &[Tag(2)]);
    assert!(registry.is_leased());
    assert_eq!(
        patched.find(Tag(3)).unwrap().props().get("opacity"),
        Some(&json!(0.2))
    );

    hook.succeeded().unwrap();
    assert!(!registry.is_leased());
    assert_eq!(registry.pending_tags(), vec![Tag(3)]);

    assert_eq!(hook.finalized().unwrap(), CommitResolution::Committed);
    assert_eq!(hook.phase(), HookPhase::Idle);
    assert_eq!(
        layout.events(),
        vec![LayoutEvent::Initialized(SurfaceId(1)), LayoutEvent::Finalized(SurfaceId(1))]
    );
}

#[test]
fn abandoned_commit_leaves_registry_unchanged() {
    let (mut hook, registry, layout) = hook();
    registry.update(&family(2), delta(json!({"opacity": 0.7})));
    registry.update(&family(2), delta(json!({"opacity": 0.5})));
    registry.update(&family(3), delta(json!({"opacity": 1.0})));
    registry.update(&family(3), delta(json!({"color": "red"})));
    registry.update(&family(3), delta(json!({"opacity": 0.4})));
    let pending_before = registry.pending_tags();
    let queued_before: Vec<usize> = pending_before
        .iter()
        .map(|&tag| registry.pending_deltas(tag))
        .collect();
    let old = scene(1.0);
    // B converges, so a successful commit would have pruned it.
    let new = scene(0.5);

    hook.begin(CommitRequest::host(&old, &new)).unwrap();
    assert_eq!(hook.pending_removals(), &[Tag(2)]);
    assert_eq!(hook.finalized().unwrap(), CommitResolution::Abandoned);

    assert!(!registry.is_leased());
    assert_eq!(registry.pending_tags(), pending_before);
    let queued_after: Vec<usize> = pending_before
        .iter()
        .map(|&tag| registry.pending_deltas(tag))
        .collect();
    assert_eq!(queued_after, queued_before);
    assert_eq!(queued_after, vec![2, 3]);
    assert_eq!(layout.finalized_count(), 1);
}

#[test]
fn tree_families_keep_the_candidate_unindexed() {
    let (mut hook, registry, _layout) = hook();
    let wide: Vec<_> = (100..20_100).map(|tag| leaf(tag, json!({}))).collect();
    let snap = snapshot(node(
        1,
        json!({}),
        vec![leaf(2, json!({"opacity": 1.0})), node(3, json!({}), wide)],
    ));
    let target = snap.root().children()[0].clone();
    registry.update(target.family(), delta(json!({"opacity": 0.5})));

    let patched = hook.begin(CommitRequest::host(&snap, &snap)).unwrap();

    assert!(!snap.is_indexed());
    assert!(patched.root().children()[1].ptr_eq(&snap.root().children()[1]));
    hook.succeeded().unwrap();
    hook.finalized().unwrap();
    assert_eq!(
        patched.root().children()[0].props().get("opacity"),
        Some(&json!(0.5))
    );
}

#[test]
fn pruning_can_be_disabled() {
    let (mut hook, registry, _layout) = hook_with(HookConfig {
        prune_converged: false,
        ..HookConfig::default()
    });
    registry.update(&family(2), delta(json!({"opacity": 0.5})));
    let snap = scene(0.5);

    hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
    hook.succeeded().unwrap();
    hook.finalized().unwrap();

    assert!(registry.contains(Tag(2)));
}

#[test]
fn reentrant_begin_is_rejected_without_disturbing_the_attempt() {
    let (mut hook, registry, _layout) = hook();
    registry.update(&family(2), delta(json!({"opacity": 0.5})));
    let snap = scene(0.5);

    hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
    let err = hook.begin(CommitRequest::host(&snap, &snap)).unwrap_err();
    assert!(matches!(err, CommitHookError::ReentrantBegin(HookPhase::LockHeld)));
    assert_eq!(hook.phase(), HookPhase::LockHeld);
    assert!(registry.is_leased());

    hook.succeeded().unwrap();
    hook.finalized().unwrap();
    assert!(registry.is_empty());
}

#[test]
fn out_of_order_calls_are_errors() {
    let (mut hook, _registry, _layout) = hook();
    assert!(matches!(hook.succeeded(), Err(CommitHookError::NoActiveAttempt)));
    assert!(matches!(hook.finalized(), Err(CommitHookError::NoActiveAttempt)));

    let snap = scene(1.0);
    hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
    hook.succeeded().unwrap();
    assert!(matches!(hook.succeeded(), Err(CommitHookError::AlreadySucceeded)));
    assert_eq!(hook.finalized().unwrap(), CommitResolution::Committed);
}

#[test]
fn failed_patch_aborts_and_releases_the_lease() {
    let (mut hook, registry, layout) = hook();
    registry.update(&family(42), delta(json!({"opacity": 0.5})));
    let snap = scene(1.0);

    let err = hook.begin(CommitRequest::host(&snap, &snap)).unwrap_err();
    assert!(matches!(
        err,
        CommitHookError::Patch(PatchError::Tree(TreeError::UnknownTag(Tag(42))))
    ));
    assert_eq!(hook.phase(), HookPhase::Aborted);
    assert!(!registry.is_leased());

    assert!(matches!(hook.succeeded(), Err(CommitHookError::AttemptAborted)));
    assert_eq!(hook.finalized().unwrap(), CommitResolution::Aborted);
    assert!(registry.contains(Tag(42)));
    assert_eq!(layout.finalized_count(), 1);
}

#[test]
fn other_surfaces_are_not_applied() {
    let (mut hook, registry, _layout) = hook();
    registry.update(
        &Arc::new(NodeFamily::new(Tag(2), SurfaceId(7), "View")),
        delta(json!({"opacity": 0.0})),
    );
    let snap = scene(1.0);

    let patched = hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
    assert!(patched.shares_root_with(&snap));
    hook.succeeded().unwrap();
    hook.finalized().unwrap();
    assert!(registry.contains(Tag(2)));
}

#[test]
fn animation_commits_pass_through_without_the_lease() {
    let (mut hook, registry, _layout) = hook();
    registry.update(&family(2), delta(json!({"opacity": 0.5})));
    let snap = scene(1.0);

    let out = hook
        .begin(CommitRequest {
            old_root: &snap,
            new_root: &snap,
            origin: CommitOrigin::Animation,
        })
        .unwrap();

    assert!(out.shares_root_with(&snap));
    assert_eq!(hook.phase(), HookPhase::Passthrough);
    assert!(!registry.is_leased());
    assert!(!registry.take_skip_animation_commit());
    hook.succeeded().unwrap();
    assert_eq!(hook.finalized().unwrap(), CommitResolution::Committed);
    assert!(registry.contains(Tag(2)));
}

#[test]
fn host_commit_asks_animation_side_to_skip_once() {
    let (mut hook, registry, _layout) = hook();
    let snap = scene(1.0);

    hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
    hook.succeeded().unwrap();
    hook.finalized().unwrap();

    assert!(registry.take_skip_animation_commit());
    assert!(!registry.take_skip_animation_commit());
}

#[test]
fn skip_request_can_be_disabled() {
    let (mut hook, registry, _layout) = hook_with(HookConfig {
        skip_animation_commit_after_host_commit: false,
        ..HookConfig::default()
    });
    let snap = scene(1.0);
    hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
    hook.finalized().unwrap();
    assert!(!registry.take_skip_animation_commit());
}

#[test]
fn layout_animations_initialize_only_on_new_high_water_marks() {
    let (mut hook, _registry, layout) = hook();
    for surface in [5, 3, 5, 6] {
        let snap = snapshot(node_on(SurfaceId(surface), 1, json!({}), Vec::new()));
        hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
        hook.succeeded().unwrap();
        hook.finalized().unwrap();
    }
    assert_eq!(layout.initialized(), vec![SurfaceId(5), SurfaceId(6)]);
    assert_eq!(layout.finalized_count(), 4);
}

#[test]
fn layout_initialization_can_be_disabled() {
    let (mut hook, _registry, layout) = hook_with(HookConfig {
        initialize_layout_animations: false,
        ..HookConfig::default()
    });
    let snap = scene(1.0);
    hook.begin(CommitRequest::host(&snap, &snap)).unwrap();
    hook.finalized().unwrap();
    assert!(layout.initialized().is_empty());
    assert_eq!(hook.surface_gate().high_water_mark(), None);
}

#[test]
fn producers_block_until_the_attempt_resolves() {
    let (mut hook, registry, _layout) = hook();
    let snap = scene(1.0);
    hook.begin(CommitRequest::host(&snap, &snap)).unwrap();

    let (tx, rx) = mpsc::channel();
    let producer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            registry.update(&family(3), delta(json!({"opacity": 0.3})));
            tx.send(()).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    hook.succeeded().unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    producer.join().unwrap();
    hook.finalized().unwrap();

    assert_eq!(registry.pending_deltas(Tag(3)), 1);
}

#[test]
fn update_racing_a_commit_survives_until_it_converges() {
    let (mut hook, registry, _layout) = hook();
    registry.update(&family(2), delta(json!({"opacity": 0.5})));
    let stale = scene(1.0);

    // First commit: host still shows 1.0, so the entry is applied but kept.
    let patched = hook.begin(CommitRequest::host(&stale, &stale)).unwrap();
    hook.succeeded().unwrap();
    hook.finalized().unwrap();
    assert!(registry.contains(Tag(2)));

    // Second commit is built on the patched tree: now converged and pruned.
    hook.begin(CommitRequest::host(&patched, &patched)).unwrap();
    hook.succeeded().unwrap();
    hook.finalized().unwrap();
    assert!(registry.is_empty());
}
