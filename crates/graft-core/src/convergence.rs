// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Detects when a pending props mutation no longer changes anything visible.

use crate::props::Props;

/// Returns `true` if `candidate` adds nothing to `current`.
///
/// `candidate` is the result of folding a node's pending deltas onto its
/// `current` props. The check is deliberately asymmetric: the sets are equal
/// when they are the same allocation, or when every key of `candidate` is
/// present in `current` with an equal value. Keys only `current` has are not
/// inspected. A `false` here keeps the mutation pending, which is always safe.
pub fn props_converged(candidate: &Props, current: &Props) -> bool {
    candidate.ptr_eq(current) || candidate.is_contained_in(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{PropMap, PropsDelta};
    use serde_json::{json, Value};

    fn map(value: Value) -> PropMap {
        match value {
            Value::Object(map) => map,
            other => unreachable!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn same_allocation_converges() {
        let props = Props::from(map(json!({"opacity": 1})));
        assert!(props_converged(&props, &props.clone()));
    }

    #[test]
    fn delta_matching_committed_value_converges() {
        let current = Props::from(map(json!({"opacity": 1, "width": 3})));
        let delta = PropsDelta::from(map(json!({"opacity": 1})));
        let candidate = current.with_deltas([&delta]);
        assert!(props_converged(&candidate, &current));
    }

    #[test]
    fn new_key_does_not_converge() {
        let current = Props::from(map(json!({"opacity": 1})));
        let delta = PropsDelta::from(map(json!({"width": 3})));
        let candidate = current.with_deltas([&delta]);
        assert!(!props_converged(&candidate, &current));
    }

    #[test]
    fn changed_value_does_not_converge() {
        let current = Props::from(map(json!({"opacity": 1})));
        let delta = PropsDelta::from(map(json!({"opacity": 0.5})));
        let candidate = current.with_deltas([&delta]);
        assert!(!props_converged(&candidate, &current));
    }

    #[test]
    fn intermediate_deltas_do_not_matter() {
        let current = Props::from(map(json!({"opacity": 1})));
        let d1 = PropsDelta::from(map(json!({"opacity": 0.2})));
        let d2 = PropsDelta::from(map(json!({"opacity": 1})));
        let candidate = current.with_deltas([&d1, &d2]);
        assert!(props_converged(&candidate, &current));
    }
}
