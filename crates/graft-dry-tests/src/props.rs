// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Props and delta construction from JSON literals.

use graft_core::{PropMap, Props, PropsDelta};
use serde_json::Value;

fn object(value: Value) -> PropMap {
    match value {
        Value::Object(map) => map,
        Value::Null => PropMap::new(),
        other => {
            let mut map = PropMap::new();
            map.insert("value".to_owned(), other);
            map
        }
    }
}

/// Builds a [`Props`] set from a JSON object literal.
///
/// `null` yields an empty set; any other non-object is stored under the key
/// `"value"`.
///
/// ```
/// use graft_dry_tests::props;
/// use serde_json::json;
///
/// let p = props(json!({"opacity": 0.5}));
/// assert_eq!(p.get("opacity"), Some(&json!(0.5)));
/// ```
pub fn props(value: Value) -> Props {
    Props::from(object(value))
}

/// Builds a [`PropsDelta`] from a JSON object literal (same rules as [`props`]).
pub fn delta(value: Value) -> PropsDelta {
    PropsDelta::from(object(value))
}
