//! State maps, fragments, and their canonical form
//!
//! A node's [`State`] is an unordered mapping from attribute name to an arbitrary,
//! JSON-representable value. A [`State`] used as a matcher (`from`) or a patch (`to`) is
//! called a state *fragment* — the same type serves both roles.
//!
//! `serde_json::Value::Null` inside a `to` fragment is the reserved sentinel meaning
//! "remove this key from the resulting state" (§9 of `SPEC_FULL.md`). A key simply absent
//! from a `to` fragment means "leave this key alone" — the two are never conflated.

use serde_json::Value;
use std::collections::BTreeMap;

/// An unordered attribute map. Backed by a `BTreeMap` so iteration is always key-sorted,
/// which is what makes [`canonical_pairs`] a trivial (already-sorted) traversal rather
/// than a separate sort step.
pub type State = BTreeMap<String, Value>;

/// The stable, sorted `(key, value)` sequence for a [`State`] — used wherever a state
/// needs to act as a map key or be compared/hashed structurally.
pub fn canonical_pairs(state: &State) -> Vec<(String, Value)> {
    state.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// A canonical state, made hashable by serializing each value to its JSON text form.
///
/// `serde_json::Value` doesn't implement `Hash`, so this is the representation used as a
/// key in the planner's `cost_so_far`/`came_from` maps and in transition-registry lookups.
/// Two states that are equal under `State`'s own `PartialEq` always produce equal
/// `CanonicalState`s, since `serde_json::to_string` is a deterministic function of a
/// `Value` and `State`'s `BTreeMap` iteration is already key-sorted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalState(Vec<(String, String)>);

impl CanonicalState {
    /// Build the canonical, hashable form of a state fragment.
    pub fn of(state: &State) -> Self {
        let pairs = state
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::to_string(v).unwrap_or_default()))
            .collect();
        Self(pairs)
    }

    /// The `(key, serialized-value)` pairs, in sorted-key order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// Number of `(key, serialized-value)` pairs in this canonical state that are *not*
    /// present (same key, same serialized value) in `other`.
    ///
    /// This is the planner's A* heuristic term for a single node: the count of attribute
    /// pairs still mismatched relative to the desired node state.
    pub fn mismatch_count(&self, other: &CanonicalState) -> usize {
        self.0.iter().filter(|pair| !other.0.contains(pair)).count()
    }
}

/// True iff every `(key, value)` pair in `fragment` is also present in `state`.
///
/// This is the "current state is a superset of `from`" test from §3/§4.1: a transition is
/// applicable to a node whose state is a superset of the transition's `from` fragment.
pub fn is_superset(state: &State, fragment: &State) -> bool {
    fragment.iter().all(|(k, v)| state.get(k) == Some(v))
}

/// Merge a patch fragment into a state, honoring the `Value::Null` removal sentinel.
///
/// The result is `(state ∪ patch)` with any key whose patch value is `Value::Null`
/// removed from the result entirely — this is the new-state computation from §4.1, used
/// both by node neighbor enumeration (to materialize candidates) and by the executor (to
/// actually mutate a node in place).
pub fn merge(state: &State, patch: &State) -> State {
    let mut result = state.clone();
    for (key, value) in patch {
        if value.is_null() {
            result.remove(key);
        } else {
            result.insert(key.clone(), value.clone());
        }
    }
    result
}
