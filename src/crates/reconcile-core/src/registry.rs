//! Transition registry (C1), validation registry (C2), and the `ReconcileContext` that
//! bundles them.
//!
//! The Python original these types are grounded on keeps two process-wide dictionaries
//! keyed by node- and graph-kind. Here both registries live inside a single
//! [`ReconcileContext`] value the caller constructs and threads explicitly through
//! `StateNode::neighbors`, `StateGraph::neighbors`, `Planner::plan`, and
//! `Executor::execute` — there is no hidden global state, so independent tests get
//! independent registries for free.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{CallbackError, ReconcileError, Result, ValidationFailure};
use crate::node::StateNode;
use crate::state::{CanonicalState, State};

/// An opaque, interned token naming the logical class of a node or a graph.
///
/// Transitions and node-level validations are registered against a node [`Kind`];
/// graph-level validations are registered against a graph [`Kind`]. The two are the same
/// Rust type — nothing stops a caller from reusing one string across both roles, but the
/// registries never confuse them since they're stored in separate maps.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kind(String);

impl Kind {
    /// Intern a kind token.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Kind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Kind {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A user-supplied transition callback: given the node it is being applied to, produce a
/// JSON value describing what happened, or fail.
///
/// Invoked only by the [`crate::executor::Executor`] during live (non-dry-run) execution.
/// Synchronous and `Send + Sync` rather than `async` — nothing in this reconciliation loop
/// needs two callbacks interleaved (see `SPEC_FULL.md` §5).
pub type TransitionCallback = Arc<dyn Fn(&StateNode) -> std::result::Result<Value, CallbackError> + Send + Sync>;

/// A user-supplied validation predicate over some subject `T` (a node or a graph).
///
/// Returning `Ok(())` means the subject is valid; `Err(ValidationFailure)` prunes the
/// candidate during neighbor enumeration. Any other error would indicate a programming
/// mistake in the predicate itself, which is why this signature only allows
/// `ValidationFailure` rather than a broader error type.
pub type ValidationFn<T> = Arc<dyn Fn(&T) -> std::result::Result<(), ValidationFailure> + Send + Sync>;

struct TransitionEntry {
    to: State,
    callback: TransitionCallback,
}

#[derive(Default)]
struct FromGroup {
    from: State,
    by_to: IndexMap<CanonicalState, TransitionEntry>,
}

/// C1: `Kind → from-fragment → {to-fragment → callback}`.
///
/// Registration is keyed by `(kind, from, to)`; re-registering the same triple overwrites
/// the previous callback. Enumeration for a kind walks `from` fragments and their `to`
/// fragments in registration order, which is what makes neighbor enumeration (and
/// therefore planning) deterministic.
#[derive(Default)]
pub struct TransitionRegistry {
    by_kind: IndexMap<Kind, IndexMap<CanonicalState, FromGroup>>,
}

impl TransitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transition. `to` must change at least one attribute.
    pub fn register(
        &mut self,
        kind: Kind,
        from: State,
        to: State,
        callback: TransitionCallback,
    ) -> Result<()> {
        if to.is_empty() {
            return Err(ReconcileError::InvalidRegistration(format!(
                "transition for kind '{kind}' has an empty 'to' fragment"
            )));
        }
        let from_key = CanonicalState::of(&from);
        let to_key = CanonicalState::of(&to);
        let group = self.by_kind.entry(kind).or_default().entry(from_key).or_insert_with(|| {
            FromGroup { from: from.clone(), by_to: IndexMap::new() }
        });
        group.by_to.insert(to_key, TransitionEntry { to, callback });
        Ok(())
    }

    /// Every `(from, to)` fragment pair registered for `kind`, in registration order.
    pub fn enumerate_for(&self, kind: &Kind) -> Vec<(State, State)> {
        let Some(from_map) = self.by_kind.get(kind) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for group in from_map.values() {
            for entry in group.by_to.values() {
                out.push((group.from.clone(), entry.to.clone()));
            }
        }
        out
    }

    /// Look up the callback bound to `(kind, from, to)`, for the executor.
    pub fn lookup(
        &self,
        kind: &Kind,
        from: &CanonicalState,
        to: &CanonicalState,
    ) -> Option<&TransitionCallback> {
        self.by_kind.get(kind)?.get(from)?.by_to.get(to).map(|entry| &entry.callback)
    }
}

#[derive(Default)]
struct ValidationList<T> {
    predicates: Vec<ValidationFn<T>>,
}

impl<T> ValidationList<T> {
    fn push(&mut self, predicate: ValidationFn<T>) {
        self.predicates.push(predicate);
    }

    fn check(&self, subject: &T) -> std::result::Result<(), ValidationFailure> {
        for predicate in &self.predicates {
            predicate(subject)?;
        }
        Ok(())
    }
}

/// C2: `Kind → ordered list of predicates`, one instance for node subjects and one for
/// graph subjects.
///
/// Evaluation is sequential in registration order and short-circuits on the first
/// failure — this is what the "validation short-circuit" testable property checks.
#[derive(Default)]
pub struct ValidationRegistry {
    node_validations: IndexMap<Kind, ValidationList<StateNode>>,
    graph_validations: IndexMap<Kind, ValidationList<crate::graph::StateGraph>>,
}

impl ValidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node-level predicate for `kind`.
    pub fn register_node_validation(&mut self, kind: Kind, predicate: ValidationFn<StateNode>) {
        self.node_validations.entry(kind).or_default().push(predicate);
    }

    /// Register a graph-level predicate for `kind`.
    pub fn register_graph_validation(
        &mut self,
        kind: Kind,
        predicate: ValidationFn<crate::graph::StateGraph>,
    ) {
        self.graph_validations.entry(kind).or_default().push(predicate);
    }

    /// Run every node-level predicate registered for `kind` against `node`, short-circuiting
    /// on first failure. A kind with no registered predicates always passes.
    pub fn check_node(
        &self,
        kind: &Kind,
        node: &StateNode,
    ) -> std::result::Result<(), ValidationFailure> {
        match self.node_validations.get(kind) {
            Some(list) => list.check(node),
            None => Ok(()),
        }
    }

    /// Run every graph-level predicate registered for `kind` against `graph`.
    pub fn check_graph(
        &self,
        kind: &Kind,
        graph: &crate::graph::StateGraph,
    ) -> std::result::Result<(), ValidationFailure> {
        match self.graph_validations.get(kind) {
            Some(list) => list.check(graph),
            None => Ok(()),
        }
    }
}

/// The caller-owned bundle of C1 + C2, threaded explicitly through every planning and
/// execution entry point.
///
/// Registries are treated as append-only once planning begins; Rust's own `&mut`/`&`
/// borrow rules already prevent mutating a `ReconcileContext` while a `plan()` call holds
/// a shared borrow of it, so no additional locking is needed for the single-threaded,
/// cooperative model this crate targets (`SPEC_FULL.md` §5).
#[derive(Default)]
pub struct ReconcileContext {
    pub transitions: TransitionRegistry,
    pub validations: ValidationRegistry,
}

impl ReconcileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transition for `kind`: applicable when a node's state is a superset of
    /// `from`; on application, its new state becomes `merge(state, to)` (§`state::merge`).
    pub fn register_transition(
        &mut self,
        kind: impl Into<Kind>,
        from: State,
        to: State,
        callback: TransitionCallback,
    ) -> Result<()> {
        self.transitions.register(kind.into(), from, to, callback)
    }

    /// Register a node-level validation for `kind`.
    pub fn register_node_validation(
        &mut self,
        kind: impl Into<Kind>,
        predicate: ValidationFn<StateNode>,
    ) {
        self.validations.register_node_validation(kind.into(), predicate);
    }

    /// Register a graph-level validation for `kind`.
    pub fn register_graph_validation(
        &mut self,
        kind: impl Into<Kind>,
        predicate: ValidationFn<crate::graph::StateGraph>,
    ) {
        self.validations.register_graph_validation(kind.into(), predicate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(pairs: &[(&str, Value)]) -> State {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn register_rejects_empty_to() {
        let mut reg = TransitionRegistry::new();
        let err = reg
            .register(Kind::new("k"), State::new(), State::new(), Arc::new(|_| Ok(json!(null))))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidRegistration(_)));
    }

    #[test]
    fn enumerate_returns_registered_pairs() {
        let mut reg = TransitionRegistry::new();
        reg.register(
            Kind::new("k"),
            State::new(),
            state(&[("blah", json!("blah"))]),
            Arc::new(|_| Ok(json!(null))),
        )
        .unwrap();
        let pairs = reg.enumerate_for(&Kind::new("k"));
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn unknown_kind_enumerates_empty() {
        let reg = TransitionRegistry::new();
        assert!(reg.enumerate_for(&Kind::new("missing")).is_empty());
    }

    #[test]
    fn validation_list_short_circuits() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let mut reg = ValidationRegistry::new();
        let calls_a = calls.clone();
        reg.register_node_validation(
            Kind::new("k"),
            Arc::new(move |_: &StateNode| {
                calls_a.fetch_add(1, Ordering::SeqCst);
                Err(ValidationFailure::new("always fails"))
            }),
        );
        let calls_b = calls.clone();
        reg.register_node_validation(
            Kind::new("k"),
            Arc::new(move |_: &StateNode| {
                calls_b.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        let node = StateNode::new(crate::path::Path::root(), Kind::new("k"), State::new());
        assert!(reg.check_node(&Kind::new("k"), &node).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregistered_kind_passes_validation() {
        let reg = ValidationRegistry::new();
        let node = StateNode::new(crate::path::Path::root(), Kind::new("k"), State::new());
        assert!(reg.check_node(&Kind::new("k"), &node).is_ok());
    }
}
