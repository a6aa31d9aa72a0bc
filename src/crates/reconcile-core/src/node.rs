//! State Node (C3): a single resource's path identity plus current attribute state.

use indexmap::IndexMap;

use crate::path::Path;
use crate::registry::{Kind, ReconcileContext};
use crate::state::{self, CanonicalState, State};

/// A single resource in a [`crate::graph::StateGraph`]: a path identity, a kind, and a
/// current attribute state.
///
/// Equality and ordering are derived structurally (path, kind, and state all compared),
/// which is what lets a `StateGraph` compare two candidate nodes for
/// [`crate::graph::StateGraph::has_same_state`] without a separate node-diffing step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateNode {
    path: Path,
    kind: Kind,
    state: State,
}

impl StateNode {
    /// Build a node at `path` of the given `kind` with the given current state.
    pub fn new(path: Path, kind: Kind, state: State) -> Self {
        Self { path, kind, state }
    }

    /// The node's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The canonical path string, e.g. `/extract/likes`.
    pub fn path_string(&self) -> String {
        self.path.to_string()
    }

    /// The path split into segments, e.g. `/extract/likes` → `["extract", "likes"]`.
    pub fn path_tuple(&self) -> Vec<&str> {
        self.path.segments()
    }

    /// The node's kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The node's current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Every neighbor reachable by a single registered transition whose `from` fragment
    /// matches this node's current state and whose resulting candidate state passes every
    /// node-level validation registered for this node's kind.
    ///
    /// Walks transitions in registration order (via
    /// [`crate::registry::TransitionRegistry::enumerate_for`]), so the returned map's
    /// iteration order is deterministic. Keyed by the triggering `(from, to)` canonical
    /// fragment pair; if two transitions happen to produce the same resulting state, the
    /// later one registered wins in the map (insertion-ordered overwrite).
    pub fn neighbors(
        &self,
        ctx: &ReconcileContext,
    ) -> IndexMap<(CanonicalState, CanonicalState), StateNode> {
        let mut result = IndexMap::new();
        for (from, to) in ctx.transitions.enumerate_for(&self.kind) {
            if !state::is_superset(&self.state, &from) {
                continue;
            }
            let candidate_state = state::merge(&self.state, &to);
            let candidate = StateNode::new(self.path.clone(), self.kind.clone(), candidate_state);
            if ctx.validations.check_node(&self.kind, &candidate).is_err() {
                continue;
            }
            let key = (CanonicalState::of(&from), CanonicalState::of(&to));
            result.insert(key, candidate);
        }
        result
    }
}
