//! State Graph (C4): a directed graph of [`StateNode`]s plus structural edges.
//!
//! Edges are stored as `(Path, Path)` pairs rather than references to node objects. That
//! one decision is what makes neighbor enumeration simple: replacing a node with its
//! post-transition successor at the same path preserves every edge touching it, in both
//! directions, with no edge-rewiring step to get right (`SPEC_FULL.md` §4.4.2).

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::error::{ReconcileError, Result};
use crate::node::StateNode;
use crate::path::Path;
use crate::registry::{Kind, ReconcileContext};
use crate::state::CanonicalState;

/// A directed graph of [`StateNode`]s, identified and connected by [`Path`].
///
/// Always contains a root node at `/`. `add_nodes` rejects duplicate paths; `add_edges`
/// requires both endpoints to already be present.
#[derive(Clone, Debug)]
pub struct StateGraph {
    kind: Kind,
    nodes: BTreeMap<Path, StateNode>,
    edges: Vec<(Path, Path)>,
}

impl StateGraph {
    /// A new graph containing only a root node at `/`, of the given node-kind, with empty
    /// state.
    pub fn new(kind: impl Into<Kind>, root_node_kind: impl Into<Kind>) -> Self {
        let kind = kind.into();
        let root = StateNode::new(Path::root(), root_node_kind.into(), crate::state::State::new());
        let mut nodes = BTreeMap::new();
        nodes.insert(Path::root(), root);
        Self { kind, nodes, edges: Vec::new() }
    }

    /// This graph's kind (the key graph-level validations are registered against).
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Overwrite the root node's state in place. A convenience for building a desired
    /// graph that differs from a freshly-constructed one only at the root, without going
    /// through `add_nodes` (which would reject `/` as already present).
    pub fn set_root_state(&mut self, state: crate::state::State) {
        self.set_node_state(&Path::root(), state);
    }

    /// Nodes in sorted-path order, for deterministic iteration.
    pub fn nodes(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.values()
    }

    /// Look up a node by path.
    pub fn node(&self, path: &Path) -> Option<&StateNode> {
        self.nodes.get(path)
    }

    /// The graph's edges, in insertion order.
    pub fn edges(&self) -> &[(Path, Path)] {
        &self.edges
    }

    /// Add nodes to the graph. Fails if any node's path already exists.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = StateNode>) -> Result<()> {
        for node in nodes {
            if self.nodes.contains_key(node.path()) {
                return Err(ReconcileError::PreconditionViolation(format!(
                    "node already exists at path '{}'",
                    node.path()
                )));
            }
            self.nodes.insert(node.path().clone(), node);
        }
        Ok(())
    }

    /// Add edges to the graph. Fails if either endpoint of any edge is not already a node
    /// in the graph.
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = (Path, Path)>) -> Result<()> {
        for (from, to) in edges {
            if !self.nodes.contains_key(&from) {
                return Err(ReconcileError::PreconditionViolation(format!(
                    "edge references unknown node '{from}'"
                )));
            }
            if !self.nodes.contains_key(&to) {
                return Err(ReconcileError::PreconditionViolation(format!(
                    "edge references unknown node '{to}'"
                )));
            }
            self.edges.push((from, to));
        }
        Ok(())
    }

    /// Replace the node at `path` with `replacement`, preserving every edge touching that
    /// path automatically (edges reference paths, not node objects).
    pub(crate) fn with_node_replaced(&self, path: &Path, replacement: StateNode) -> Self {
        let mut clone = self.clone();
        clone.nodes.insert(path.clone(), replacement);
        clone
    }

    /// Overwrite the state of the node at `path` in place, keeping its path and kind.
    /// Used by the [`crate::executor::Executor`] to apply a step's effect to the live graph
    /// during non-dry-run execution; no-op if `path` is not present.
    pub(crate) fn set_node_state(&mut self, path: &Path, new_state: crate::state::State) {
        if let Some(node) = self.nodes.get_mut(path) {
            *node = StateNode::new(path.clone(), node.kind().clone(), new_state);
        }
    }

    /// Two graphs are equal iff their node-path sets match, every node's state matches its
    /// counterpart by path, and their edge sets (normalized to sorted path-pairs) match.
    /// Equality is directional: `(a, b)` and `(b, a)` are distinct edges.
    pub fn has_same_state(&self, other: &StateGraph) -> bool {
        self.state_key() == other.state_key()
    }

    /// The canonical, hashable representation of this graph's state: sorted per-node
    /// canonical state pairs plus the sorted edge list. Used as the key type for the
    /// planner's `cost_so_far`/`came_from`/closed-set bookkeeping.
    pub fn state_key(&self) -> GraphStateKey {
        let nodes = self
            .nodes
            .iter()
            .map(|(path, node)| (path.clone(), CanonicalState::of(node.state())))
            .collect();
        let mut edges = self.edges.clone();
        edges.sort();
        GraphStateKey { nodes, edges }
    }

    /// Whole-graph neighbor enumeration: for each node (in sorted-path order), obtain its
    /// [`StateNode::neighbors`], replace it in a cloned graph, and keep the result if every
    /// graph-level validation registered for this graph's kind passes on the replacement.
    ///
    /// Keyed by `(path, kind, from, to)`, where `kind` is the node's kind at the moment the
    /// transition was enumerated against it, so the executor can later confirm the plan is
    /// still being replayed against a node of that same kind before looking the transition's
    /// callback back up. Duplicate keys cannot arise across different nodes (the path
    /// disambiguates them); if two transitions on the same node produce the same resulting
    /// graph, the later-registered one wins per insertion-ordered map semantics.
    pub fn neighbors(
        &self,
        ctx: &ReconcileContext,
    ) -> IndexMap<(Path, Kind, CanonicalState, CanonicalState), StateGraph> {
        let mut result = IndexMap::new();
        for node in self.nodes.values() {
            for ((from, to), candidate_node) in node.neighbors(ctx) {
                let candidate_graph = self.with_node_replaced(node.path(), candidate_node);
                if ctx.validations.check_graph(&self.kind, &candidate_graph).is_err() {
                    continue;
                }
                result.insert((node.path().clone(), node.kind().clone(), from, to), candidate_graph);
            }
        }
        result
    }
}

/// The canonical, hashable representation of a whole-graph state: sorted per-node
/// canonical state pairs plus the sorted edge list. Two graphs have equal `GraphStateKey`s
/// iff [`StateGraph::has_same_state`] holds between them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphStateKey {
    nodes: Vec<(Path, CanonicalState)>,
    edges: Vec<(Path, Path)>,
}
