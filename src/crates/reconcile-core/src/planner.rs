//! Planner (C5): A* search over whole-graph states.
//!
//! The state space is every graph-state reachable from the current graph by zero or more
//! steps of [`StateGraph::neighbors`]. The heuristic is the total count of per-node
//! attribute pairs still mismatched against the desired graph, which is admissible and
//! consistent for unit-cost transitions that may change more than one attribute at once
//! (§4.5 of `SPEC_FULL.md`): no step can close more mismatches than the size of its `to`
//! fragment, so the sum across nodes never overestimates the remaining distance.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{ReconcileError, Result};
use crate::graph::{GraphStateKey, StateGraph};
use crate::path::Path;
use crate::registry::{Kind, ReconcileContext};
use crate::state::CanonicalState;

/// One unit of a [`Plan`]: the node that changed, the kind it was planned against, and the
/// canonical `from`/`to` fragment pair that produced the change.
///
/// `kind` is the node's kind as observed during planning, not necessarily the kind the node
/// carries when the plan is later replayed against a (possibly different) live graph — the
/// executor checks the two against each other before invoking a callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionStep {
    pub path: Path,
    pub kind: Kind,
    pub from: CanonicalState,
    pub to: CanonicalState,
}

/// An ordered sequence of [`TransitionStep`]s, as produced by [`Planner::plan`].
pub type Plan = Vec<TransitionStep>;

/// Tunable bounds for a [`Planner`] run.
#[derive(Clone, Copy, Debug)]
pub struct PlannerConfig {
    /// Maximum number of frontier pops before giving up with [`ReconcileError::SearchExhausted`].
    pub max_iterations: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_iterations: 10_000 }
    }
}

/// A* search over graph-states, producing the shortest validity-preserving sequence of
/// transitions from a current graph to a desired graph.
pub struct Planner<'a> {
    ctx: &'a ReconcileContext,
    config: PlannerConfig,
}

impl<'a> Planner<'a> {
    pub fn new(ctx: &'a ReconcileContext) -> Self {
        Self { ctx, config: PlannerConfig::default() }
    }

    /// Override the default iteration bound (10 000).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Search for a minimal plan taking `current` to a graph with the same state as
    /// `desired`.
    ///
    /// Preconditions: `current` and `desired` must have identical node-path key sets.
    /// Returns `Ok(vec![])` if the frontier exhausts naturally without reaching `desired`
    /// (the goal is provably unreachable from the explored space under the registered
    /// transitions and validations); returns [`ReconcileError::SearchExhausted`] if the
    /// iteration bound is hit first, since in that case reachability was never confirmed
    /// either way.
    #[tracing::instrument(skip_all, fields(max_iterations = self.config.max_iterations))]
    pub fn plan(&self, current: &StateGraph, desired: &StateGraph) -> Result<Plan> {
        self.check_preconditions(current, desired)?;

        let desired_key = desired.state_key();
        if current.state_key() == desired_key {
            tracing::debug!("already at desired state, returning empty plan");
            return Ok(Vec::new());
        }

        let mut cost_so_far: HashMap<GraphStateKey, usize> = HashMap::new();
        let mut came_from: HashMap<GraphStateKey, (GraphStateKey, TransitionStep)> = HashMap::new();
        let mut graphs: HashMap<GraphStateKey, StateGraph> = HashMap::new();

        let start_key = current.state_key();
        cost_so_far.insert(start_key.clone(), 0);
        graphs.insert(start_key.clone(), current.clone());

        let mut frontier = BinaryHeap::new();
        let mut sequence: u64 = 0;
        frontier.push(Frontier {
            priority: heuristic(current, desired),
            sequence,
            key: start_key.clone(),
        });

        let mut iterations = 0usize;
        while let Some(Frontier { key, .. }) = frontier.pop() {
            if iterations >= self.config.max_iterations {
                tracing::warn!(iterations, "search exhausted before reaching desired state");
                return Err(ReconcileError::SearchExhausted {
                    max_iterations: self.config.max_iterations,
                });
            }
            iterations += 1;

            // A stale duplicate entry (superseded by a cheaper push since it was queued).
            let Some(&g_score) = cost_so_far.get(&key) else { continue };
            let current_graph = graphs[&key].clone();

            if key == desired_key {
                tracing::debug!(iterations, steps = ?g_score, "plan found");
                return Ok(reconstruct(&came_from, &start_key, &key));
            }

            for ((path, kind, from, to), successor) in current_graph.neighbors(self.ctx) {
                let successor_key = successor.state_key();
                let tentative_g = g_score + 1;
                let better = match cost_so_far.get(&successor_key) {
                    Some(&known) => tentative_g < known,
                    None => true,
                };
                if better {
                    cost_so_far.insert(successor_key.clone(), tentative_g);
                    came_from.insert(
                        successor_key.clone(),
                        (key.clone(), TransitionStep { path, kind, from, to }),
                    );
                    graphs.insert(successor_key.clone(), successor.clone());
                    sequence += 1;
                    frontier.push(Frontier {
                        priority: tentative_g + heuristic(&successor, desired),
                        sequence,
                        key: successor_key,
                    });
                }
            }
        }

        tracing::debug!("frontier exhausted naturally; desired state is unreachable");
        Ok(Vec::new())
    }

    fn check_preconditions(&self, current: &StateGraph, desired: &StateGraph) -> Result<()> {
        let current_paths: std::collections::BTreeSet<_> =
            current.nodes().map(|n| n.path().clone()).collect();
        let desired_paths: std::collections::BTreeSet<_> =
            desired.nodes().map(|n| n.path().clone()).collect();
        if current_paths != desired_paths {
            return Err(ReconcileError::PreconditionViolation(
                "current and desired graphs must have identical node-path sets".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sum, across every node path, of the count of canonical attribute pairs present in the
/// node's current state but absent from its desired counterpart.
fn heuristic(graph: &StateGraph, desired: &StateGraph) -> usize {
    graph
        .nodes()
        .map(|node| {
            let desired_state = desired
                .node(node.path())
                .map(|n| CanonicalState::of(n.state()))
                .unwrap_or_else(|| CanonicalState::of(&crate::state::State::new()));
            CanonicalState::of(node.state()).mismatch_count(&desired_state)
        })
        .sum()
}

fn reconstruct(
    came_from: &HashMap<GraphStateKey, (GraphStateKey, TransitionStep)>,
    start_key: &GraphStateKey,
    goal_key: &GraphStateKey,
) -> Plan {
    let mut steps = Vec::new();
    let mut cursor = goal_key.clone();
    while &cursor != start_key {
        let (predecessor, step) = came_from[&cursor].clone();
        steps.push(step);
        cursor = predecessor;
    }
    steps.reverse();
    steps
}

struct Frontier {
    priority: usize,
    sequence: u64,
    key: GraphStateKey,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse priority so the lowest f-score pops first, and
        // reverse sequence so ties break in insertion (FIFO) order.
        other.priority.cmp(&self.priority).then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
