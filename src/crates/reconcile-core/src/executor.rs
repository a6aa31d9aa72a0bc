//! Executor (C6): walks a [`Plan`] against a live graph, invoking either a dry-run stub or
//! the user callback bound to each step's transition.

use serde_json::Value;

use crate::error::CallbackError;
use crate::graph::StateGraph;
use crate::registry::ReconcileContext;
use crate::state::{self, State};

/// The outcome of executing a single [`crate::planner::TransitionStep`].
///
/// Exactly one of `execution_result` and `exception` is populated. A dry run always
/// populates `execution_result` with `{"dry_run": true}` and never invokes a user
/// callback.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub node: String,
    pub from_state: State,
    pub to_state: State,
    pub execution_result: Option<Value>,
    pub exception: Option<String>,
}

/// Walks a [`Plan`] produced by [`crate::planner::Planner::plan`] against a live graph.
pub struct Executor<'a> {
    ctx: &'a ReconcileContext,
}

impl<'a> Executor<'a> {
    pub fn new(ctx: &'a ReconcileContext) -> Self {
        Self { ctx }
    }

    /// Execute every step of `plan` in order against `graph`.
    ///
    /// In dry-run mode, no callback is invoked and `graph` is not mutated — each step
    /// simply reports what *would* change. In live mode, each step's callback is looked up
    /// in the context's transition registry by `(kind, from, to)`, invoked against the
    /// node's current (possibly already-mutated-by-an-earlier-step) state, and the node is
    /// then updated in place per the wrapped-callback merge semantics. A failing callback
    /// is captured in that step's `exception` and execution continues with the next step —
    /// the executor never aborts or rolls back.
    #[tracing::instrument(skip_all, fields(steps = plan.len(), dry_run))]
    pub fn execute(&self, graph: &mut StateGraph, plan: &[crate::planner::TransitionStep], dry_run: bool) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(plan.len());
        for step in plan {
            let from_state = reconstruct_fragment(&step.from);
            let to_state = reconstruct_fragment(&step.to);

            if dry_run {
                tracing::debug!(node = %step.path, "dry run step");
                results.push(StepResult {
                    node: step.path.to_string(),
                    from_state,
                    to_state,
                    execution_result: Some(serde_json::json!({"dry_run": true})),
                    exception: None,
                });
                continue;
            }

            let outcome = self.execute_live_step(graph, step, &from_state, &to_state);
            results.push(outcome);
        }
        results
    }

    fn execute_live_step(
        &self,
        graph: &mut StateGraph,
        step: &crate::planner::TransitionStep,
        from_state: &State,
        to_state: &State,
    ) -> StepResult {
        let live_kind = graph.node(&step.path).map(|n| n.kind().clone());
        let Some(live_kind) = live_kind else {
            return StepResult {
                node: step.path.to_string(),
                from_state: from_state.clone(),
                to_state: to_state.clone(),
                execution_result: None,
                exception: Some(format!("no node at path '{}'", step.path)),
            };
        };

        if live_kind != step.kind {
            let err = CallbackError::NodeKindMismatch {
                expected: step.kind.to_string(),
                found: live_kind.to_string(),
            };
            tracing::warn!(node = %step.path, "node kind changed since this step was planned");
            return StepResult {
                node: step.path.to_string(),
                from_state: from_state.clone(),
                to_state: to_state.clone(),
                execution_result: None,
                exception: Some(err.to_string()),
            };
        }

        let callback = self.ctx.transitions.lookup(&step.kind, &step.from, &step.to).cloned();
        let Some(callback) = callback else {
            tracing::warn!(node = %step.path, "no transition registered for this step");
            return StepResult {
                node: step.path.to_string(),
                from_state: from_state.clone(),
                to_state: to_state.clone(),
                execution_result: None,
                exception: Some(CallbackError::Unregistered { kind: step.kind.to_string() }.to_string()),
            };
        };

        let node = graph.node(&step.path).expect("checked above").clone();
        if !state::is_superset(node.state(), from_state) {
            let err = CallbackError::FromMismatch { path: step.path.to_string() };
            tracing::warn!(node = %step.path, "from-fragment mismatch at execution time");
            return StepResult {
                node: step.path.to_string(),
                from_state: from_state.clone(),
                to_state: to_state.clone(),
                execution_result: None,
                exception: Some(err.to_string()),
            };
        }

        match callback(&node) {
            Ok(value) => {
                let new_state = state::merge(node.state(), to_state);
                graph.set_node_state(&step.path, new_state);
                StepResult {
                    node: step.path.to_string(),
                    from_state: from_state.clone(),
                    to_state: to_state.clone(),
                    execution_result: Some(value),
                    exception: None,
                }
            }
            Err(err) => {
                tracing::warn!(node = %step.path, error = %err, "transition callback failed");
                StepResult {
                    node: step.path.to_string(),
                    from_state: from_state.clone(),
                    to_state: to_state.clone(),
                    execution_result: None,
                    exception: Some(err.to_string()),
                }
            }
        }
    }
}

/// `CanonicalState` retains each value's serialized JSON text, so rebuilding a `State` from
/// it is a lossless parse of every pair.
fn reconstruct_fragment(canonical: &state::CanonicalState) -> State {
    canonical
        .pairs()
        .iter()
        .map(|(key, serialized)| {
            let value = serde_json::from_str(serialized).unwrap_or(Value::Null);
            (key.clone(), value)
        })
        .collect()
}
