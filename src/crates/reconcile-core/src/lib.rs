//! # reconcile-core — declarative graph reconciliation
//!
//! Computes and optionally executes a minimal, validity-preserving sequence of state
//! transitions that drives a graph of interdependent resources from an observed
//! configuration to a desired one.
//!
//! Callers describe resources as nodes in a [`graph::StateGraph`], register transitions
//! that mutate a single node's state, register cross-cutting validations that constrain
//! any reachable whole-graph state, and ask a [`planner::Planner`] for a plan or a
//! [`executor::Executor`] to apply it.
//!
//! ## Core Concepts
//!
//! ### 1. Paths are identity
//!
//! A [`path::Path`] is the only thing that identifies a [`node::StateNode`] within a
//! [`graph::StateGraph`]. Edges are stored as pairs of paths rather than references to
//! node objects, which is what lets the planner replace a node's state without ever
//! having to rewrite the edges touching it.
//!
//! ### 2. Transitions and validations are registered, not inferred
//!
//! A [`registry::ReconcileContext`] bundles two registries:
//! - **Transitions** (`Kind → from-fragment → to-fragment → callback`): applicable to a
//!   node whose current state is a superset of `from`; on application, the node's new
//!   state is `(old ∪ to)` with any key whose new value is `serde_json::Value::Null`
//!   removed.
//! - **Validations** (`Kind → ordered predicate list`): node-level and graph-level,
//!   evaluated in registration order, short-circuiting on first failure. A validation
//!   failure prunes a candidate state during neighbor enumeration — it is never the cause
//!   of a planning or execution error.
//!
//! ### 3. Planning is A* over whole-graph states
//!
//! [`planner::Planner::plan`] searches the space of graph-states reachable from the
//! current graph, using the count of still-mismatched attribute pairs as an admissible,
//! consistent heuristic, and returns the shortest sequence of [`planner::TransitionStep`]s
//! that reaches a graph with the same state as the desired graph.
//!
//! ### 4. Execution walks the plan, dry or live
//!
//! [`executor::Executor::execute`] walks a [`planner::Plan`] in order. A dry run reports
//! what each step would do without invoking any callback or mutating the graph; a live run
//! invokes the bound callback per step, mutates the node in place, and captures a failing
//! callback in that step's result rather than aborting the run.
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::graph::StateGraph;
//! use reconcile_core::registry::ReconcileContext;
//! use reconcile_core::planner::Planner;
//! use reconcile_core::executor::Executor;
//! use reconcile_core::state::State;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut ctx = ReconcileContext::new();
//! ctx.register_transition(
//!     "resource",
//!     State::new(),
//!     [("ready".to_string(), json!(true))].into_iter().collect(),
//!     Arc::new(|_node| Ok(json!({"started": true}))),
//! ).unwrap();
//!
//! let mut current = StateGraph::new("cluster", "resource");
//! let mut desired = StateGraph::new("cluster", "resource");
//! let mut desired_state = State::new();
//! desired_state.insert("ready".to_string(), json!(true));
//! desired.set_root_state(desired_state);
//!
//! let planner = Planner::new(&ctx);
//! let plan = planner.plan(&current, &desired).unwrap();
//! assert_eq!(plan.len(), 1);
//!
//! let executor = Executor::new(&ctx);
//! let results = executor.execute(&mut current, &plan, true);
//! assert_eq!(results.len(), 1);
//! ```
//!
//! ## Module Organization
//!
//! - [`error`] — the `ReconcileError` / `ValidationFailure` / `CallbackError` taxonomy.
//! - [`path`] — node path identity.
//! - [`state`] — state maps, fragments, the `Value::Null` removal sentinel, canonical form.
//! - [`registry`] — the transition registry (C1), validation registry (C2), and
//!   [`registry::ReconcileContext`].
//! - [`node`] — [`node::StateNode`] and node-level neighbor enumeration (C3).
//! - [`graph`] — [`graph::StateGraph`], graph equality, and whole-graph neighbor
//!   enumeration (C4).
//! - [`planner`] — the A* [`planner::Planner`] (C5).
//! - [`executor`] — the [`executor::Executor`] that walks a plan (C6).

pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod path;
pub mod planner;
pub mod registry;
pub mod state;

pub use error::{CallbackError, ReconcileError, Result, ValidationFailure};
pub use executor::{Executor, StepResult};
pub use graph::{GraphStateKey, StateGraph};
pub use node::StateNode;
pub use path::Path;
pub use planner::{Plan, Planner, PlannerConfig, TransitionStep};
pub use registry::{Kind, ReconcileContext, TransitionCallback, TransitionRegistry, ValidationFn, ValidationRegistry};
pub use state::{CanonicalState, State};
