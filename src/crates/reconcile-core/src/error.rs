//! Error types for graph construction, planning, and execution
//!
//! This module defines every error that can surface to a caller of `reconcile-core`.
//! All errors implement `std::error::Error` via the `thiserror` crate.
//!
//! # Error Hierarchy
//!
//! ```text
//! ReconcileError
//! ├── InvalidRegistration   - `register_transition` called with an empty `to` fragment
//! ├── PreconditionViolation - duplicate node path, unknown edge endpoint, mismatched node sets
//! └── SearchExhausted       - the planner's iteration bound was hit before reaching the goal
//! ```
//!
//! Two further signals never reach a `ReconcileError`:
//! - [`ValidationFailure`] is always local to neighbor filtering (§4.2/§4.3 of the design) —
//!   it prunes a candidate and is never propagated to the caller.
//! - [`CallbackError`] is captured per-step in `StepResult::exception` rather than
//!   aborting the whole plan.
//!
//! # Examples
//!
//! ```rust
//! use reconcile_core::error::ReconcileError;
//!
//! fn handle(err: ReconcileError) {
//!     match err {
//!         ReconcileError::SearchExhausted { max_iterations } => {
//!             eprintln!("gave up after {max_iterations} iterations");
//!         }
//!         ReconcileError::PreconditionViolation(msg) => eprintln!("bad input graph: {msg}"),
//!         ReconcileError::InvalidRegistration(msg) => eprintln!("bad registration: {msg}"),
//!     }
//! }
//! ```

use thiserror::Error;

/// Convenience result type using [`ReconcileError`].
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors that are always fatal to the call that produced them.
///
/// These never represent a rejected candidate state (that's [`ValidationFailure`]) and
/// never represent a single failed execution step (that's [`CallbackError`]); they mean the
/// caller asked for something the library cannot do.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A transition was registered with an empty `to` fragment.
    ///
    /// A transition must change at least one attribute; an empty `to` would be a no-op
    /// that can never be distinguished from "no transition available" during planning.
    #[error("invalid transition registration: {0}")]
    InvalidRegistration(String),

    /// A structural precondition of a graph or planner call was violated.
    ///
    /// Covers `add_nodes` with a duplicate path, `add_edges` referencing an endpoint
    /// that isn't in the graph, and `Planner::plan` being called with two graphs whose
    /// node-path sets differ.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// The planner exhausted its iteration bound without reaching the desired state.
    ///
    /// Distinct from the planner returning an empty plan: an empty plan means the
    /// frontier emptied naturally (the goal is provably unreachable from the explored
    /// space); this error means the bound was hit before the frontier could confirm
    /// either outcome.
    #[error("search exhausted after {max_iterations} iterations without reaching the desired state")]
    SearchExhausted {
        /// The iteration bound that was hit.
        max_iterations: usize,
    },
}

/// A graph- or node-level validation predicate rejected a candidate state.
///
/// This is never returned from a public API — it is caught internally by neighbor
/// enumeration (§4.3/§4.4) and simply prunes the candidate from the result set. It is a
/// public type only so validation callbacks can construct and return it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure(pub String);

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed: {}", self.0)
    }
}

impl std::error::Error for ValidationFailure {}

impl ValidationFailure {
    /// Build a validation failure with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// An error raised by a user-supplied transition callback, or by the wrapper around it.
///
/// Captured per-step by the `Executor` rather than aborting the plan — see
/// `StepResult::exception`.
#[derive(Error, Debug)]
pub enum CallbackError {
    /// The wrapped callback was invoked against a node of the wrong kind.
    #[error("node kind mismatch: expected '{expected}', found '{found}'")]
    NodeKindMismatch {
        /// Kind the transition was registered against.
        expected: String,
        /// Kind the node actually carries.
        found: String,
    },

    /// The node's current state was not a superset of the transition's `from` fragment.
    #[error("node at '{path}' does not satisfy the 'from' fragment for this transition")]
    FromMismatch {
        /// Path of the node the transition was attempted against.
        path: String,
    },

    /// No callback is registered for the given `(kind, from, to)` triple.
    #[error("no transition registered for kind '{kind}' matching this from/to pair")]
    Unregistered {
        /// Kind the lookup was attempted against.
        kind: String,
    },

    /// The user callback itself failed.
    #[error("{0}")]
    Failed(String),
}
