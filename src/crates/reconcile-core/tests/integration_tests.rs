//! End-to-end reconciliation scenarios, covering the concrete examples from the design
//! document's testable-properties section.

use reconcile_core::executor::Executor;
use reconcile_core::graph::StateGraph;
use reconcile_core::node::StateNode;
use reconcile_core::path::Path;
use reconcile_core::planner::Planner;
use reconcile_core::registry::{Kind, ReconcileContext, TransitionCallback};
use reconcile_core::state::State;
use serde_json::{json, Value};
use std::sync::Arc;

fn state(pairs: &[(&str, Value)]) -> State {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn noop() -> TransitionCallback {
    Arc::new(|_| Ok(json!(null)))
}

#[test]
fn single_node_single_step() {
    let mut ctx = ReconcileContext::new();
    ctx.register_transition("K", State::new(), state(&[("blah", json!("blah"))]), noop())
        .unwrap();

    let mut current = StateGraph::new("g", "K");
    current.set_root_state(state(&[("name", json!("root"))]));
    let mut desired = StateGraph::new("g", "K");
    desired.set_root_state(state(&[("name", json!("root")), ("blah", json!("blah"))]));

    let plan = Planner::new(&ctx).plan(&current, &desired).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].path, Path::root());
}

#[test]
fn two_nodes_no_edges_both_must_change() {
    let mut ctx = ReconcileContext::new();
    ctx.register_transition("K", State::new(), state(&[("blah", json!("blah"))]), noop())
        .unwrap();

    let child = Path::new("/child").unwrap();
    let mut current = StateGraph::new("g", "K");
    current.add_nodes([StateNode::new(child.clone(), Kind::new("K"), State::new())]).unwrap();

    let mut desired = StateGraph::new("g", "K");
    desired.set_root_state(state(&[("blah", json!("blah"))]));
    desired
        .add_nodes([StateNode::new(child, Kind::new("K"), state(&[("blah", json!("blah"))]))])
        .unwrap();

    let plan = Planner::new(&ctx).plan(&current, &desired).unwrap();
    assert_eq!(plan.len(), 2);
    // Sorted-path determinism: root (`/`) sorts before `/child`.
    assert_eq!(plan[0].path, Path::root());
    assert_eq!(plan[1].path, Path::new("/child").unwrap());
}

#[test]
fn multi_step_on_one_node() {
    let mut ctx = ReconcileContext::new();
    ctx.register_transition(
        "K",
        state(&[("name", json!("pre-transition"))]),
        state(&[("name", json!("post-transition")), ("something_else", json!("something"))]),
        noop(),
    )
    .unwrap();
    ctx.register_transition(
        "K",
        state(&[("something_else", json!("something"))]),
        state(&[("something_else", Value::Null)]),
        noop(),
    )
    .unwrap();

    let child = Path::new("/child").unwrap();
    let mut current = StateGraph::new("g", "K");
    current
        .add_nodes([StateNode::new(
            child.clone(),
            Kind::new("K"),
            state(&[("name", json!("pre-transition"))]),
        )])
        .unwrap();

    let mut desired = StateGraph::new("g", "K");
    desired
        .add_nodes([StateNode::new(
            child.clone(),
            Kind::new("K"),
            state(&[("name", json!("post-transition"))]),
        )])
        .unwrap();

    let plan = Planner::new(&ctx).plan(&current, &desired).unwrap();
    assert_eq!(plan.len(), 2);

    let executor = Executor::new(&ctx);
    let results = executor.execute(&mut current, &plan, false);
    assert!(results.iter().all(|r| r.exception.is_none()));
    let final_state = current.node(&child).unwrap().state();
    assert_eq!(final_state.get("name"), Some(&json!("post-transition")));
    assert!(!final_state.contains_key("something_else"));
    assert!(current.has_same_state(&desired));
}

#[test]
fn graph_validation_forces_serialization() {
    // Two siblings each need a two-step path (A -> intermediate -> B); the intermediate
    // state must never co-occur on both siblings at once.
    let mut ctx = ReconcileContext::new();
    ctx.register_transition(
        "K",
        state(&[("stage", json!("a"))]),
        state(&[("stage", json!("mid"))]),
        noop(),
    )
    .unwrap();
    ctx.register_transition(
        "K",
        state(&[("stage", json!("mid"))]),
        state(&[("stage", json!("b"))]),
        noop(),
    )
    .unwrap();
    ctx.register_graph_validation(
        "g",
        Arc::new(|graph: &StateGraph| {
            let mid_count = graph
                .nodes()
                .filter(|n| n.state().get("stage") == Some(&json!("mid")))
                .count();
            if mid_count > 1 {
                Err(reconcile_core::error::ValidationFailure::new(
                    "at most one sibling may be mid-transition at a time",
                ))
            } else {
                Ok(())
            }
        }),
    );

    let left = Path::new("/left").unwrap();
    let right = Path::new("/right").unwrap();
    let mut current = StateGraph::new("g", "K");
    current
        .add_nodes([
            StateNode::new(left.clone(), Kind::new("K"), state(&[("stage", json!("a"))])),
            StateNode::new(right.clone(), Kind::new("K"), state(&[("stage", json!("a"))])),
        ])
        .unwrap();

    let mut desired = StateGraph::new("g", "K");
    desired
        .add_nodes([
            StateNode::new(left.clone(), Kind::new("K"), state(&[("stage", json!("b"))])),
            StateNode::new(right.clone(), Kind::new("K"), state(&[("stage", json!("b"))])),
        ])
        .unwrap();

    let plan = Planner::new(&ctx).plan(&current, &desired).unwrap();
    assert_eq!(plan.len(), 4);

    // Apply the plan one step at a time, checking the graph validation holds after every
    // intermediate state.
    let executor = Executor::new(&ctx);
    let mut replay = current.clone();
    for step in &plan {
        executor.execute(&mut replay, std::slice::from_ref(step), false);
        assert!(ctx.validations.check_graph(&Kind::new("g"), &replay).is_ok());
    }
    assert!(replay.has_same_state(&desired));
}

#[test]
fn dependency_validation_demo_scenario() {
    let mut ctx = ReconcileContext::new();
    ctx.register_transition(
        "job",
        state(&[("running", json!(true))]),
        state(&[("running", json!(false))]),
        noop(),
    )
    .unwrap();
    ctx.register_transition(
        "job",
        state(&[("running", json!(false))]),
        state(&[("running", json!(true))]),
        noop(),
    )
    .unwrap();
    ctx.register_transition(
        "job",
        state(&[("running", json!(false)), ("region", json!("East"))]),
        state(&[("region", json!("West"))]),
        noop(),
    )
    .unwrap();

    ctx.register_graph_validation(
        "pipeline",
        Arc::new(|graph: &StateGraph| {
            let transform_running = graph
                .node(&Path::new("/transform").unwrap())
                .map(|n| n.state().get("running") == Some(&json!(true)))
                .unwrap_or(false);
            if !transform_running {
                return Ok(());
            }
            for extract in ["/extract/likes", "/extract/comments"] {
                let running = graph
                    .node(&Path::new(extract).unwrap())
                    .map(|n| n.state().get("running") == Some(&json!(true)))
                    .unwrap_or(false);
                if !running {
                    return Err(reconcile_core::error::ValidationFailure::new(
                        "transform may only run while both extracts are running",
                    ));
                }
            }
            Ok(())
        }),
    );

    let likes = Path::new("/extract/likes").unwrap();
    let comments = Path::new("/extract/comments").unwrap();
    let transform = Path::new("/transform").unwrap();

    let mut current = StateGraph::new("pipeline", "job");
    current
        .add_nodes([
            StateNode::new(
                likes.clone(),
                Kind::new("job"),
                state(&[("running", json!(true)), ("region", json!("East"))]),
            ),
            StateNode::new(
                comments.clone(),
                Kind::new("job"),
                state(&[("running", json!(true)), ("region", json!("East"))]),
            ),
            StateNode::new(
                transform.clone(),
                Kind::new("job"),
                state(&[("running", json!(true)), ("region", json!("East"))]),
            ),
        ])
        .unwrap();

    let mut desired = StateGraph::new("pipeline", "job");
    desired
        .add_nodes([
            StateNode::new(
                likes,
                Kind::new("job"),
                state(&[("running", json!(true)), ("region", json!("West"))]),
            ),
            StateNode::new(
                comments,
                Kind::new("job"),
                state(&[("running", json!(true)), ("region", json!("West"))]),
            ),
            StateNode::new(
                transform,
                Kind::new("job"),
                state(&[("running", json!(true)), ("region", json!("West"))]),
            ),
        ])
        .unwrap();

    let plan = Planner::new(&ctx).plan(&current, &desired).unwrap();
    assert!(!plan.is_empty());

    let executor = Executor::new(&ctx);
    let mut replay = current.clone();
    for step in &plan {
        executor.execute(&mut replay, std::slice::from_ref(step), false);
        assert!(ctx.validations.check_graph(&Kind::new("pipeline"), &replay).is_ok());
    }
    assert!(replay.has_same_state(&desired));
}

#[test]
fn unreachable_goal_yields_empty_plan() {
    let ctx = ReconcileContext::new();
    let current = StateGraph::new("g", "K");
    let mut desired = StateGraph::new("g", "K");
    desired.set_root_state(state(&[("never", json!("reachable"))]));

    let plan = Planner::new(&ctx).plan(&current, &desired).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn unbounded_search_space_raises_search_exhausted() {
    // A transition that always applies and always produces a fresh, ever-growing state
    // keeps the frontier non-empty forever, so a low iteration bound must be hit.
    let mut ctx = ReconcileContext::new();
    ctx.register_transition("K", State::new(), state(&[("counter", json!(1))]), noop()).unwrap();
    ctx.register_transition(
        "K",
        state(&[("counter", json!(1))]),
        state(&[("counter", json!(2))]),
        noop(),
    )
    .unwrap();

    let current = StateGraph::new("g", "K");
    let mut desired = StateGraph::new("g", "K");
    desired.set_root_state(state(&[("counter", json!(999))]));

    let planner = Planner::new(&ctx).with_max_iterations(2);
    let err = planner.plan(&current, &desired).unwrap_err();
    assert!(matches!(
        err,
        reconcile_core::error::ReconcileError::SearchExhausted { max_iterations: 2 }
    ));
}
