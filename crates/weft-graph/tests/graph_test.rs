//! Graph construction and validation.

use std::sync::Arc;

use weft_config::NodeConfig;
use weft_graph::{GraphError, WorkflowGraph};

fn build(configs: Vec<NodeConfig>) -> Result<WorkflowGraph, GraphError> {
  WorkflowGraph::build(configs.into_iter().map(Arc::new))
}

/// entry -> upper -> exit
fn linear() -> Vec<NodeConfig> {
  vec![
    NodeConfig::entry("entry")
      .with_init_params(["msg"])
      .with_output_fields(["raw"]),
    NodeConfig::middle("upper")
      .with_input_fields(["raw"])
      .with_output_fields(["clean"]),
    NodeConfig::exit("exit")
      .with_input_fields(["clean"])
      .with_output_fields(["final"]),
  ]
}

#[test]
fn test_edges_inferred_from_field_names() {
  let graph = build(linear()).unwrap();

  assert_eq!(graph.len(), 3);
  assert_eq!(graph.edges(), vec![("entry", "upper"), ("upper", "exit")]);
  assert_eq!(graph.upstream("exit"), vec!["upper"]);
  assert_eq!(graph.downstream("entry"), vec!["upper"]);
  assert_eq!(graph.entry_points(), vec!["entry"]);
  assert_eq!(graph.producer_of("raw"), Some("entry"));
  assert_eq!(graph.producer_of("final"), None);
}

#[test]
fn test_execution_order_follows_dependencies_not_declaration() {
  let mut configs = linear();
  configs.reverse();
  let graph = build(configs).unwrap();

  assert_eq!(graph.execution_order(), vec!["entry", "upper", "exit"]);
}

#[test]
fn test_independent_nodes_ordered_by_declaration() {
  let graph = build(vec![
    NodeConfig::entry("zeta").with_output_fields(["z"]),
    NodeConfig::entry("alpha").with_output_fields(["a"]),
    NodeConfig::exit("join")
      .with_input_fields(["a", "z"])
      .with_output_fields(["joined"]),
    NodeConfig::exit("solo").with_output_fields(["s"]),
  ])
  .unwrap();

  assert_eq!(graph.execution_order(), vec!["zeta", "alpha", "join", "solo"]);
  assert_eq!(graph.upstream("join"), vec!["zeta", "alpha"]);
}

#[test]
fn test_order_is_stable_across_builds() {
  let first = build(linear()).unwrap();
  let second = build(linear()).unwrap();
  assert_eq!(first.execution_order(), second.execution_order());
}

#[test]
fn test_missing_producer() {
  let err = build(vec![
    NodeConfig::entry("entry")
      .with_init_params(["a"])
      .with_output_fields(["x"]),
    NodeConfig::exit("exit")
      .with_input_fields(["b"])
      .with_output_fields(["y"]),
  ])
  .unwrap_err();

  assert_eq!(
    err,
    GraphError::MissingProducer {
      node_id: "exit".to_string(),
      key: "b".to_string(),
    }
  );
}

#[test]
fn test_exit_output_does_not_satisfy_input_fields() {
  let err = build(vec![
    NodeConfig::exit("report").with_output_fields(["summary"]),
    NodeConfig::exit("audit")
      .with_input_fields(["summary"])
      .with_output_fields(["audit"]),
  ])
  .unwrap_err();

  assert!(matches!(
    err,
    GraphError::MissingProducer { ref node_id, ref key } if node_id == "audit" && key == "summary"
  ));
}

#[test]
fn test_two_node_cycle() {
  let err = build(vec![
    NodeConfig::middle("a")
      .with_input_fields(["y"])
      .with_output_fields(["x"]),
    NodeConfig::middle("b")
      .with_input_fields(["x"])
      .with_output_fields(["y"]),
  ])
  .unwrap_err();

  assert_eq!(
    err,
    GraphError::Cycle {
      path: vec!["a".to_string(), "b".to_string(), "a".to_string()]
    }
  );
  assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
}

#[test]
fn test_cycle_behind_valid_prefix() {
  let err = build(vec![
    NodeConfig::entry("entry").with_output_fields(["seed"]),
    NodeConfig::middle("left")
      .with_input_fields(["seed", "from_right"])
      .with_output_fields(["from_left"]),
    NodeConfig::middle("right")
      .with_input_fields(["from_left"])
      .with_output_fields(["from_right"]),
    NodeConfig::exit("exit")
      .with_input_fields(["from_right"])
      .with_output_fields(["done"]),
  ])
  .unwrap_err();

  assert_eq!(
    err,
    GraphError::Cycle {
      path: vec!["left".to_string(), "right".to_string(), "left".to_string()]
    }
  );
}

#[test]
fn test_overlapping_outputs_rejected() {
  let err = build(vec![
    NodeConfig::entry("first").with_output_fields(["shared"]),
    NodeConfig::middle("second").with_output_fields(["other", "shared"]),
  ])
  .unwrap_err();

  assert_eq!(
    err,
    GraphError::DuplicateOutput {
      key: "shared".to_string(),
      first: "first".to_string(),
      second: "second".to_string(),
    }
  );
}

#[test]
fn test_descendants() {
  let graph = build(vec![
    NodeConfig::entry("entry").with_output_fields(["raw"]),
    NodeConfig::middle("process")
      .with_input_fields(["raw"])
      .with_output_fields(["processed"]),
    NodeConfig::exit("exit_a")
      .with_input_fields(["processed"])
      .with_output_fields(["a"]),
    NodeConfig::exit("exit_b")
      .with_input_fields(["raw"])
      .with_output_fields(["b"]),
  ])
  .unwrap();

  assert_eq!(graph.descendants("process"), vec!["exit_a"]);
  assert_eq!(graph.descendants("entry"), vec!["process", "exit_a", "exit_b"]);
  assert!(graph.descendants("exit_b").is_empty());
  assert!(graph.descendants("unknown").is_empty());
}

#[test]
fn test_empty_graph() {
  let graph = build(Vec::new()).unwrap();
  assert!(graph.is_empty());
  assert!(graph.execution_order().is_empty());
}
