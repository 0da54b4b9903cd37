//! Pipeline files of built-in operations.

use std::path::Path;
use std::time::Duration;

use tracing::debug;
use weft_config::{ConfigError, NodeDef, PipelineDef};
use weft_node::{Node, NodeConstructor, NodeRegistry, RegistrationError, WithRetry, WithTimeout};

use crate::node::OperationNode;
use crate::operation::Operation;

/// A pipeline definition whose nodes run built-in operations.
pub type Pipeline = PipelineDef<Operation>;

/// Read a pipeline definition from a JSON file.
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<Pipeline, ConfigError> {
  let pipeline = Pipeline::from_path(path)?;
  debug!(
    pipeline = %pipeline.name,
    nodes = pipeline.nodes.len(),
    "pipeline loaded"
  );
  Ok(pipeline)
}

/// Register every node of `pipeline`, in declaration order.
///
/// `timeout_ms` wraps the node in [`WithTimeout`]; `max_retry_attempts`
/// wraps the result in [`WithRetry`], so each attempt gets the full timeout.
pub fn build_registry(pipeline: &Pipeline) -> Result<NodeRegistry, RegistrationError> {
  let mut registry = NodeRegistry::new();
  for def in &pipeline.nodes {
    registry.register_boxed(def.config.clone(), constructor(def))?;
  }
  Ok(registry)
}

fn constructor(def: &NodeDef<Operation>) -> NodeConstructor {
  let operation = def.operation.clone();
  let config = def.config.clone();
  let timeout = def.timeout_ms.map(Duration::from_millis);
  let attempts = def.max_retry_attempts;

  Box::new(move || {
    let node = OperationNode::new(operation.clone(), &config);
    let node: Box<dyn Node> = match timeout {
      Some(timeout) => Box::new(WithTimeout::new(node, timeout)),
      None => Box::new(node),
    };
    match attempts {
      Some(attempts) => Box::new(WithRetry::new(node, attempts)),
      None => node,
    }
  })
}
