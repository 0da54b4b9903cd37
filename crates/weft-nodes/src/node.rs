use async_trait::async_trait;
use minijinja::Environment;
use weft_config::NodeConfig;
use weft_node::{Node, NodeError, NodeInput, NodeOutput, NodeState};

use crate::operation::Operation;

/// A node whose execute step is a built-in [`Operation`].
pub struct OperationNode {
  operation: Operation,
  outputs: Vec<String>,
  env: Environment<'static>,
}

impl OperationNode {
  /// Bind `operation` to the output fields declared by `config`.
  pub fn new(operation: Operation, config: &NodeConfig) -> Self {
    Self {
      operation,
      outputs: config.output_fields.clone(),
      env: Environment::new(),
    }
  }
}

#[async_trait]
impl Node for OperationNode {
  async fn execute(
    &mut self,
    input: &NodeInput,
    _state: &mut NodeState,
  ) -> Result<NodeOutput, NodeError> {
    self.operation.apply(&self.env, input, &self.outputs)
  }
}
