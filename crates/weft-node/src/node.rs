use async_trait::async_trait;

use crate::error::NodeError;
use crate::io::{NodeInput, NodeOutput};
use crate::state::NodeState;

/// A processing stage.
///
/// Nodes never touch the stores. The engine resolves a node's declared keys
/// into a [`NodeInput`], runs the hooks in order, and writes the returned
/// [`NodeOutput`] to the Cache or Output store according to the node's
/// category. Only `execute` is required.
#[async_trait]
pub trait Node: Send + 'static {
  /// Adjust the input resolved from the stores (validation, coercion).
  fn resolve_input(&mut self, input: NodeInput) -> Result<NodeInput, NodeError> {
    Ok(input)
  }

  /// Prepare private state before execution.
  fn pre_process(&mut self, _input: &NodeInput, _state: &mut NodeState) -> Result<(), NodeError> {
    Ok(())
  }

  /// Transform the resolved input into output values.
  async fn execute(
    &mut self,
    input: &NodeInput,
    state: &mut NodeState,
  ) -> Result<NodeOutput, NodeError>;

  /// Observe the produced output. The output written to the store is the
  /// one returned by `execute`.
  fn post_process(&mut self, _output: &NodeOutput, _state: &mut NodeState) -> Result<(), NodeError> {
    Ok(())
  }
}

#[async_trait]
impl Node for Box<dyn Node> {
  fn resolve_input(&mut self, input: NodeInput) -> Result<NodeInput, NodeError> {
    (**self).resolve_input(input)
  }

  fn pre_process(&mut self, input: &NodeInput, state: &mut NodeState) -> Result<(), NodeError> {
    (**self).pre_process(input, state)
  }

  async fn execute(
    &mut self,
    input: &NodeInput,
    state: &mut NodeState,
  ) -> Result<NodeOutput, NodeError> {
    (**self).execute(input, state).await
  }

  fn post_process(&mut self, output: &NodeOutput, state: &mut NodeState) -> Result<(), NodeError> {
    (**self).post_process(output, state)
  }
}
