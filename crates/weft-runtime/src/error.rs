//! Runtime error types.

use weft_graph::GraphError;

/// Errors that prevent an execution from starting.
///
/// Once nodes start running, failures are isolated per node and reported in
/// the [`ExecutionResult`](crate::ExecutionResult) instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The declarations do not form a runnable graph.
  #[error("invalid workflow graph: {0}")]
  Graph(#[from] GraphError),

  /// The input payload is not a JSON object.
  #[error("input data must be a JSON object, got {found}")]
  InvalidInput { found: &'static str },
}
