use thiserror::Error;

/// Reasons a set of declarations cannot form a runnable graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
  #[error("node '{id}' is declared more than once")]
  DuplicateNode { id: String },

  #[error("output key '{key}' is declared by both '{first}' and '{second}'")]
  DuplicateOutput {
    key: String,
    first: String,
    second: String,
  },

  #[error("node '{node_id}' reads '{key}' but no entry or middle node produces it")]
  MissingProducer { node_id: String, key: String },

  #[error("dependency cycle detected: {}", .path.join(" -> "))]
  Cycle { path: Vec<String> },
}
