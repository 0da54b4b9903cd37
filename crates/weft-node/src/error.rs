//! Error types for node registration and execution.

use thiserror::Error;
use weft_config::Category;
use weft_store::{StoreError, StoreKind};

use crate::instance::LifecycleStep;

/// A declaration rejected at registration time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
  #[error("node id must not be empty")]
  EmptyId,

  #[error("node id '{id}' has leading or trailing whitespace")]
  PaddedId { id: String },

  #[error("node '{id}' is already registered")]
  DuplicateId { id: String },

  #[error("node '{id}' has unknown category '{category}'")]
  UnknownCategory { id: String, category: String },

  #[error("node '{id}' declares an empty field name")]
  EmptyField { id: String },

  #[error("node '{id}' declares field '{key}' more than once")]
  DuplicateField { id: String, key: String },

  #[error("node '{id}' declares '{key}' in both init_params and input_fields")]
  OverlappingFields { id: String, key: String },

  #[error("node '{id}' is a {category} node and cannot declare init_params")]
  InitParamsNotAllowed { id: String, category: Category },
}

/// Failure raised by a node while running its lifecycle.
#[derive(Debug, Error)]
pub enum NodeError {
  /// A declared key was absent from its store when the input was resolved.
  #[error("missing {store} key '{key}'")]
  MissingInput { store: StoreKind, key: String },

  /// A resolved input value was not usable by the node.
  #[error("invalid input '{key}': {message}")]
  InvalidInput { key: String, message: String },

  /// The node produced a key outside its declared `output_fields`.
  #[error("output key '{key}' is not declared in output_fields")]
  UndeclaredOutput { key: String },

  /// The store rejected the node's output.
  #[error("store rejected output: {0}")]
  Store(#[from] StoreError),

  /// The execute step exceeded its time limit.
  #[error("execute step timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The node's business logic failed.
  #[error("{message}")]
  Execution { message: String },

  /// The task running the node panicked.
  #[error("node panicked: {message}")]
  Panicked { message: String },
}

impl NodeError {
  pub fn execution(message: impl Into<String>) -> Self {
    NodeError::Execution {
      message: message.into(),
    }
  }
}

/// A [`NodeError`] tagged with the node and lifecycle step it came from.
#[derive(Debug, Error)]
#[error("node '{node_id}' failed during {step}: {source}")]
pub struct NodeExecutionError {
  pub node_id: String,
  pub step: LifecycleStep,
  #[source]
  pub source: NodeError,
}
