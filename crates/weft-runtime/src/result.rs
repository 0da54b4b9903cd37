//! Execution result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use weft_node::LifecycleStep;
use weft_store::StoreMap;

/// Terminal state of a node within one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  Completed,
  Failed,
  /// Never invoked: an upstream node failed or the execution was cancelled.
  Skipped,
}

/// A node that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
  pub node_id: String,
  pub status: NodeStatus,
  /// Lifecycle step that failed; `None` for skipped nodes and panics.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub step: Option<LifecycleStep>,
  pub error: String,
}

/// Result of a complete execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
  /// Unique execution ID.
  pub execution_id: String,
  /// Contents of the Output store at the end of the run.
  pub output_data: StoreMap,
  /// Failed and skipped nodes, in the order they were resolved.
  pub failures: Vec<NodeFailure>,
  /// Ids of the nodes that were invoked, in scheduling order.
  pub execution_order: Vec<String>,
  /// Terminal status of every node.
  pub statuses: BTreeMap<String, NodeStatus>,
}

impl ExecutionResult {
  /// Whether every node completed.
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  pub fn status(&self, node_id: &str) -> Option<NodeStatus> {
    self.statuses.get(node_id).copied()
  }

  pub fn failure(&self, node_id: &str) -> Option<&NodeFailure> {
    self.failures.iter().find(|f| f.node_id == node_id)
  }

  /// Ids of nodes that failed while running.
  pub fn failed(&self) -> Vec<&str> {
    self.ids_with(NodeStatus::Failed)
  }

  /// Ids of nodes that were never invoked.
  pub fn skipped(&self) -> Vec<&str> {
    self.ids_with(NodeStatus::Skipped)
  }

  fn ids_with(&self, status: NodeStatus) -> Vec<&str> {
    self
      .failures
      .iter()
      .filter(|f| f.status == status)
      .map(|f| f.node_id.as_str())
      .collect()
  }
}
