//! Execution events and notifiers for observability.
//!
//! Events are emitted during an execution so consumers can observe progress,
//! stream it to a UI, record metrics, etc. The engine never depends on what a
//! notifier does with them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// The graph was built and nodes are about to be scheduled.
  WorkflowStarted { execution_id: String, nodes: usize },

  /// A node's lifecycle has started.
  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  /// A node completed and its outputs are visible.
  NodeCompleted {
    execution_id: String,
    node_id: String,
    keys: Vec<String>,
  },

  /// A node failed; nothing it produced was written.
  NodeFailed {
    execution_id: String,
    node_id: String,
    error: String,
  },

  /// A node will never run.
  NodeSkipped {
    execution_id: String,
    node_id: String,
    reason: String,
  },

  /// Every node reached a terminal state.
  WorkflowCompleted {
    execution_id: String,
    failures: usize,
  },

  /// The execution could not start.
  WorkflowFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event. Implementations decide what to
/// do with them (persist, broadcast, log, ignore, etc.).
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Event volume is a handful per node, so the channel is unbounded to keep
/// a slow consumer from stalling the scheduler.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with the receiving end of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
