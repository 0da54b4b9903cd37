//! Scheduling of one execution over a validated graph.
//!
//! Each round picks the nodes whose producers have all completed, in graph
//! order, up to the concurrency limit, and runs them as parallel tasks. Results
//! are applied in the same order they were scheduled, so the outcome of a run
//! does not depend on which task finishes first.

use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use weft_graph::WorkflowGraph;
use weft_node::{LifecycleStep, NodeError, NodeExecutionError, NodeInstance};
use weft_store::ExecutionContext;

use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::result::{NodeFailure, NodeStatus};

/// Handle for a spawned node task.
type NodeHandle = tokio::task::JoinHandle<Result<Vec<String>, NodeExecutionError>>;

enum Slot {
  Pending(NodeInstance),
  Running,
  Done(NodeStatus),
}

/// What the scheduling loop produced, indexed by declaration order.
pub(crate) struct RunReport {
  pub statuses: Vec<NodeStatus>,
  pub failures: Vec<NodeFailure>,
  pub execution_order: Vec<usize>,
}

pub(crate) struct Scheduler<'a> {
  graph: &'a WorkflowGraph,
  ctx: Arc<ExecutionContext>,
  notifier: &'a dyn ExecutionNotifier,
  max_concurrency: usize,
  slots: Vec<Slot>,
  /// For failed and skipped nodes, the failed node that caused it.
  roots: Vec<Option<usize>>,
  failures: Vec<NodeFailure>,
  execution_order: Vec<usize>,
}

impl<'a> Scheduler<'a> {
  /// `instances` must be in the graph's declaration order.
  pub fn new(
    graph: &'a WorkflowGraph,
    ctx: Arc<ExecutionContext>,
    notifier: &'a dyn ExecutionNotifier,
    max_concurrency: Option<usize>,
    instances: Vec<NodeInstance>,
  ) -> Self {
    let len = instances.len();
    Self {
      graph,
      ctx,
      notifier,
      max_concurrency: max_concurrency.unwrap_or(usize::MAX).max(1),
      slots: instances.into_iter().map(Slot::Pending).collect(),
      roots: vec![None; len],
      failures: Vec::new(),
      execution_order: Vec::new(),
    }
  }

  /// Run until every node is in a terminal state.
  pub async fn run(mut self, cancel: &CancellationToken) -> RunReport {
    loop {
      self.skip_dependents_of_failures();

      if cancel.is_cancelled() {
        warn!(execution_id = %self.ctx.execution_id(), "execution cancelled");
        self.skip_pending("execution cancelled");
        break;
      }

      let batch = self.next_batch();
      if batch.is_empty() {
        break;
      }

      info!(
        execution_id = %self.ctx.execution_id(),
        ready_nodes = ?batch.iter().map(|&i| self.node_id(i)).collect::<Vec<_>>(),
        "executing batch of ready nodes"
      );

      self.run_batch(batch).await;
    }

    // Only reachable if a dependency never settled; the graph is acyclic,
    // so this is a no-op in practice.
    self.skip_pending("dependencies did not complete");

    RunReport {
      statuses: self
        .slots
        .iter()
        .map(|slot| match slot {
          Slot::Done(status) => *status,
          Slot::Pending(_) | Slot::Running => NodeStatus::Skipped,
        })
        .collect(),
      failures: self.failures,
      execution_order: self.execution_order,
    }
  }

  fn node_id(&self, index: usize) -> &str {
    &self.graph.nodes()[index].id
  }

  fn is_pending(&self, index: usize) -> bool {
    matches!(self.slots[index], Slot::Pending(_))
  }

  fn status(&self, index: usize) -> Option<NodeStatus> {
    match self.slots[index] {
      Slot::Done(status) => Some(status),
      _ => None,
    }
  }

  /// Ready nodes in graph order, up to the concurrency limit.
  fn next_batch(&self) -> Vec<usize> {
    self
      .graph
      .order()
      .iter()
      .copied()
      .filter(|&i| self.is_pending(i))
      .filter(|&i| {
        self
          .graph
          .upstream_of(i)
          .iter()
          .all(|&up| self.status(up) == Some(NodeStatus::Completed))
      })
      .take(self.max_concurrency)
      .collect()
  }

  /// Mark every pending node downstream of a failure as skipped.
  ///
  /// Walking in topological order settles transitive consumers in one pass.
  fn skip_dependents_of_failures(&mut self) {
    let graph = self.graph;
    for &i in graph.order() {
      if !self.is_pending(i) {
        continue;
      }

      let blocked_by = graph
        .upstream_of(i)
        .iter()
        .copied()
        .find(|&up| matches!(self.status(up), Some(NodeStatus::Failed | NodeStatus::Skipped)));

      if let Some(up) = blocked_by {
        let root = self.roots[up].unwrap_or(up);
        self.roots[i] = Some(root);
        let reason = format!("upstream node '{}' failed", self.node_id(root));
        self.skip(i, reason);
      }
    }
  }

  fn skip_pending(&mut self, reason: &str) {
    let graph = self.graph;
    for &i in graph.order() {
      if self.is_pending(i) {
        self.skip(i, reason.to_string());
      }
    }
  }

  fn skip(&mut self, index: usize, reason: String) {
    self.slots[index] = Slot::Done(NodeStatus::Skipped);
    let node_id = self.node_id(index).to_string();

    warn!(
      execution_id = %self.ctx.execution_id(),
      node_id = %node_id,
      reason = %reason,
      "node_skipped"
    );
    self.notifier.notify(ExecutionEvent::NodeSkipped {
      execution_id: self.ctx.execution_id().to_string(),
      node_id: node_id.clone(),
      reason: reason.clone(),
    });

    self.failures.push(NodeFailure {
      node_id,
      status: NodeStatus::Skipped,
      step: None,
      error: reason,
    });
  }

  async fn run_batch(&mut self, batch: Vec<usize>) {
    let mut spawned: Vec<(usize, NodeHandle)> = Vec::with_capacity(batch.len());

    for index in batch {
      let Slot::Pending(mut instance) = std::mem::replace(&mut self.slots[index], Slot::Running)
      else {
        continue;
      };

      self.execution_order.push(index);
      info!(
        execution_id = %self.ctx.execution_id(),
        node_id = %instance.id(),
        "node_started"
      );
      self.notifier.notify(ExecutionEvent::NodeStarted {
        execution_id: self.ctx.execution_id().to_string(),
        node_id: instance.id().to_string(),
      });

      let ctx = self.ctx.clone();
      spawned.push((
        index,
        tokio::spawn(async move { instance.run(&ctx).await }),
      ));
    }

    let (indices, handles): (Vec<usize>, Vec<NodeHandle>) = spawned.into_iter().unzip();
    let results = join_all(handles).await;

    for (index, joined) in indices.into_iter().zip(results) {
      match joined {
        Ok(Ok(keys)) => self.complete(index, keys),
        Ok(Err(e)) => self.fail(index, Some(e.step), e.source.to_string()),
        Err(e) => {
          let panicked = NodeError::Panicked {
            message: e.to_string(),
          };
          self.fail(index, None, panicked.to_string())
        }
      }
    }
  }

  fn complete(&mut self, index: usize, keys: Vec<String>) {
    self.slots[index] = Slot::Done(NodeStatus::Completed);
    let node_id = self.node_id(index).to_string();

    info!(
      execution_id = %self.ctx.execution_id(),
      node_id = %node_id,
      keys = ?keys,
      "node_completed"
    );
    self.notifier.notify(ExecutionEvent::NodeCompleted {
      execution_id: self.ctx.execution_id().to_string(),
      node_id,
      keys,
    });
  }

  fn fail(&mut self, index: usize, step: Option<LifecycleStep>, error: String) {
    self.slots[index] = Slot::Done(NodeStatus::Failed);
    self.roots[index] = Some(index);
    let node_id = self.node_id(index).to_string();

    error!(
      execution_id = %self.ctx.execution_id(),
      node_id = %node_id,
      step = ?step,
      error = %error,
      "node_failed"
    );
    self.notifier.notify(ExecutionEvent::NodeFailed {
      execution_id: self.ctx.execution_id().to_string(),
      node_id: node_id.clone(),
      error: error.clone(),
    });

    self.failures.push(NodeFailure {
      node_id,
      status: NodeStatus::Failed,
      step,
      error,
    });
  }
}
