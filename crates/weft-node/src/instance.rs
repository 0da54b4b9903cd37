//! Runtime wrapper that drives a node through its lifecycle.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use weft_config::NodeConfig;
use weft_store::{ExecutionContext, StoreKind};

use crate::error::{NodeError, NodeExecutionError};
use crate::io::NodeInput;
use crate::node::Node;
use crate::state::NodeState;

/// Lifecycle state of a node invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodePhase {
  Created,
  InputResolved,
  PreProcessed,
  Executed,
  PostProcessed,
  Completed,
  Failed,
}

/// The lifecycle step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStep {
  ResolveInput,
  PreProcess,
  Execute,
  PostProcess,
  WriteOutput,
}

impl fmt::Display for LifecycleStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      LifecycleStep::ResolveInput => "resolve_input",
      LifecycleStep::PreProcess => "pre_process",
      LifecycleStep::Execute => "execute",
      LifecycleStep::PostProcess => "post_process",
      LifecycleStep::WriteOutput => "write_output",
    };
    f.write_str(name)
  }
}

/// A node bound to its declaration, with private state.
///
/// One instance exists per declaration per graph build. The private state
/// survives between invocations of the same instance but never leaves it.
pub struct NodeInstance {
  config: Arc<NodeConfig>,
  node: Box<dyn Node>,
  state: NodeState,
  phase: NodePhase,
}

impl NodeInstance {
  pub fn new(config: Arc<NodeConfig>, node: Box<dyn Node>) -> Self {
    Self {
      config,
      node,
      state: NodeState::default(),
      phase: NodePhase::Created,
    }
  }

  pub fn id(&self) -> &str {
    &self.config.id
  }

  pub fn config(&self) -> &NodeConfig {
    &self.config
  }

  pub fn phase(&self) -> NodePhase {
    self.phase
  }

  /// Store this node's outputs are written to.
  pub fn output_store(&self) -> StoreKind {
    if self.config.category.writes_output_store() {
      StoreKind::Output
    } else {
      StoreKind::Cache
    }
  }

  /// Read the declared keys from the stores.
  ///
  /// `init_params` come from the Input store, `input_fields` from the Cache
  /// store. An absent key fails with [`NodeError::MissingInput`].
  pub fn resolve_input(&self, ctx: &ExecutionContext) -> Result<NodeInput, NodeError> {
    let sources = self
      .config
      .init_params
      .iter()
      .map(|key| (StoreKind::Input, key))
      .chain(
        self
          .config
          .input_fields
          .iter()
          .map(|key| (StoreKind::Cache, key)),
      );

    let mut input = NodeInput::new();
    for (store, key) in sources {
      let value = ctx.get(store, key).ok_or_else(|| NodeError::MissingInput {
        store,
        key: key.clone(),
      })?;
      input.insert(key.clone(), value);
    }
    Ok(input)
  }

  /// Run one invocation: resolve, pre-process, execute, post-process, write.
  ///
  /// On failure nothing from this invocation is written and the instance
  /// ends in [`NodePhase::Failed`]. Returns the keys written on success.
  #[instrument(
    name = "node_run",
    skip(self, ctx),
    fields(
      execution_id = %ctx.execution_id(),
      node_id = %self.config.id,
    )
  )]
  pub async fn run(&mut self, ctx: &ExecutionContext) -> Result<Vec<String>, NodeExecutionError> {
    self.phase = NodePhase::Created;
    let result = self.run_inner(ctx).await;
    if result.is_err() {
      self.phase = NodePhase::Failed;
    }
    result
  }

  async fn run_inner(&mut self, ctx: &ExecutionContext) -> Result<Vec<String>, NodeExecutionError> {
    let resolved = self
      .resolve_input(ctx)
      .and_then(|input| self.node.resolve_input(input))
      .map_err(|e| self.fail(LifecycleStep::ResolveInput, e))?;
    self.phase = NodePhase::InputResolved;

    self
      .node
      .pre_process(&resolved, &mut self.state)
      .map_err(|e| self.fail(LifecycleStep::PreProcess, e))?;
    self.phase = NodePhase::PreProcessed;

    let output = self
      .node
      .execute(&resolved, &mut self.state)
      .await
      .map_err(|e| self.fail(LifecycleStep::Execute, e))?;
    if let Some(key) = output.keys().find(|key| !self.config.declares_output(key)) {
      let key = key.to_string();
      return Err(self.fail(LifecycleStep::Execute, NodeError::UndeclaredOutput { key }));
    }
    self.phase = NodePhase::Executed;

    self
      .node
      .post_process(&output, &mut self.state)
      .map_err(|e| self.fail(LifecycleStep::PostProcess, e))?;
    self.phase = NodePhase::PostProcessed;

    let store = self.output_store();
    let entries = output.into_entries();
    let keys: Vec<String> = entries.iter().map(|(k, _)| k.clone()).collect();
    ctx
      .write(store, entries)
      .map_err(|e| self.fail(LifecycleStep::WriteOutput, e.into()))?;
    self.phase = NodePhase::Completed;

    debug!(store = %store, keys = ?keys, "node outputs written");
    Ok(keys)
  }

  fn fail(&self, step: LifecycleStep, source: NodeError) -> NodeExecutionError {
    NodeExecutionError {
      node_id: self.config.id.clone(),
      step,
      source,
    }
  }
}

impl fmt::Debug for NodeInstance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NodeInstance")
      .field("id", &self.config.id)
      .field("category", &self.config.category)
      .field("phase", &self.phase)
      .finish_non_exhaustive()
  }
}
