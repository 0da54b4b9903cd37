//! Pipeline execution engine.
//!
//! The `Engine` owns a registry of node declarations, builds the dependency
//! graph for every execution and schedules nodes in parallel once their
//! producers have completed.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use weft_graph::WorkflowGraph;
use weft_node::NodeRegistry;
use weft_store::{ExecutionContext, StoreMap};

use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::ExecutionResult;
use crate::scheduler::Scheduler;

/// Configuration for the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
  /// Upper bound on nodes running at the same time. `None` runs every ready
  /// node at once; `Some(0)` is treated as `Some(1)`.
  #[serde(default)]
  pub max_concurrency: Option<usize>,
}

/// The pipeline execution engine.
///
/// The registry is shared, so one engine can serve concurrent executions;
/// each execution gets fresh node instances and a fresh context.
pub struct Engine {
  registry: Arc<NodeRegistry>,
  config: EngineConfig,
  notifier: Arc<dyn ExecutionNotifier>,
}

impl Engine {
  /// Create an engine that discards events.
  pub fn new(registry: NodeRegistry, config: EngineConfig) -> Self {
    Self {
      registry: Arc::new(registry),
      config,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Replace the notifier events are sent to.
  pub fn with_notifier<N: ExecutionNotifier + 'static>(mut self, notifier: N) -> Self {
    self.notifier = Arc::new(notifier);
    self
  }

  /// Build the dependency graph without running anything.
  pub fn validate(&self) -> Result<WorkflowGraph, EngineError> {
    Ok(WorkflowGraph::build(self.registry.configs().cloned())?)
  }

  /// Run every registered node once against `input_data`.
  pub async fn execute(&self, input_data: Value) -> Result<ExecutionResult, EngineError> {
    self
      .execute_with_cancel(input_data, CancellationToken::new())
      .await
  }

  /// Like [`execute`](Self::execute), stopping between batches once `cancel`
  /// fires. Nodes already running finish; the rest are skipped.
  #[instrument(name = "execute", skip_all, fields(execution_id = tracing::field::Empty))]
  pub async fn execute_with_cancel(
    &self,
    input_data: Value,
    cancel: CancellationToken,
  ) -> Result<ExecutionResult, EngineError> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    tracing::Span::current().record("execution_id", execution_id.as_str());

    let prepared = into_object(input_data)
      .and_then(|input| Ok((input, self.validate()?)));
    let (input, graph) = match prepared {
      Ok(prepared) => prepared,
      Err(e) => {
        error!(error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id,
          error: e.to_string(),
        });
        return Err(e);
      }
    };

    warn_on_shadowed_input(&graph, &input);

    info!(nodes = graph.len(), "workflow_started");
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      nodes: graph.len(),
    });

    let ctx = Arc::new(ExecutionContext::new(execution_id.clone(), input));
    let report = Scheduler::new(
      &graph,
      ctx.clone(),
      self.notifier.as_ref(),
      self.config.max_concurrency,
      self.registry.instantiate(),
    )
    .run(&cancel)
    .await;

    // Every task has been joined, so this is normally the last reference.
    let output_data = match Arc::try_unwrap(ctx) {
      Ok(ctx) => ctx.into_output(),
      Err(ctx) => ctx.snapshot(weft_store::StoreKind::Output),
    };

    let nodes = graph.nodes();
    let statuses: BTreeMap<String, _> = nodes
      .iter()
      .zip(&report.statuses)
      .map(|(config, status)| (config.id.clone(), *status))
      .collect();
    let execution_order = report
      .execution_order
      .iter()
      .map(|&i| nodes[i].id.clone())
      .collect();

    info!(
      failures = report.failures.len(),
      outputs = output_data.len(),
      "workflow_completed"
    );
    self.notifier.notify(ExecutionEvent::WorkflowCompleted {
      execution_id: execution_id.clone(),
      failures: report.failures.len(),
    });

    Ok(ExecutionResult {
      execution_id,
      output_data,
      failures: report.failures,
      execution_order,
      statuses,
    })
  }
}

impl std::fmt::Debug for Engine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Engine")
      .field("registry", &self.registry)
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

fn into_object(input_data: Value) -> Result<StoreMap, EngineError> {
  let found = match input_data {
    Value::Object(map) => return Ok(map),
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
  };
  Err(EngineError::InvalidInput { found })
}

/// Intermediate keys live in the Cache store, so a node output named like an
/// input key never replaces it. Worth a warning since it is usually a typo.
fn warn_on_shadowed_input(graph: &WorkflowGraph, input: &StoreMap) {
  for config in graph.nodes() {
    if config.category.writes_output_store() {
      continue;
    }
    for key in config.output_fields.iter().filter(|k| input.contains_key(*k)) {
      warn!(node_id = %config.id, key = %key, "output key shadows an input key");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_into_object_rejects_non_objects() {
    assert!(into_object(json!({"a": 1})).is_ok());

    let err = into_object(json!([1, 2])).unwrap_err();
    assert_eq!(err.to_string(), "input data must be a JSON object, got an array");

    assert!(matches!(
      into_object(Value::Null),
      Err(EngineError::InvalidInput { found: "null" })
    ));
  }

  #[test]
  fn test_engine_config_defaults_to_unbounded() {
    let config: EngineConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.max_concurrency, None);
  }

  #[tokio::test]
  async fn test_empty_registry_runs_nothing() {
    let engine = Engine::new(NodeRegistry::new(), EngineConfig::default());
    let result = engine.execute(json!({"x": 1})).await.unwrap();

    assert!(result.is_success());
    assert!(result.output_data.is_empty());
    assert!(result.execution_order.is_empty());
    assert!(!result.execution_id.is_empty());
  }
}
