//! Per-execution ownership of the Input, Cache and Output stores.

use tracing::debug;

use crate::error::StoreError;
use crate::store::{Store, StoreKind};
use crate::{StoreMap, Value};

/// Owns the three stores for a single execution.
///
/// The Input store is seeded in [`ExecutionContext::new`] and sealed from
/// then on; Cache and Output accept batch writes through [`ExecutionContext::write`].
/// A context is never reused across executions.
#[derive(Debug)]
pub struct ExecutionContext {
  execution_id: String,
  input: Store,
  cache: Store,
  output: Store,
}

impl ExecutionContext {
  /// Create a context and seed its Input store.
  pub fn new(execution_id: impl Into<String>, input_data: StoreMap) -> Self {
    Self {
      execution_id: execution_id.into(),
      input: Store::seeded(StoreKind::Input, input_data),
      cache: Store::new(StoreKind::Cache),
      output: Store::new(StoreKind::Output),
    }
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn store(&self, kind: StoreKind) -> &Store {
    match kind {
      StoreKind::Input => &self.input,
      StoreKind::Cache => &self.cache,
      StoreKind::Output => &self.output,
    }
  }

  pub fn get(&self, kind: StoreKind, key: &str) -> Option<Value> {
    self.store(kind).get(key)
  }

  /// Write a single entry. See [`ExecutionContext::write`].
  pub fn set(&self, kind: StoreKind, key: impl Into<String>, value: Value) -> Result<(), StoreError> {
    self.write(kind, vec![(key.into(), value)])
  }

  /// Write a batch of entries atomically.
  ///
  /// Writes to the Input store are always rejected. Writing a key that is
  /// already present in the target store is rejected and nothing is written.
  pub fn write(&self, kind: StoreKind, batch: Vec<(String, Value)>) -> Result<(), StoreError> {
    if kind == StoreKind::Input {
      let key = batch.into_iter().next().map(|(k, _)| k).unwrap_or_default();
      return Err(StoreError::InputSealed { key });
    }

    debug!(
      execution_id = %self.execution_id,
      store = %kind,
      keys = ?batch.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
      "store_write"
    );

    self.store(kind).insert_all(batch)
  }

  pub fn snapshot(&self, kind: StoreKind) -> StoreMap {
    self.store(kind).snapshot()
  }

  /// Consume the context and return the contents of the Output store.
  pub fn into_output(self) -> StoreMap {
    self.output.into_map()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn payload(value: Value) -> StoreMap {
    value.as_object().cloned().unwrap()
  }

  #[test]
  fn test_input_is_seeded() {
    let ctx = ExecutionContext::new("exec-1", payload(json!({ "msg": "hi" })));

    assert_eq!(ctx.execution_id(), "exec-1");
    assert_eq!(ctx.get(StoreKind::Input, "msg"), Some(json!("hi")));
    assert_eq!(ctx.get(StoreKind::Cache, "msg"), None);
    assert!(ctx.snapshot(StoreKind::Output).is_empty());
  }

  #[test]
  fn test_input_is_sealed() {
    let ctx = ExecutionContext::new("exec-1", payload(json!({})));

    let err = ctx.set(StoreKind::Input, "msg", json!("late")).unwrap_err();
    assert_eq!(
      err,
      StoreError::InputSealed {
        key: "msg".to_string()
      }
    );
    assert!(ctx.store(StoreKind::Input).is_empty());
  }

  #[test]
  fn test_stores_are_independent() {
    let ctx = ExecutionContext::new("exec-1", payload(json!({ "k": 1 })));
    ctx.set(StoreKind::Cache, "k", json!(2)).unwrap();
    ctx.set(StoreKind::Output, "k", json!(3)).unwrap();

    assert_eq!(ctx.get(StoreKind::Input, "k"), Some(json!(1)));
    assert_eq!(ctx.get(StoreKind::Cache, "k"), Some(json!(2)));
    assert_eq!(ctx.get(StoreKind::Output, "k"), Some(json!(3)));
  }

  #[test]
  fn test_second_write_to_same_key_rejected() {
    let ctx = ExecutionContext::new("exec-1", payload(json!({})));
    ctx.set(StoreKind::Cache, "raw", json!("a")).unwrap();

    let err = ctx.set(StoreKind::Cache, "raw", json!("b")).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyWritten { store: StoreKind::Cache, .. }));
    assert_eq!(ctx.get(StoreKind::Cache, "raw"), Some(json!("a")));
  }

  #[test]
  fn test_into_output() {
    let ctx = ExecutionContext::new("exec-1", payload(json!({ "msg": "hi" })));
    ctx.set(StoreKind::Cache, "raw", json!("hi")).unwrap();
    ctx
      .write(
        StoreKind::Output,
        vec![("final".to_string(), json!("HI"))],
      )
      .unwrap();

    assert_eq!(ctx.into_output(), payload(json!({ "final": "HI" })));
  }

  #[test]
  fn test_concurrent_reads_and_writes() {
    use std::sync::Arc;

    let ctx = Arc::new(ExecutionContext::new("exec-1", payload(json!({}))));
    let handles: Vec<_> = (0..8)
      .map(|i| {
        let ctx = ctx.clone();
        std::thread::spawn(move || {
          ctx.set(StoreKind::Cache, format!("key_{}", i), json!(i)).unwrap();
          ctx.get(StoreKind::Cache, &format!("key_{}", i))
        })
      })
      .collect();

    for (i, handle) in handles.into_iter().enumerate() {
      assert_eq!(handle.join().unwrap(), Some(json!(i)));
    }
    assert_eq!(ctx.store(StoreKind::Cache).len(), 8);
  }
}
