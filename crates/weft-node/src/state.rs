use std::collections::HashMap;

use weft_store::Value;

/// Private per-instance state.
///
/// Only the owning node's lifecycle hooks receive a reference to it. The
/// engine, the graph and other nodes have no way to read it, and nothing in
/// it is ever written to a store.
#[derive(Debug, Default)]
pub struct NodeState {
  values: HashMap<String, Value>,
}

impl NodeState {
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
    self.values.insert(key.into(), value)
  }

  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.values.remove(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}
