//! Transient per-invocation input and output structures.

use weft_store::{StoreMap, Value};

use crate::error::NodeError;

/// Values resolved for one invocation, in declaration order
/// (`init_params` first, then `input_fields`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInput {
  entries: Vec<(String, Value)>,
}

impl NodeInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a value, replacing any earlier value for the same key in place.
  pub fn insert(&mut self, key: impl Into<String>, value: Value) {
    let key = key.into();
    match self.entries.iter_mut().find(|(k, _)| *k == key) {
      Some(entry) => entry.1 = value,
      None => self.entries.push((key, value)),
    }
  }

  pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
    self.insert(key, value);
    self
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  /// Get a value, failing with [`NodeError::InvalidInput`] when it is absent.
  pub fn require(&self, key: &str) -> Result<&Value, NodeError> {
    self.get(key).ok_or_else(|| NodeError::InvalidInput {
      key: key.to_string(),
      message: "value not present in resolved input".to_string(),
    })
  }

  /// Get a string value, failing when it is absent or not a string.
  pub fn require_str(&self, key: &str) -> Result<&str, NodeError> {
    self
      .require(key)?
      .as_str()
      .ok_or_else(|| NodeError::InvalidInput {
        key: key.to_string(),
        message: "expected a string".to_string(),
      })
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn values(&self) -> impl Iterator<Item = &Value> {
    self.entries.iter().map(|(_, v)| v)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn to_map(&self) -> StoreMap {
    self.entries.iter().cloned().collect()
  }
}

/// Values produced by one invocation, keyed by output field.
///
/// A node may produce any subset of its declared `output_fields`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOutput {
  entries: Vec<(String, Value)>,
}

impl NodeOutput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set a value, replacing any earlier value for the same key in place.
  pub fn insert(&mut self, key: impl Into<String>, value: Value) {
    let key = key.into();
    match self.entries.iter_mut().find(|(k, _)| *k == key) {
      Some(entry) => entry.1 = value,
      None => self.entries.push((key, value)),
    }
  }

  pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
    self.insert(key, value);
    self
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub(crate) fn into_entries(self) -> Vec<(String, Value)> {
    self.entries
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_input_preserves_order_and_replaces() {
    let mut input = NodeInput::new().with("b", json!(1)).with("a", json!(2));
    input.insert("b", json!(3));

    let keys: Vec<&str> = input.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["b", "a"]);
    assert_eq!(input.get("b"), Some(&json!(3)));
    assert_eq!(input.len(), 2);
  }

  #[test]
  fn test_require_str() {
    let input = NodeInput::new().with("msg", json!("hi")).with("n", json!(4));

    assert_eq!(input.require_str("msg").unwrap(), "hi");
    assert!(matches!(
      input.require_str("n"),
      Err(NodeError::InvalidInput { ref key, .. }) if key == "n"
    ));
    assert!(input.require("missing").is_err());
  }

  #[test]
  fn test_output_keys() {
    let output = NodeOutput::new()
      .with("clean", json!("HI"))
      .with("len", json!(2));

    assert_eq!(output.keys().collect::<Vec<_>>(), vec!["clean", "len"]);
    assert_eq!(output.get("len"), Some(&json!(2)));
  }
}
