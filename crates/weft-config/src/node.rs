use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Declaration of a single node: identity, category and field contract.
///
/// Field lists keep their declaration order. The registry rejects duplicate
/// entries and overlaps between `init_params` and `input_fields`, and the
/// declaration is frozen once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
  pub id: String,
  pub category: Category,
  /// Keys read from the Input store.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub init_params: Vec<String>,
  /// Keys read from the Cache store.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub input_fields: Vec<String>,
  /// Keys this node may write.
  #[serde(default)]
  pub output_fields: Vec<String>,
}

impl NodeConfig {
  pub fn new(id: impl Into<String>, category: Category) -> Self {
    Self {
      id: id.into(),
      category,
      init_params: Vec::new(),
      input_fields: Vec::new(),
      output_fields: Vec::new(),
    }
  }

  pub fn entry(id: impl Into<String>) -> Self {
    Self::new(id, Category::Entry)
  }

  pub fn middle(id: impl Into<String>) -> Self {
    Self::new(id, Category::Middle)
  }

  pub fn exit(id: impl Into<String>) -> Self {
    Self::new(id, Category::Exit)
  }

  pub fn with_init_params<I, S>(mut self, keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.init_params = keys.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_input_fields<I, S>(mut self, keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.input_fields = keys.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_output_fields<I, S>(mut self, keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.output_fields = keys.into_iter().map(Into::into).collect();
    self
  }

  /// Check whether `key` is one of the declared output fields.
  pub fn declares_output(&self, key: &str) -> bool {
    self.output_fields.iter().any(|k| k == key)
  }

  /// All keys this node reads, `init_params` first, then `input_fields`.
  pub fn read_keys(&self) -> impl Iterator<Item = &str> {
    self
      .init_params
      .iter()
      .chain(self.input_fields.iter())
      .map(String::as_str)
  }
}

/// A node declaration as it appears in a pipeline file.
///
/// `Op` is the operation payload chosen by the caller (for example the
/// built-in operations of `weft-nodes`). Timeout and retry settings are
/// applied by whoever constructs the node, never by the engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef<Op> {
  #[serde(flatten)]
  pub config: NodeConfig,
  pub operation: Op,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_retry_attempts: Option<u32>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_builder_keeps_declaration_order() {
    let config = NodeConfig::middle("join")
      .with_input_fields(["b", "a"])
      .with_output_fields(["out"]);

    assert_eq!(config.category, Category::Middle);
    assert_eq!(config.input_fields, vec!["b", "a"]);
    assert!(config.declares_output("out"));
    assert!(!config.declares_output("a"));
  }

  #[test]
  fn test_read_keys_lists_init_params_first() {
    let config = NodeConfig::entry("start")
      .with_init_params(["msg"])
      .with_input_fields(["seed"]);

    let keys: Vec<&str> = config.read_keys().collect();
    assert_eq!(keys, vec!["msg", "seed"]);
  }

  #[test]
  fn test_node_def_deserialize() {
    let def: NodeDef<serde_json::Value> = serde_json::from_value(json!({
      "id": "upper",
      "category": "middle",
      "input_fields": ["raw"],
      "output_fields": ["clean"],
      "operation": { "kind": "uppercase" },
      "timeout_ms": 500
    }))
    .unwrap();

    assert_eq!(def.config.id, "upper");
    assert_eq!(def.config.category, Category::Middle);
    assert!(def.config.init_params.is_empty());
    assert_eq!(def.config.output_fields, vec!["clean"]);
    assert_eq!(def.operation["kind"], "uppercase");
    assert_eq!(def.timeout_ms, Some(500));
    assert_eq!(def.max_retry_attempts, None);
  }
}
