use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::node::NodeDef;

/// A pipeline definition: a named, ordered list of node declarations.
///
/// The order of `nodes` is the declaration order used to break ties in the
/// execution schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef<Op> {
  pub name: String,
  pub nodes: Vec<NodeDef<Op>>,
}

impl<Op: DeserializeOwned> PipelineDef<Op> {
  /// Parse a pipeline definition from JSON text.
  pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Read and parse a pipeline definition from a JSON file.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&content)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;
  use crate::Category;

  const PIPELINE: &str = r#"{
    "name": "shout",
    "nodes": [
      {
        "id": "entry",
        "category": "entry",
        "init_params": ["msg"],
        "output_fields": ["raw"],
        "operation": "passthrough"
      },
      {
        "id": "exit",
        "category": "exit",
        "input_fields": ["raw"],
        "output_fields": ["final"],
        "operation": "uppercase"
      }
    ]
  }"#;

  #[test]
  fn test_from_json_str() {
    let pipeline: PipelineDef<String> = PipelineDef::from_json_str(PIPELINE).unwrap();

    assert_eq!(pipeline.name, "shout");
    assert_eq!(pipeline.nodes.len(), 2);
    assert_eq!(pipeline.nodes[0].config.category, Category::Entry);
    assert_eq!(pipeline.nodes[1].operation, "uppercase");
  }

  #[test]
  fn test_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PIPELINE.as_bytes()).unwrap();

    let pipeline: PipelineDef<String> = PipelineDef::from_path(file.path()).unwrap();
    assert_eq!(pipeline.nodes[1].config.id, "exit");
  }

  #[test]
  fn test_from_path_missing_file() {
    let err = PipelineDef::<String>::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
  }

  #[test]
  fn test_unknown_category_rejected() {
    let content = r#"{
      "name": "bad",
      "nodes": [{ "id": "a", "category": "source", "output_fields": [], "operation": "x" }]
    }"#;
    let err = PipelineDef::<String>::from_json_str(content).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
  }
}
