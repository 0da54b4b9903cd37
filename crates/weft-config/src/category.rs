use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Role of a node in the pipeline.
///
/// The category decides where a node's outputs are written: entry and middle
/// nodes write to the Cache store, exit nodes write to the Output store.
/// Only entry nodes may read from the Input store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Entry,
  Middle,
  Exit,
}

impl Category {
  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Entry => "entry",
      Category::Middle => "middle",
      Category::Exit => "exit",
    }
  }

  /// Whether outputs of this category land in the Output store.
  pub fn writes_output_store(&self) -> bool {
    matches!(self, Category::Exit)
  }

  /// Whether this category may declare `init_params`.
  pub fn reads_input_store(&self) -> bool {
    matches!(self, Category::Entry)
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "entry" => Ok(Category::Entry),
      "middle" => Ok(Category::Middle),
      "exit" => Ok(Category::Exit),
      _ => Err(ConfigError::UnknownCategory(s.to_string())),
    }
  }
}
