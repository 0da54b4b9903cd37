use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("unknown node category '{0}' (expected entry, middle or exit)")]
  UnknownCategory(String),

  #[error("failed to read pipeline file {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse pipeline definition: {0}")]
  Parse(#[from] serde_json::Error),
}
