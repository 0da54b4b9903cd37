use thiserror::Error;

use crate::store::StoreKind;

/// Store contract violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
  /// The Input store only accepts writes while the context is being seeded.
  #[error("input store is sealed; cannot write key '{key}'")]
  InputSealed { key: String },

  /// Each key is written by at most one node per execution.
  #[error("key '{key}' was already written to the {store} store")]
  AlreadyWritten { store: StoreKind, key: String },
}
