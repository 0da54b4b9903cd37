use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::{StoreMap, Value};

/// Which of the three per-execution stores a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
  Input,
  Cache,
  Output,
}

impl fmt::Display for StoreKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreKind::Input => f.write_str("input"),
      StoreKind::Cache => f.write_str("cache"),
      StoreKind::Output => f.write_str("output"),
    }
  }
}

/// A string-keyed map of values.
///
/// Reads take a shared lock. A batch write takes the exclusive lock once, so
/// readers see either none or all of a batch.
#[derive(Debug)]
pub struct Store {
  kind: StoreKind,
  entries: RwLock<HashMap<String, Value>>,
}

impl Store {
  pub fn new(kind: StoreKind) -> Self {
    Self {
      kind,
      entries: RwLock::new(HashMap::new()),
    }
  }

  pub(crate) fn seeded(kind: StoreKind, entries: StoreMap) -> Self {
    Self {
      kind,
      entries: RwLock::new(entries.into_iter().collect()),
    }
  }

  pub fn kind(&self) -> StoreKind {
    self.kind
  }

  /// Get a copy of the value stored under `key`.
  pub fn get(&self, key: &str) -> Option<Value> {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.get(key).cloned()
  }

  pub fn contains(&self, key: &str) -> bool {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.contains_key(key)
  }

  pub fn len(&self) -> usize {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Copy the current contents into an ordered map.
  pub fn snapshot(&self) -> StoreMap {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    sorted(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
  }

  /// Insert a batch of entries.
  ///
  /// Fails without writing anything if any key is already present.
  pub(crate) fn insert_all(&self, batch: Vec<(String, Value)>) -> Result<(), StoreError> {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

    for (i, (key, _)) in batch.iter().enumerate() {
      let repeated = batch[..i].iter().any(|(k, _)| k == key);
      if repeated || entries.contains_key(key) {
        return Err(StoreError::AlreadyWritten {
          store: self.kind,
          key: key.clone(),
        });
      }
    }

    entries.extend(batch);
    Ok(())
  }

  pub(crate) fn into_map(self) -> StoreMap {
    let entries = self
      .entries
      .into_inner()
      .unwrap_or_else(PoisonError::into_inner);
    sorted(entries.into_iter().collect())
  }
}

fn sorted(mut entries: Vec<(String, Value)>) -> StoreMap {
  entries.sort_by(|a, b| a.0.cmp(&b.0));
  entries.into_iter().collect()
}
