//! Weft Store
//!
//! Every execution owns three independent stores, never merged:
//!
//! ```text
//! Input   seeded once from the caller's payload, read-only afterwards
//! Cache   written by entry/middle nodes, read by any node via `input_fields`
//! Output  written by exit nodes, returned to the caller
//! ```
//!
//! The [`ExecutionContext`] owns the three stores for one run and is the only
//! way to reach them.

mod context;
mod error;
mod store;

pub use context::ExecutionContext;
pub use error::StoreError;
pub use store::{Store, StoreKind};

/// Values held by the stores.
pub type Value = serde_json::Value;

/// Snapshot of a store's contents, ordered by key.
pub type StoreMap = serde_json::Map<String, Value>;
