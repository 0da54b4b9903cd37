//! Weft Runtime
//!
//! Executes the nodes of a [`NodeRegistry`](weft_node::NodeRegistry) as a
//! dependency graph:
//!
//! 1. The graph is built from the declarations; missing producers and cycles
//!    are rejected before any node runs.
//! 2. Nodes whose producers have completed run in parallel batches.
//! 3. A failed node's outputs are never written and every node that depends
//!    on it, directly or transitively, is skipped.
//! 4. The result carries the Output store plus a status for every node.

mod engine;
mod error;
mod events;
mod result;
mod scheduler;

pub use engine::{Engine, EngineConfig};
pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::{ExecutionResult, NodeFailure, NodeStatus};
