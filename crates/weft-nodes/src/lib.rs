//! Weft Nodes
//!
//! A closed set of built-in [`Operation`]s that pipeline files can refer to,
//! and [`build_registry`] to turn a [`PipelineDef`](weft_config::PipelineDef)
//! of them into a [`NodeRegistry`](weft_node::NodeRegistry).
//!
//! ```json
//! {
//!   "name": "shout",
//!   "nodes": [
//!     { "id": "read", "category": "entry", "init_params": ["msg"],
//!       "output_fields": ["raw"], "operation": { "kind": "trim" } },
//!     { "id": "shout", "category": "exit", "input_fields": ["raw"],
//!       "output_fields": ["final"], "operation": { "kind": "uppercase" },
//!       "timeout_ms": 500 }
//!   ]
//! }
//! ```

mod node;
mod operation;
mod pipeline;

pub use node::OperationNode;
pub use operation::Operation;
pub use pipeline::{Pipeline, build_registry, load_pipeline};
