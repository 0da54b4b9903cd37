//! Weft Graph
//!
//! Builds the dependency graph of a pipeline from node declarations.
//! Edges are never declared explicitly: node `A` precedes node `B` when one of
//! `A`'s `output_fields` appears in `B`'s `input_fields`.
//!
//! Building a [`WorkflowGraph`] validates the declarations:
//! - every `input_fields` key has exactly one producer writing to the Cache store
//! - no two nodes declare the same output key
//! - the producer/consumer edges are acyclic
//!
//! The resulting graph is immutable and carries a deterministic topological
//! order in which ties are broken by declaration order.

mod error;
mod graph;

pub use error::GraphError;
pub use graph::WorkflowGraph;
