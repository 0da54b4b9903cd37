//! Weft Config
//!
//! This crate contains the serializable declarations for weft pipelines.
//! A pipeline is a list of node declarations, each naming:
//! - an identity and a [`Category`] (entry, middle, exit)
//! - the keys it reads from the Input store (`init_params`)
//! - the keys it reads from the Cache store (`input_fields`)
//! - the keys it may write (`output_fields`)
//!
//! Declarations can be built in code or loaded from JSON. The node registry
//! validates them; the graph builder derives edges from the field names.

mod category;
mod error;
mod node;
mod pipeline;

pub use category::Category;
pub use error::ConfigError;
pub use node::{NodeConfig, NodeDef};
pub use pipeline::PipelineDef;
