//! Weft Node
//!
//! This crate defines how a processing stage plugs into weft:
//!
//! - [`Node`] is the capability trait a stage implements
//!   (`resolve_input`, `pre_process`, `execute`, `post_process`).
//! - [`NodeInstance`] binds a node to its [`NodeConfig`](weft_config::NodeConfig),
//!   owns its private [`NodeState`] and drives the lifecycle:
//!
//! ```text
//! Created → InputResolved → PreProcessed → Executed → PostProcessed → Completed
//!    └────────────┴──────────────┴─────────────┴──────────────┴──────→ Failed
//! ```
//!
//! - [`NodeRegistry`] maps node identities to declarations and constructors.
//! - [`WithTimeout`] and [`WithRetry`] wrap a node's execute step with an
//!   external policy; the engine never applies them on its own.

mod error;
mod instance;
mod io;
mod node;
mod policy;
mod registry;
mod state;

pub use error::{NodeError, NodeExecutionError, RegistrationError};
pub use instance::{LifecycleStep, NodeInstance, NodePhase};
pub use io::{NodeInput, NodeOutput};
pub use node::Node;
pub use policy::{WithRetry, WithTimeout};
pub use registry::{NodeConstructor, NodeRegistry};
pub use state::NodeState;
