//! Explicit node registry.
//!
//! The registry is an owned value handed to the engine, not a process-wide
//! global, so independent pipelines never share registrations.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use weft_config::{Category, NodeConfig};

use crate::error::RegistrationError;
use crate::instance::NodeInstance;
use crate::node::Node;

/// Builds a fresh node for each graph build.
pub type NodeConstructor = Box<dyn Fn() -> Box<dyn Node> + Send + Sync>;

struct Registration {
  config: Arc<NodeConfig>,
  constructor: NodeConstructor,
}

/// Node declarations and constructors, in registration order.
#[derive(Default)]
pub struct NodeRegistry {
  entries: Vec<Registration>,
  index: HashMap<String, usize>,
}

impl NodeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a node declaration with its constructor.
  ///
  /// The declaration is validated here; a rejected declaration leaves the
  /// registry unchanged.
  pub fn register<N, F>(&mut self, config: NodeConfig, constructor: F) -> Result<(), RegistrationError>
  where
    N: Node,
    F: Fn() -> N + Send + Sync + 'static,
  {
    self.register_boxed(
      config,
      Box::new(move || Box::new(constructor()) as Box<dyn Node>),
    )
  }

  /// Register a declaration with an already boxed constructor.
  pub fn register_boxed(
    &mut self,
    config: NodeConfig,
    constructor: NodeConstructor,
  ) -> Result<(), RegistrationError> {
    self.validate(&config)?;

    debug!(
      node_id = %config.id,
      category = %config.category,
      "node registered"
    );

    self.index.insert(config.id.clone(), self.entries.len());
    self.entries.push(Registration {
      config: Arc::new(config),
      constructor,
    });
    Ok(())
  }

  /// Register from loosely typed parts, e.g. records read from an external
  /// registry where the category is a string.
  pub fn register_parts<N, F>(
    &mut self,
    id: &str,
    category: &str,
    init_params: &[&str],
    input_fields: &[&str],
    output_fields: &[&str],
    constructor: F,
  ) -> Result<(), RegistrationError>
  where
    N: Node,
    F: Fn() -> N + Send + Sync + 'static,
  {
    let category: Category = category
      .parse()
      .map_err(|_| RegistrationError::UnknownCategory {
        id: id.to_string(),
        category: category.to_string(),
      })?;

    let config = NodeConfig::new(id, category)
      .with_init_params(init_params.iter().copied())
      .with_input_fields(input_fields.iter().copied())
      .with_output_fields(output_fields.iter().copied());

    self.register(config, constructor)
  }

  pub fn get(&self, id: &str) -> Option<&Arc<NodeConfig>> {
    self.index.get(id).map(|&i| &self.entries[i].config)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.index.contains_key(id)
  }

  /// Declarations in registration order.
  pub fn configs(&self) -> impl Iterator<Item = &Arc<NodeConfig>> {
    self.entries.iter().map(|r| &r.config)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Construct one instance per declaration, in registration order.
  pub fn instantiate(&self) -> Vec<NodeInstance> {
    self
      .entries
      .iter()
      .map(|r| NodeInstance::new(r.config.clone(), (r.constructor)()))
      .collect()
  }

  /// Construct an instance of a single node.
  pub fn instantiate_node(&self, id: &str) -> Option<NodeInstance> {
    self.index.get(id).map(|&i| {
      let r = &self.entries[i];
      NodeInstance::new(r.config.clone(), (r.constructor)())
    })
  }

  fn validate(&self, config: &NodeConfig) -> Result<(), RegistrationError> {
    let id = config.id.trim();
    if id.is_empty() {
      return Err(RegistrationError::EmptyId);
    }
    if id.len() != config.id.len() {
      return Err(RegistrationError::PaddedId {
        id: config.id.clone(),
      });
    }
    if self.index.contains_key(&config.id) {
      return Err(RegistrationError::DuplicateId {
        id: config.id.clone(),
      });
    }
    if !config.init_params.is_empty() && !config.category.reads_input_store() {
      return Err(RegistrationError::InitParamsNotAllowed {
        id: config.id.clone(),
        category: config.category,
      });
    }

    for fields in [&config.init_params, &config.input_fields, &config.output_fields] {
      let mut seen = HashSet::new();
      for key in fields {
        if key.is_empty() {
          return Err(RegistrationError::EmptyField {
            id: config.id.clone(),
          });
        }
        if !seen.insert(key.as_str()) {
          return Err(RegistrationError::DuplicateField {
            id: config.id.clone(),
            key: key.clone(),
          });
        }
      }
    }

    if let Some(key) = config
      .input_fields
      .iter()
      .find(|key| config.init_params.contains(key))
    {
      return Err(RegistrationError::OverlappingFields {
        id: config.id.clone(),
        key: key.clone(),
      });
    }

    Ok(())
  }
}

impl fmt::Debug for NodeRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list()
      .entries(self.entries.iter().map(|r| &r.config.id))
      .finish()
  }
}
