//! Execute-step policies wrapped around a node.
//!
//! Timeouts and retries are not part of the engine's contract. Whoever
//! constructs a node decides whether to wrap it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::NodeError;
use crate::io::{NodeInput, NodeOutput};
use crate::node::Node;
use crate::state::NodeState;

/// Fails the execute step with [`NodeError::Timeout`] when it runs longer
/// than `timeout`.
pub struct WithTimeout<N> {
  inner: N,
  timeout: Duration,
}

impl<N: Node> WithTimeout<N> {
  pub fn new(inner: N, timeout: Duration) -> Self {
    Self { inner, timeout }
  }

  /// The limit in whole milliseconds, saturating for absurdly long limits.
  pub fn timeout_ms(&self) -> u64 {
    u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
  }
}

#[async_trait]
impl<N: Node> Node for WithTimeout<N> {
  fn resolve_input(&mut self, input: NodeInput) -> Result<NodeInput, NodeError> {
    self.inner.resolve_input(input)
  }

  fn pre_process(&mut self, input: &NodeInput, state: &mut NodeState) -> Result<(), NodeError> {
    self.inner.pre_process(input, state)
  }

  async fn execute(
    &mut self,
    input: &NodeInput,
    state: &mut NodeState,
  ) -> Result<NodeOutput, NodeError> {
    match tokio::time::timeout(self.timeout, self.inner.execute(input, state)).await {
      Ok(result) => result,
      Err(_) => Err(NodeError::Timeout {
        timeout_ms: self.timeout_ms(),
      }),
    }
  }

  fn post_process(&mut self, output: &NodeOutput, state: &mut NodeState) -> Result<(), NodeError> {
    self.inner.post_process(output, state)
  }
}

/// Re-runs the execute step until it succeeds or `max_attempts` is reached,
/// sleeping `backoff` between attempts. The last error is returned.
pub struct WithRetry<N> {
  inner: N,
  max_attempts: u32,
  backoff: Duration,
}

impl<N: Node> WithRetry<N> {
  pub fn new(inner: N, max_attempts: u32) -> Self {
    Self {
      inner,
      max_attempts: max_attempts.max(1),
      backoff: Duration::ZERO,
    }
  }

  pub fn with_backoff(mut self, backoff: Duration) -> Self {
    self.backoff = backoff;
    self
  }
}

#[async_trait]
impl<N: Node> Node for WithRetry<N> {
  fn resolve_input(&mut self, input: NodeInput) -> Result<NodeInput, NodeError> {
    self.inner.resolve_input(input)
  }

  fn pre_process(&mut self, input: &NodeInput, state: &mut NodeState) -> Result<(), NodeError> {
    self.inner.pre_process(input, state)
  }

  async fn execute(
    &mut self,
    input: &NodeInput,
    state: &mut NodeState,
  ) -> Result<NodeOutput, NodeError> {
    let mut attempt = 1;
    loop {
      match self.inner.execute(input, state).await {
        Ok(output) => return Ok(output),
        Err(e) if attempt < self.max_attempts => {
          warn!(attempt, max_attempts = self.max_attempts, error = %e, "execute failed, retrying");
          attempt += 1;
          if !self.backoff.is_zero() {
            tokio::time::sleep(self.backoff).await;
          }
        }
        Err(e) => return Err(e),
      }
    }
  }

  fn post_process(&mut self, output: &NodeOutput, state: &mut NodeState) -> Result<(), NodeError> {
    self.inner.post_process(output, state)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Idle;

  #[async_trait]
  impl Node for Idle {
    async fn execute(
      &mut self,
      _input: &NodeInput,
      _state: &mut NodeState,
    ) -> Result<NodeOutput, NodeError> {
      Ok(NodeOutput::new())
    }
  }

  #[test]
  fn test_timeout_ms_saturates() {
    assert_eq!(WithTimeout::new(Idle, Duration::from_millis(250)).timeout_ms(), 250);
    assert_eq!(
      WithTimeout::new(Idle, Duration::from_secs(u64::MAX)).timeout_ms(),
      u64::MAX
    );
  }
}
