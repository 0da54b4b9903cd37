use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::debug;
use weft_config::NodeConfig;

use crate::error::GraphError;

/// Validated dependency graph over node declarations.
///
/// Nodes are addressed by their declaration index internally; the public API
/// speaks node ids.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
  nodes: Vec<Arc<NodeConfig>>,
  index: HashMap<String, usize>,
  /// Adjacency list: producer -> consumers, ascending.
  adjacency: Vec<Vec<usize>>,
  /// Reverse adjacency: consumer -> producers, ascending.
  reverse_adjacency: Vec<Vec<usize>>,
  /// Cache key -> producing node.
  producers: HashMap<String, usize>,
  /// Topological order, ties broken by declaration order.
  order: Vec<usize>,
}

impl WorkflowGraph {
  /// Build and validate a graph from declarations in declaration order.
  pub fn build<I>(configs: I) -> Result<Self, GraphError>
  where
    I: IntoIterator<Item = Arc<NodeConfig>>,
  {
    let nodes: Vec<Arc<NodeConfig>> = configs.into_iter().collect();

    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
      if index.insert(node.id.clone(), i).is_some() {
        return Err(GraphError::DuplicateNode {
          id: node.id.clone(),
        });
      }
    }

    // Every output key has a single owner, whichever store it lands in.
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
      for key in &node.output_fields {
        if let Some(&first) = owners.get(key.as_str()) {
          return Err(GraphError::DuplicateOutput {
            key: key.clone(),
            first: nodes[first].id.clone(),
            second: node.id.clone(),
          });
        }
        owners.insert(key.as_str(), i);
      }
    }

    // Exit outputs go to the Output store, which no node reads.
    let producers: HashMap<String, usize> = owners
      .iter()
      .filter(|&(_, &i)| !nodes[i].category.writes_output_store())
      .map(|(&key, &i)| (key.to_string(), i))
      .collect();

    let mut adjacency = vec![Vec::new(); nodes.len()];
    let mut reverse_adjacency = vec![Vec::new(); nodes.len()];
    for (consumer, node) in nodes.iter().enumerate() {
      for key in &node.input_fields {
        let producer = *producers
          .get(key)
          .ok_or_else(|| GraphError::MissingProducer {
            node_id: node.id.clone(),
            key: key.clone(),
          })?;
        if !adjacency[producer].contains(&consumer) {
          adjacency[producer].push(consumer);
          reverse_adjacency[consumer].push(producer);
        }
      }
    }
    for list in adjacency.iter_mut().chain(reverse_adjacency.iter_mut()) {
      list.sort_unstable();
    }

    let order = topological_order(&adjacency, &reverse_adjacency).map_err(|remaining| {
      let path = find_cycle(&reverse_adjacency, &remaining)
        .into_iter()
        .map(|i| nodes[i].id.clone())
        .collect();
      GraphError::Cycle { path }
    })?;

    debug!(
      nodes = nodes.len(),
      edges = adjacency.iter().map(Vec::len).sum::<usize>(),
      "workflow graph built"
    );

    Ok(Self {
      nodes,
      index,
      adjacency,
      reverse_adjacency,
      producers,
      order,
    })
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Get a node declaration by id.
  pub fn node(&self, node_id: &str) -> Option<&Arc<NodeConfig>> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  /// Declaration index of a node.
  pub fn position(&self, node_id: &str) -> Option<usize> {
    self.index.get(node_id).copied()
  }

  /// Node declarations in declaration order.
  pub fn nodes(&self) -> &[Arc<NodeConfig>] {
    &self.nodes
  }

  /// Node ids in execution order.
  pub fn execution_order(&self) -> Vec<&str> {
    self.order.iter().map(|&i| self.nodes[i].id.as_str()).collect()
  }

  /// Declaration indices in execution order.
  pub fn order(&self) -> &[usize] {
    &self.order
  }

  /// Declaration indices of the nodes `index` reads from.
  pub fn upstream_of(&self, index: usize) -> &[usize] {
    &self.reverse_adjacency[index]
  }

  /// Declaration indices of the nodes reading from `index`.
  pub fn downstream_of(&self, index: usize) -> &[usize] {
    &self.adjacency[index]
  }

  /// Get upstream node ids for a given node.
  pub fn upstream(&self, node_id: &str) -> Vec<&str> {
    self.ids(self.position(node_id).map(|i| self.upstream_of(i)))
  }

  /// Get downstream node ids for a given node.
  pub fn downstream(&self, node_id: &str) -> Vec<&str> {
    self.ids(self.position(node_id).map(|i| self.downstream_of(i)))
  }

  /// Nodes with no upstream dependency, in declaration order.
  pub fn entry_points(&self) -> Vec<&str> {
    self
      .nodes
      .iter()
      .enumerate()
      .filter(|(i, _)| self.reverse_adjacency[*i].is_empty())
      .map(|(_, n)| n.id.as_str())
      .collect()
  }

  /// All transitive consumers of a node, in declaration order.
  pub fn descendants(&self, node_id: &str) -> Vec<&str> {
    let Some(start) = self.position(node_id) else {
      return Vec::new();
    };

    let mut seen = vec![false; self.nodes.len()];
    let mut queue: VecDeque<usize> = self.adjacency[start].iter().copied().collect();
    while let Some(next) = queue.pop_front() {
      if !seen[next] {
        seen[next] = true;
        queue.extend(self.adjacency[next].iter().copied());
      }
    }

    seen
      .iter()
      .enumerate()
      .filter(|&(_, &s)| s)
      .map(|(i, _)| self.nodes[i].id.as_str())
      .collect()
  }

  /// The node writing `key` to the Cache store, if any.
  pub fn producer_of(&self, key: &str) -> Option<&str> {
    self
      .producers
      .get(key)
      .map(|&i| self.nodes[i].id.as_str())
  }

  /// All producer -> consumer edges, ordered by producer then consumer.
  pub fn edges(&self) -> Vec<(&str, &str)> {
    self
      .adjacency
      .iter()
      .enumerate()
      .flat_map(|(from, tos)| {
        tos
          .iter()
          .map(move |&to| (self.nodes[from].id.as_str(), self.nodes[to].id.as_str()))
      })
      .collect()
  }

  fn ids(&self, indices: Option<&[usize]>) -> Vec<&str> {
    indices
      .unwrap_or(&[])
      .iter()
      .map(|&i| self.nodes[i].id.as_str())
      .collect()
  }
}

/// Kahn's algorithm with a min-heap so ready nodes come out in declaration
/// order. On a cycle, returns the nodes that never became ready.
fn topological_order(
  adjacency: &[Vec<usize>],
  reverse_adjacency: &[Vec<usize>],
) -> Result<Vec<usize>, Vec<usize>> {
  let mut in_degree: Vec<usize> = reverse_adjacency.iter().map(Vec::len).collect();
  let mut ready: BinaryHeap<Reverse<usize>> = in_degree
    .iter()
    .enumerate()
    .filter(|&(_, &d)| d == 0)
    .map(|(i, _)| Reverse(i))
    .collect();

  let mut order = Vec::with_capacity(adjacency.len());
  while let Some(Reverse(node)) = ready.pop() {
    order.push(node);
    for &next in &adjacency[node] {
      in_degree[next] -= 1;
      if in_degree[next] == 0 {
        ready.push(Reverse(next));
      }
    }
  }

  if order.len() == adjacency.len() {
    Ok(order)
  } else {
    Err((0..adjacency.len()).filter(|&i| in_degree[i] > 0).collect())
  }
}

/// Extract one cycle from the nodes left over by the topological sort.
///
/// Every leftover node has a leftover producer, so walking producers must
/// revisit a node. The cycle is returned in producer -> consumer direction,
/// starting and ending at its lowest declaration index.
fn find_cycle(reverse_adjacency: &[Vec<usize>], remaining: &[usize]) -> Vec<usize> {
  let remaining_set: HashSet<usize> = remaining.iter().copied().collect();
  let mut path: Vec<usize> = Vec::new();
  let mut position: HashMap<usize, usize> = HashMap::new();

  let Some(&first) = remaining.first() else {
    return Vec::new();
  };
  let mut current = first;

  loop {
    if let Some(&start) = position.get(&current) {
      let mut cycle: Vec<usize> = path[start..].to_vec();
      cycle.reverse();
      if let Some(min_at) = cycle
        .iter()
        .enumerate()
        .min_by_key(|&(_, &n)| n)
        .map(|(i, _)| i)
      {
        cycle.rotate_left(min_at);
      }
      if let Some(&first) = cycle.first() {
        cycle.push(first);
      }
      return cycle;
    }

    position.insert(current, path.len());
    path.push(current);

    match reverse_adjacency[current]
      .iter()
      .copied()
      .find(|producer| remaining_set.contains(producer))
    {
      Some(producer) => current = producer,
      None => return path,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn build(configs: Vec<NodeConfig>) -> Result<WorkflowGraph, GraphError> {
    WorkflowGraph::build(configs.into_iter().map(Arc::new))
  }

  #[test]
  fn test_topological_order_breaks_ties_by_declaration() {
    let adjacency = vec![vec![2], vec![2], vec![]];
    let reverse = vec![vec![], vec![], vec![0, 1]];
    assert_eq!(topological_order(&adjacency, &reverse).unwrap(), vec![0, 1, 2]);
  }

  #[test]
  fn test_topological_order_reports_leftovers() {
    // 0 -> 1 -> 2 -> 1
    let adjacency = vec![vec![1], vec![2], vec![1]];
    let reverse = vec![vec![], vec![0, 2], vec![1]];
    assert_eq!(topological_order(&adjacency, &reverse).unwrap_err(), vec![1, 2]);
  }

  #[test]
  fn test_find_cycle_rotates_to_lowest_index() {
    // 1 -> 2 -> 3 -> 1, with 3 also feeding 4 (not on the cycle).
    let reverse = vec![vec![], vec![3], vec![1], vec![2], vec![3]];
    assert_eq!(find_cycle(&reverse, &[4, 1, 2, 3]), vec![1, 2, 3, 1]);
  }

  #[test]
  fn test_self_loop_is_a_cycle() {
    let err = build(vec![
      NodeConfig::middle("echo")
        .with_input_fields(["x"])
        .with_output_fields(["x"]),
    ])
    .unwrap_err();

    assert_eq!(
      err,
      GraphError::Cycle {
        path: vec!["echo".to_string(), "echo".to_string()]
      }
    );
  }

  #[test]
  fn test_duplicate_node_rejected() {
    let err = build(vec![NodeConfig::entry("a"), NodeConfig::exit("a")]).unwrap_err();
    assert_eq!(err, GraphError::DuplicateNode { id: "a".to_string() });
  }
}
