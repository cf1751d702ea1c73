//! Target ordering by `use` edges.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::build::{Package, TargetDef};
use crate::config::ConfigError;

/// Targets of a set of packages, ordered so every library comes before
/// the targets that use it.
pub struct TargetGraph<'a> {
  graph: DiGraph<(&'a Package, &'a TargetDef), ()>,
  nodes: HashMap<&'a str, NodeIndex>,
  order: Vec<NodeIndex>,
}

impl<'a> TargetGraph<'a> {
  /// Build the graph of the exported packages.
  ///
  /// Libraries of non-exported packages are pulled in when an exported
  /// target uses them. Unknown `use` names are skipped; descriptors are
  /// validated when they are loaded.
  pub fn new(packages: &'a [Package]) -> Result<Self, ConfigError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();
    for package in packages {
      for target in &package.targets {
        let idx = graph.add_node((package, target));
        nodes.insert(target.name.as_str(), idx);
      }
    }

    for idx in graph.node_indices().collect::<Vec<_>>() {
      let (_, target) = graph[idx];
      for used in &target.uses {
        if let Some(&dep) = nodes.get(used.as_str()) {
          graph.add_edge(dep, idx, ());
        }
      }
    }

    let sorted = toposort(&graph, None).map_err(|cycle| {
      let (_, target) = graph[cycle.node_id()];
      ConfigError::DependencyCycle(target.name.clone())
    })?;

    let mut keep: BTreeSet<NodeIndex> = sorted.iter().copied().filter(|&idx| graph[idx].0.export).collect();
    // Walk dependents before dependencies so pulled-in libraries propagate.
    for &idx in sorted.iter().rev() {
      if keep.contains(&idx) {
        let deps: Vec<_> = graph.neighbors_directed(idx, Direction::Incoming).collect();
        keep.extend(deps);
      }
    }

    let order = sorted.into_iter().filter(|idx| keep.contains(idx)).collect();
    Ok(Self { graph, nodes, order })
  }

  /// Targets in dependency order.
  pub fn ordered(&self) -> impl Iterator<Item = (&'a Package, &'a TargetDef)> + '_ {
    self.order.iter().map(|&idx| self.graph[idx])
  }

  /// Every library `name` links against, directly or transitively, with
  /// users before the libraries they use.
  pub fn link_libraries(&self, name: &str) -> Vec<(&'a Package, &'a TargetDef)> {
    let Some(&start) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut seen = BTreeSet::new();
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
      for dep in self.graph.neighbors_directed(idx, Direction::Incoming) {
        if seen.insert(dep) {
          stack.push(dep);
        }
      }
    }

    let position: HashMap<NodeIndex, usize> = self.order.iter().enumerate().map(|(i, &idx)| (idx, i)).collect();
    let mut libs: Vec<NodeIndex> = seen.into_iter().collect();
    libs.sort_by_key(|idx| std::cmp::Reverse(position.get(idx).copied().unwrap_or(0)));
    libs.into_iter().map(|idx| self.graph[idx]).collect()
  }
}
