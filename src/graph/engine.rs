//! The dependency graph engine.
//!
//! An immutable, id-keyed view over a resolved `ComponentRegistry`. Uses
//! petgraph to store the edge structure and keeps an insertion-ordered
//! adjacency index beside it, so traversals follow each component's
//! `depends_on` order and stay deterministic.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use super::registry::ComponentRegistry;

/// A directed graph over component ids. Edge `A -> B` means
/// "A statically depends on B". Built once per scan, read-only after.
pub struct DependencyGraph {
    /// The directed graph; node weights are component ids.
    graph: DiGraph<String, ()>,
    /// Index: id -> node index, in sorted id order.
    index: BTreeMap<String, NodeIndex>,
    /// Index: id -> depends_on ids, preserving each component's edge order.
    adjacency: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph view from a resolved registry. Introduces no edges
    /// beyond the registry's `depends_on` data.
    pub fn from_registry(registry: &ComponentRegistry) -> Self {
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        let mut adjacency = BTreeMap::new();

        for (id, _) in registry.iter() {
            let node = graph.add_node(id.to_string());
            index.insert(id.to_string(), node);
        }
        for (id, component) in registry.iter() {
            let from = index[id];
            for dep in &component.depends_on {
                if let Some(&to) = index.get(dep) {
                    graph.add_edge(from, to, ());
                }
            }
            adjacency.insert(id.to_string(), component.depends_on.clone());
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        Self {
            graph,
            index,
            adjacency,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// The id-keyed adjacency view (`depends_on` order preserved).
    pub fn adjacency(&self) -> &BTreeMap<String, Vec<String>> {
        &self.adjacency
    }

    /// What `id` depends on, in its recorded edge order.
    pub fn dependencies(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// What depends on `id`, ascending.
    pub fn dependents(&self, id: &str) -> Vec<String> {
        let Some(&node) = self.index.get(id) else {
            return Vec::new();
        };
        let mut result: Vec<String> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        result.sort();
        result.dedup();
        result
    }

    /// Every component no other component references: the candidate
    /// top-level seeds of the tree. Ascending id order.
    pub fn entry_points(&self) -> Vec<String> {
        self.index
            .iter()
            .filter(|(_, &node)| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Dependency-ordered transitive closure from `start`: a post-order
    /// depth-first walk of `depends_on` edges, so every dependency is
    /// emitted before anything that depends on it and `start` comes last.
    /// Cycle-safe through the visited set; an unknown id yields an empty
    /// sequence.
    pub fn closure(&self, start: &str) -> Vec<String> {
        let Some((start, _)) = self.adjacency.get_key_value(start) else {
            return Vec::new();
        };

        let mut visited: HashSet<&str> = HashSet::new();
        let mut order: Vec<String> = Vec::new();
        // (id, index of the next dependency to visit)
        let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
        visited.insert(start);

        while let Some(frame) = stack.last_mut() {
            let (id, next) = (frame.0, frame.1);
            let deps = self.dependencies(id);
            if next < deps.len() {
                frame.1 += 1;
                let dep = deps[next].as_str();
                if visited.insert(dep) {
                    stack.push((dep, 0));
                }
            } else {
                order.push(id.to_string());
                stack.pop();
            }
        }

        order
    }

    /// Graph-level statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            component_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            entry_point_count: self.entry_points().len(),
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Statistics about a dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub component_count: usize,
    pub edge_count: usize,
    pub entry_point_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{Component, ComponentKind, Span};
    use std::path::PathBuf;

    fn registry_from(edges: &[(&str, &[&str])]) -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        for (id, deps) in edges {
            registry.insert(Component {
                id: id.to_string(),
                kind: ComponentKind::Function,
                relative_path: PathBuf::from("m.py"),
                absolute_path: PathBuf::from("/repo/m.py"),
                span: Span::new(1, 1),
                source_text: String::new(),
                depends_on: deps.iter().map(|d| d.to_string()).collect(),
            });
        }
        registry
    }

    #[test]
    fn entry_points_have_no_incoming_edges() {
        let registry = registry_from(&[("a", &["b"]), ("b", &["c"]), ("c", &[]), ("x", &[])]);
        let graph = DependencyGraph::from_registry(&registry);
        assert_eq!(graph.entry_points(), vec!["a".to_string(), "x".to_string()]);
    }

    #[test]
    fn isolated_component_is_its_own_closure() {
        let registry = registry_from(&[("x", &[])]);
        let graph = DependencyGraph::from_registry(&registry);
        assert_eq!(graph.entry_points(), vec!["x".to_string()]);
        assert_eq!(graph.closure("x"), vec!["x".to_string()]);
    }

    #[test]
    fn closure_is_dependency_first() {
        let registry = registry_from(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])]);
        let graph = DependencyGraph::from_registry(&registry);
        let closure = graph.closure("a");
        assert_eq!(
            closure,
            vec![
                "d".to_string(),
                "b".to_string(),
                "c".to_string(),
                "a".to_string()
            ]
        );
    }

    #[test]
    fn closure_visits_each_reachable_id_once() {
        let registry = registry_from(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &["a"])]);
        let graph = DependencyGraph::from_registry(&registry);
        let closure = graph.closure("a");
        let unique: HashSet<&String> = closure.iter().collect();
        assert_eq!(closure.len(), unique.len());
        assert_eq!(closure.len(), 3);
        // Cycle-safe: a is emitted exactly once, last.
        assert_eq!(closure.last().map(String::as_str), Some("a"));
    }

    #[test]
    fn closure_of_unknown_id_is_empty() {
        let registry = registry_from(&[("a", &[])]);
        let graph = DependencyGraph::from_registry(&registry);
        assert!(graph.closure("missing").is_empty());
    }

    #[test]
    fn dependents_are_reverse_edges() {
        let registry = registry_from(&[("a", &["c"]), ("b", &["c"]), ("c", &[])]);
        let graph = DependencyGraph::from_registry(&registry);
        assert_eq!(
            graph.dependents("c"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(graph.dependents("a").is_empty());
    }

    #[test]
    fn stats_count_nodes_edges_entry_points() {
        let registry = registry_from(&[("a", &["b"]), ("b", &[]), ("x", &[])]);
        let graph = DependencyGraph::from_registry(&registry);
        let stats = graph.stats();
        assert_eq!(stats.component_count, 3);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.entry_point_count, 2);
    }
}
