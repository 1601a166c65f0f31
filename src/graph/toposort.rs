//! Cycle resolution and topological ordering.
//!
//! Real reference graphs are not acyclic (mutual imports, recursive class
//! hierarchies), so ordering happens in two steps: detect strongly
//! connected components and deterministically exclude one edge per SCC
//! per round until the graph is acyclic, then run Kahn's algorithm over
//! the remainder. The exclusions are recorded in the returned
//! `CycleResolution`; the registry's `depends_on` data is never touched.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::cmp::Reverse;
use tracing::{debug, warn};

use super::engine::DependencyGraph;
use crate::error::{KeelError, Result};

/// The edges excluded from ordering consideration, in removal order.
/// Each entry is `(from, to)` of a dropped `depends_on` edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleResolution {
    pub dropped_edges: Vec<(String, String)>,
    /// The multi-node SCCs found in the first round, each sorted ascending.
    pub cycles: Vec<Vec<String>>,
}

impl CycleResolution {
    pub fn is_acyclic(&self) -> bool {
        self.dropped_edges.is_empty()
    }
}

/// Break every cycle in the graph, deterministically.
///
/// Per round, every SCC of size > 1 loses exactly one edge: the edge
/// `A -> B` where `A` is the lexicographically greatest id in the SCC and
/// `B` is A's first successor (in `depends_on` order) inside the SCC.
/// Rounds repeat until no multi-node SCC remains, so nested cycles inside
/// one SCC are broken too. Identical input yields identical removals.
pub fn resolve_cycles(graph: &DependencyGraph) -> CycleResolution {
    let mut adjacency: BTreeMap<&str, Vec<&str>> = graph
        .adjacency()
        .iter()
        .map(|(id, deps)| (id.as_str(), deps.iter().map(String::as_str).collect()))
        .collect();

    let mut resolution = CycleResolution::default();
    let mut first_round = true;

    loop {
        let sccs = multi_node_sccs(&adjacency);
        if sccs.is_empty() {
            break;
        }
        for scc in &sccs {
            let members: HashSet<&str> = scc.iter().copied().collect();
            // Sorted SCC members; the greatest id sheds an edge.
            let from = *scc.last().expect("scc is non-empty");
            let Some(to) = adjacency
                .get(from)
                .and_then(|deps| deps.iter().find(|d| members.contains(*d)))
                .copied()
            else {
                continue;
            };
            if let Some(deps) = adjacency.get_mut(from) {
                deps.retain(|d| *d != to);
            }
            debug!(from, to, "breaking cycle edge");
            resolution
                .dropped_edges
                .push((from.to_string(), to.to_string()));
            if first_round {
                resolution
                    .cycles
                    .push(scc.iter().map(|s| s.to_string()).collect());
            }
        }
        first_round = false;
    }

    if !resolution.dropped_edges.is_empty() {
        warn!(
            cycles = resolution.cycles.len(),
            dropped = resolution.dropped_edges.len(),
            "graph contained cycles, edges excluded from ordering"
        );
    }
    resolution
}

/// Total order over all component ids such that every dependency precedes
/// its dependents, modulo the edges excluded by cycle-breaking. Ties among
/// simultaneously-ready ids break by ascending id, so the output is
/// byte-identical across runs on identical input.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<String>> {
    let resolution = resolve_cycles(graph);
    topological_order_with(graph, &resolution)
}

/// As `topological_order`, reusing an existing cycle resolution.
pub fn topological_order_with(
    graph: &DependencyGraph,
    resolution: &CycleResolution,
) -> Result<Vec<String>> {
    let dropped: HashSet<(&str, &str)> = resolution
        .dropped_edges
        .iter()
        .map(|(a, b)| (a.as_str(), b.as_str()))
        .collect();

    // pending[id] = number of unemitted dependencies; dependents[dep] lists
    // who is waiting on it, in sorted-id discovery order.
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (id, deps) in graph.adjacency() {
        let live: Vec<&str> = deps
            .iter()
            .map(String::as_str)
            .filter(|d| !dropped.contains(&(id.as_str(), *d)))
            .collect();
        pending.insert(id, live.len());
        for dep in live {
            dependents.entry(dep).or_default().push(id);
        }
    }

    let mut ready: BinaryHeap<Reverse<&str>> = pending
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(&id, _)| Reverse(id))
        .collect();

    let mut order = Vec::with_capacity(pending.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id.to_string());
        if let Some(waiting) = dependents.get(id) {
            for &dependent in waiting {
                let count = pending
                    .get_mut(dependent)
                    .expect("dependent is a known id");
                *count -= 1;
                if *count == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
    }

    if order.len() != graph.node_count() {
        let emitted: HashSet<&str> = order.iter().map(String::as_str).collect();
        let remaining: Vec<String> = graph
            .ids()
            .filter(|id| !emitted.contains(id))
            .map(str::to_string)
            .collect();
        return Err(KeelError::CycleResolution { remaining });
    }

    Ok(order)
}

/// Tarjan SCCs of size > 1 over a plain adjacency map. Each SCC is
/// returned with its members sorted ascending; the SCC list itself is
/// sorted by first member for determinism.
fn multi_node_sccs<'a>(adjacency: &BTreeMap<&'a str, Vec<&'a str>>) -> Vec<Vec<&'a str>> {
    let mut petgraph = DiGraph::<&str, ()>::new();
    let mut nodes = BTreeMap::new();
    for &id in adjacency.keys() {
        nodes.insert(id, petgraph.add_node(id));
    }
    for (id, deps) in adjacency {
        for dep in deps {
            if let (Some(&from), Some(&to)) = (nodes.get(id), nodes.get(dep)) {
                petgraph.add_edge(from, to, ());
            }
        }
    }

    let mut sccs: Vec<Vec<&str>> = tarjan_scc(&petgraph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut ids: Vec<&str> = scc.into_iter().map(|n| petgraph[n]).collect();
            ids.sort_unstable();
            ids
        })
        .collect();
    sccs.sort_unstable();
    sccs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::registry::ComponentRegistry;
    use crate::graph::types::{Component, ComponentKind, Span};
    use std::path::PathBuf;

    fn graph_from(edges: &[(&str, &[&str])]) -> DependencyGraph {
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
        DependencyGraph::from_registry(&registry)
    }

    #[test]
    fn acyclic_graph_drops_nothing() {
        let graph = graph_from(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let resolution = resolve_cycles(&graph);
        assert!(resolution.is_acyclic());
        assert!(resolution.cycles.is_empty());
    }

    #[test]
    fn three_cycle_drops_exactly_one_edge() {
        // a -> b -> c -> a: the greatest id (c) loses its in-cycle edge.
        let graph = graph_from(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let resolution = resolve_cycles(&graph);
        assert_eq!(
            resolution.dropped_edges,
            vec![("c".to_string(), "a".to_string())]
        );
        assert_eq!(
            resolution.cycles,
            vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]]
        );

        let order = topological_order(&graph).unwrap();
        assert_eq!(order, vec!["c".to_string(), "b".to_string(), "a".to_string()]);
    }

    #[test]
    fn nested_cycles_in_one_scc_all_break() {
        // One SCC {a, b, c} holding two cycles: a<->b and a<->c.
        let graph = graph_from(&[("a", &["b", "c"]), ("b", &["a"]), ("c", &["a"])]);
        let resolution = resolve_cycles(&graph);
        // Round one drops c->a, round two drops b->a.
        assert_eq!(
            resolution.dropped_edges,
            vec![
                ("c".to_string(), "a".to_string()),
                ("b".to_string(), "a".to_string())
            ]
        );

        let order = topological_order(&graph).unwrap();
        assert_eq!(
            order,
            vec!["b".to_string(), "c".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let graph = graph_from(&[("z", &[]), ("m", &[]), ("a", &["m", "z"])]);
        let order = topological_order(&graph).unwrap();
        assert_eq!(
            order,
            vec!["m".to_string(), "z".to_string(), "a".to_string()]
        );
    }

    #[test]
    fn order_respects_every_kept_edge() {
        let graph = graph_from(&[
            ("app", &["core", "util"]),
            ("core", &["util"]),
            ("util", &[]),
            ("web", &["app", "core"]),
        ]);
        let order = topological_order(&graph).unwrap();
        let position: std::collections::HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        for (id, deps) in graph.adjacency() {
            for dep in deps {
                assert!(
                    position[dep.as_str()] < position[id.as_str()],
                    "{dep} must precede {id}"
                );
            }
        }
    }

    #[test]
    fn ordering_is_deterministic() {
        let edges: &[(&str, &[&str])] = &[
            ("a", &["b"]),
            ("b", &["c", "d"]),
            ("c", &["a"]),
            ("d", &[]),
            ("e", &["a", "d"]),
        ];
        let first_graph = graph_from(edges);
        let second_graph = graph_from(edges);
        let first = topological_order(&first_graph).unwrap();
        let second = topological_order(&second_graph).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            resolve_cycles(&first_graph),
            resolve_cycles(&second_graph)
        );
    }

    #[test]
    fn two_cycle_resolves() {
        let graph = graph_from(&[("a", &["b"]), ("b", &["a"])]);
        let resolution = resolve_cycles(&graph);
        assert_eq!(
            resolution.dropped_edges,
            vec![("b".to_string(), "a".to_string())]
        );
        let order = topological_order(&graph).unwrap();
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }
}
