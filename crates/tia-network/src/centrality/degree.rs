//! Normalised in/out degree centrality.
//!
//! `in[v] = |in-neighbours(v)| / (n - 1)` and likewise for out. A self-loop
//! makes a node its own neighbour in both directions. With one node or none
//! every node scores `1.0`.

use std::collections::HashMap;

use petgraph::Direction;

use crate::graph::ActorGraph;

/// Per-actor degree centrality scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegreeCentrality {
    /// In-degree centrality per actor id.
    pub in_degree: HashMap<String, f64>,
    /// Out-degree centrality per actor id.
    pub out_degree: HashMap<String, f64>,
}

/// Compute in- and out-degree centrality for every node.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn degree_centrality(ag: &ActorGraph) -> DegreeCentrality {
    let g = &ag.graph;
    let n = g.node_count();
    let scale = if n <= 1 { None } else { Some(1.0 / (n - 1) as f64) };

    let mut in_degree = HashMap::with_capacity(n);
    let mut out_degree = HashMap::with_capacity(n);

    for idx in g.node_indices() {
        let Some(id) = ag.node_id(idx) else {
            continue;
        };
        let score = |dir| {
            scale.map_or(1.0, |s| g.neighbors_directed(idx, dir).count() as f64 * s)
        };
        in_degree.insert(id.to_string(), score(Direction::Incoming));
        out_degree.insert(id.to_string(), score(Direction::Outgoing));
    }

    DegreeCentrality {
        in_degree,
        out_degree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::{ActorKind, Edge, EdgeType};

    fn graph(pairs: &[(&str, &str)]) -> ActorGraph {
        let edges: Vec<Edge> = pairs
            .iter()
            .enumerate()
            .map(|(index, (s, t))| Edge {
                index,
                source: Some((*s).to_string()),
                target: Some((*t).to_string()),
                label: None,
                source_type: ActorKind::Author,
                target_type: ActorKind::Author,
                edge_type: EdgeType::Comment,
            })
            .collect();
        ActorGraph::from_edges(&edges)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn star_into_hub() {
        let dc = degree_centrality(&graph(&[("a", "hub"), ("b", "hub"), ("c", "hub")]));
        assert!(approx(dc.in_degree["hub"], 1.0));
        assert!(approx(dc.out_degree["hub"], 0.0));
        assert!(approx(dc.out_degree["a"], 1.0 / 3.0));
        assert!(approx(dc.in_degree["a"], 0.0));
    }

    #[test]
    fn parallel_edges_count_once() {
        let dc = degree_centrality(&graph(&[("a", "b"), ("a", "b"), ("a", "c")]));
        assert!(approx(dc.out_degree["a"], 1.0));
        assert!(approx(dc.in_degree["b"], 0.5));
    }

    #[test]
    fn single_node_scores_one() {
        let dc = degree_centrality(&graph(&[("a", "a")]));
        assert!(approx(dc.in_degree["a"], 1.0));
        assert!(approx(dc.out_degree["a"], 1.0));
    }

    #[test]
    fn self_loop_counts_as_neighbour() {
        let dc = degree_centrality(&graph(&[("a", "a"), ("a", "b")]));
        assert!(approx(dc.out_degree["a"], 2.0));
        assert!(approx(dc.in_degree["a"], 1.0));
    }

    #[test]
    fn empty_graph_has_no_scores() {
        let dc = degree_centrality(&graph(&[]));
        assert!(dc.in_degree.is_empty());
        assert!(dc.out_degree.is_empty());
    }
}
