//! Summary statistics for the actor graph.
//!
//! - **density**: `edge_count / (node_count * (node_count - 1))`; zero for
//!   graphs with fewer than two nodes.
//! - **weakly_connected_component_count**: disjoint communities when edge
//!   direction is ignored.
//! - **self_loop_count**: actors replying to themselves.
//! - **max_in_degree** / **max_out_degree**: most-linked actor in each
//!   direction, counting distinct neighbours.

use petgraph::{Direction, algo::connected_components, visit::EdgeRef};
use serde::Serialize;

use crate::graph::build::ActorGraph;

/// Summary statistics for an [`ActorGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub weakly_connected_component_count: usize,
    pub self_loop_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    /// Edges left out because an endpoint was null.
    pub skipped_edges: usize,
    pub content_hash: String,
}

impl GraphStats {
    #[must_use]
    pub fn from_graph(ag: &ActorGraph) -> Self {
        let g = &ag.graph;
        let node_count = g.node_count();
        let edge_count = g.edge_count();

        let max_degree = |dir| {
            g.node_indices()
                .map(|idx| g.neighbors_directed(idx, dir).count())
                .max()
                .unwrap_or(0)
        };

        Self {
            node_count,
            edge_count,
            density: compute_density(node_count, edge_count),
            weakly_connected_component_count: connected_components(g),
            self_loop_count: g
                .edge_references()
                .filter(|e| e.source() == e.target())
                .count(),
            max_in_degree: max_degree(Direction::Incoming),
            max_out_degree: max_degree(Direction::Outgoing),
            skipped_edges: ag.skipped_edges,
            content_hash: ag.content_hash.clone(),
        }
    }
}

/// Directed graph density. Zero for fewer than two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    let max_edges = node_count * (node_count - 1);
    edge_count as f64 / max_edges as f64
}
