//! Actor graph construction from derived edges.
//!
//! ## Node Set
//!
//! Nodes are the distinct `source` and `target` ids of the edge list, in
//! first-seen order. Authors and companies share one id namespace: an author
//! whose id equals a company id is the same graph node.
//!
//! ## Edge Set
//!
//! An edge `A → B` means "A wrote about or replied to B". Parallel edges
//! (several posts or comments between the same pair) collapse into one.
//! Self-loops, such as an author replying to themselves, are kept. Edges with
//! a null endpoint cannot be placed and are counted in
//! [`ActorGraph::skipped_edges`].
//!
//! ## Content Hash
//!
//! [`ActorGraph::content_hash`] is a BLAKE3 hash of the sorted distinct edge
//! list, so two runs over the same snapshot produce the same hash.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{instrument, warn};

use crate::edges::Edge;

// ---------------------------------------------------------------------------
// ActorGraph
// ---------------------------------------------------------------------------

/// A directed actor graph.
#[derive(Debug, Clone)]
pub struct ActorGraph {
    /// Directed graph: nodes = actor ids, edges = distinct relationships.
    pub graph: DiGraph<String, ()>,
    /// Mapping from actor id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// BLAKE3 content hash of the distinct edge set.
    pub content_hash: String,
    /// Edges dropped because an endpoint was null.
    pub skipped_edges: usize,
}

impl ActorGraph {
    /// Build the graph from derived edges.
    #[must_use]
    #[instrument(skip_all, fields(edges = edges.len()))]
    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();
        let mut distinct: Vec<(&str, &str)> = Vec::new();
        let mut skipped_edges = 0usize;

        for edge in edges {
            let (Some(source), Some(target)) = (edge.source.as_deref(), edge.target.as_deref())
            else {
                skipped_edges += 1;
                continue;
            };

            let source_idx = *node_map
                .entry(source.to_string())
                .or_insert_with(|| graph.add_node(source.to_string()));
            let target_idx = *node_map
                .entry(target.to_string())
                .or_insert_with(|| graph.add_node(target.to_string()));

            // Avoid duplicate edges (petgraph allows them by default).
            if !graph.contains_edge(source_idx, target_idx) {
                graph.add_edge(source_idx, target_idx, ());
                distinct.push((source, target));
            }
        }

        if skipped_edges > 0 {
            warn!(skipped_edges, "edges with a null endpoint left out of the graph");
        }

        distinct.sort_unstable();
        let content_hash = compute_edge_hash(&distinct);

        Self {
            graph,
            node_map,
            content_hash,
            skipped_edges,
        }
    }

    /// Return the number of actors in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct relationships in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for an actor id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Return the actor id of a node.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Actor ids in node index (first-seen) order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }
}

/// Compute a BLAKE3 hash of a sorted edge list.
fn compute_edge_hash(edges: &[(&str, &str)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (source, target) in edges {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
