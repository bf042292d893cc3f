//! Eigenvector centrality via power iteration.
//!
//! # Algorithm
//!
//! Power iteration on `(A + I)ᵀ`, where `A` is the adjacency matrix of the
//! collapsed actor graph:
//!
//! 1. Initialize every score to `1/n`.
//! 2. `next(v) = prev(v) + Σ prev(u)` over edges `u → v`, so score flows
//!    along edge direction. The identity term keeps the iteration from
//!    oscillating on bipartite structure.
//! 3. Normalize `next` to unit L2 norm.
//! 4. Stop once `Σ |next(v) - prev(v)| < n · tolerance`.
//!
//! Directed graphs without cycles have no positive dominant eigenvector and
//! usually fail to converge within the iteration budget; that surfaces as
//! [`CentralityComputationError::NotConverged`] rather than a silent
//! best-effort answer.

use std::collections::HashMap;

use petgraph::visit::EdgeRef;
use tracing::{debug, instrument};

use crate::graph::ActorGraph;

/// Iteration budget for [`eigenvector_centrality`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenvectorConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for EigenvectorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl From<&tia_core::config::CentralityConfig> for EigenvectorConfig {
    fn from(cfg: &tia_core::config::CentralityConfig) -> Self {
        Self {
            max_iterations: cfg.max_iterations,
            tolerance: cfg.tolerance,
        }
    }
}

/// Why eigenvector centrality could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CentralityComputationError {
    #[error("eigenvector centrality did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("eigenvector centrality collapsed to a zero or non-finite vector")]
    ZeroVector,
}

/// Compute eigenvector centrality for every node.
///
/// An empty graph yields an empty map.
///
/// # Errors
///
/// Returns [`CentralityComputationError::NotConverged`] when the tolerance is
/// not reached within `max_iterations`, or
/// [`CentralityComputationError::ZeroVector`] if the score vector degenerates.
#[instrument(skip(ag), fields(nodes = ag.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn eigenvector_centrality(
    ag: &ActorGraph,
    config: &EigenvectorConfig,
) -> Result<HashMap<String, f64>, CentralityComputationError> {
    let g = &ag.graph;
    let n = g.node_count();
    if n == 0 {
        return Ok(HashMap::new());
    }

    let edges: Vec<(usize, usize)> = g
        .edge_references()
        .map(|e| (e.source().index(), e.target().index()))
        .collect();

    let mut scores = vec![1.0 / n as f64; n];
    let threshold = n as f64 * config.tolerance;

    for iter in 0..config.max_iterations {
        let mut next = scores.clone();
        for &(u, v) in &edges {
            next[v] += scores[u];
        }

        let norm = next.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(CentralityComputationError::ZeroVector);
        }
        for x in &mut next {
            *x /= norm;
        }

        let diff: f64 = scores
            .iter()
            .zip(&next)
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;

        if diff < threshold {
            debug!(iterations = iter + 1, "eigenvector centrality converged");
            return Ok(g
                .node_indices()
                .filter_map(|idx| Some((ag.node_id(idx)?.to_string(), scores[idx.index()])))
                .collect());
        }
    }

    Err(CentralityComputationError::NotConverged {
        iterations: config.max_iterations,
    })
}
