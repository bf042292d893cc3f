//! Centrality metrics for the actor graph.
//!
//! - **Degree centrality** (`degree`): how many distinct actors point at (or
//!   are pointed at by) each actor, normalised by `n - 1`.
//! - **Eigenvector centrality** (`eigenvector`): which actors are linked to
//!   by other well-linked actors.
//!
//! Both take an [`crate::graph::ActorGraph`] and return scores keyed by actor
//! id. Degree centrality always succeeds; eigenvector centrality can fail to
//! converge, which callers report without discarding the degree scores.

pub mod degree;
pub mod eigenvector;

pub use degree::{DegreeCentrality, degree_centrality};
pub use eigenvector::{CentralityComputationError, EigenvectorConfig, eigenvector_centrality};
