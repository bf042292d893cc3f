//! Actor graph module.
//!
//! ```text
//! Vec<Edge>
//!    ↓  build::ActorGraph::from_edges()
//! ActorGraph (DiGraph<String, ()>, parallel edges collapsed)
//!    ↓  stats::GraphStats::from_graph()
//! GraphStats (density, components, self-loops, …)
//! ```

pub mod build;
pub mod stats;

pub use build::ActorGraph;
pub use stats::GraphStats;
