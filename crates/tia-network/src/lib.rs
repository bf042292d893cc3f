#![forbid(unsafe_code)]
//! tia-network library.
//!
//! Derives a directed actor graph (authors and companies) from the staging
//! tables produced by `tia-core`, then scores every actor with degree and
//! eigenvector centrality.
//!
//! ```text
//! staging tables ─┬─ edges::build_edges ──────▶ edges.csv
//!                 └─ nodes::NodeSet::derive ──▶ authors_node.csv, companies_node.csv
//!
//! edges ─ graph::ActorGraph::from_edges
//!       ─ centrality::{degree_centrality, eigenvector_centrality}
//!       ─ report::CentralityReport ──────────▶ centralities.csv
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Library operations return [`error::NetworkError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod centrality;
pub mod edges;
pub mod error;
pub mod graph;
pub mod nodes;
pub mod report;
pub mod stage;

pub use edges::{ActorKind, Edge, EdgeType};
pub use error::NetworkError;
pub use graph::ActorGraph;
pub use nodes::{Node, NodeSet};
pub use report::CentralityReport;
