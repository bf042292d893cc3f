//! The network and centrality stages.
//!
//! ```text
//! staging/posts.csv            ┐
//! staging/posts_companies.csv  ├─ prepare ─▶ network_input/{authors_node,companies_node,edges}.csv
//! staging/comments_dedup.csv   ┘
//!
//! network_input/*.csv ─ score ─▶ network_output/centralities.csv
//! ```
//!
//! Both stages can also run back to back in memory: [`prepare`] returns the
//! [`NetworkInput`] that [`score`] consumes.

use serde::Serialize;
use tia_core::config::{CentralityConfig, ColumnNames, PipelinePaths};
use tia_core::table::Table;
use tracing::{info, instrument, warn};

use crate::centrality::{
    CentralityComputationError, EigenvectorConfig, degree_centrality, eigenvector_centrality,
};
use crate::edges::{Edge, build_edges, edges_from_table, edges_table};
use crate::error::NetworkError;
use crate::graph::{ActorGraph, GraphStats};
use crate::nodes::NodeSet;
use crate::report::CentralityReport;

/// Nodes and edges of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInput {
    pub nodes: NodeSet,
    pub edges: Vec<Edge>,
}

/// Row counts of the network stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub authors: usize,
    pub companies: usize,
    pub edges: usize,
}

impl NetworkInput {
    #[must_use]
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            authors: self.nodes.authors.len(),
            companies: self.nodes.companies.len(),
            edges: self.edges.len(),
        }
    }
}

/// Result of scoring the actor graph.
#[derive(Debug, Clone)]
pub struct CentralityOutcome {
    pub stats: GraphStats,
    pub report: CentralityReport,
    /// Set when eigenvector centrality failed and its column is null.
    pub eigenvector_error: Option<CentralityComputationError>,
}

/// Derive nodes and edges from the staging tables.
#[must_use]
pub fn prepare(posts: &Table, companies: &Table, comments: &Table, cols: &ColumnNames) -> NetworkInput {
    NetworkInput {
        nodes: NodeSet::derive(posts, companies, comments, cols),
        edges: build_edges(posts, companies, comments, cols),
    }
}

/// Read the three staging tables the network stage joins.
///
/// # Errors
///
/// Fails if a staging CSV is missing or malformed.
pub fn read_staging(
    paths: &PipelinePaths,
    cols: &ColumnNames,
) -> Result<(Table, Table, Table), NetworkError> {
    let posts = Table::read_csv(&paths.posts())?;
    let companies = Table::read_csv(&paths.posts_side(&cols.companies_list))?;
    let comments = Table::read_csv(&paths.comments_dedup)?;
    Ok((posts, companies, comments))
}

/// Write the node and edge tables.
///
/// # Errors
///
/// Fails if any file cannot be written.
pub fn write_network_input(input: &NetworkInput, paths: &PipelinePaths) -> Result<(), NetworkError> {
    input.nodes.authors_table().write_csv(&paths.authors_node)?;
    input.nodes.companies_table().write_csv(&paths.companies_node)?;
    edges_table(&input.edges).write_csv(&paths.edges)?;
    Ok(())
}

/// Read the node and edge tables written by [`write_network_input`].
///
/// # Errors
///
/// Fails if a file is missing or a type column holds an unknown value.
pub fn read_network_input(paths: &PipelinePaths) -> Result<NetworkInput, NetworkError> {
    let companies = Table::read_csv(&paths.companies_node)?;
    let authors = Table::read_csv(&paths.authors_node)?;
    let edges = Table::read_csv(&paths.edges)?;
    Ok(NetworkInput {
        nodes: NodeSet::from_tables(&companies, &authors)?,
        edges: edges_from_table(&edges)?,
    })
}

/// Run the network stage from the staging CSVs.
///
/// # Errors
///
/// Fails on a missing or malformed staging table or an unwritable output.
#[instrument(skip_all, fields(root = %paths.root.display()))]
pub fn run_network(cols: &ColumnNames, paths: &PipelinePaths) -> Result<NetworkInput, NetworkError> {
    let (posts, companies, comments) = read_staging(paths, cols)?;
    let input = prepare(&posts, &companies, &comments, cols);
    write_network_input(&input, paths)?;

    let summary = input.summary();
    info!(
        authors = summary.authors,
        companies = summary.companies,
        edges = summary.edges,
        "network input written"
    );
    Ok(input)
}

/// Build the graph and score every actor.
///
/// A failed eigenvector computation is logged and leaves that column null;
/// with `strict_eigenvector` it is returned as an error instead.
///
/// # Errors
///
/// Returns [`NetworkError::Centrality`] only in strict mode.
#[instrument(skip_all, fields(edges = input.edges.len()))]
pub fn score(input: &NetworkInput, cfg: &CentralityConfig) -> Result<CentralityOutcome, NetworkError> {
    let graph = ActorGraph::from_edges(&input.edges);
    let stats = GraphStats::from_graph(&graph);
    let degree = degree_centrality(&graph);

    let (eigen, eigenvector_error) =
        match eigenvector_centrality(&graph, &EigenvectorConfig::from(cfg)) {
            Ok(scores) => (Some(scores), None),
            Err(e) if cfg.strict_eigenvector => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "eigenvector centrality unavailable; reporting degree centrality only");
                (None, Some(e))
            }
        };

    let report = CentralityReport::build(&graph, &input.nodes, &degree, eigen.as_ref());
    info!(
        nodes = stats.node_count,
        edges = stats.edge_count,
        rows = report.len(),
        "scored actor graph"
    );

    Ok(CentralityOutcome {
        stats,
        report,
        eigenvector_error,
    })
}

/// Run the centrality stage from the network input CSVs.
///
/// # Errors
///
/// Fails on missing input, an unwritable report, or (in strict mode) an
/// eigenvector failure.
#[instrument(skip_all, fields(root = %paths.root.display()))]
pub fn run_centrality(
    cfg: &CentralityConfig,
    paths: &PipelinePaths,
) -> Result<CentralityOutcome, NetworkError> {
    let input = read_network_input(paths)?;
    let outcome = score(&input, cfg)?;
    write_report(&outcome.report, paths)?;
    Ok(outcome)
}

/// Write the centrality report.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub fn write_report(report: &CentralityReport, paths: &PipelinePaths) -> Result<(), NetworkError> {
    report.to_table().write_csv(&paths.centralities)?;
    Ok(())
}
