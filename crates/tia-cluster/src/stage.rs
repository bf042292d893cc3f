//! The cluster stage: `comments_dedup.csv` → `clusters.csv`.

use serde::Serialize;
use tia_core::config::{ClusterConfig, PipelinePaths};
use tia_core::table::Table;
use tracing::{info, instrument};

use crate::error::ClusterError;
use crate::kmeans::{Clustering, KMeansConfig, kmeans};
use crate::tfidf::Vectorizer;

/// Column header of the cluster table.
pub const CLUSTER_COLUMNS: [&str; 3] = ["cluster", "row", "excerpt"];

/// What one clustering run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub documents: usize,
    pub terms: usize,
    /// `(cluster id, member count)` for every non-empty cluster.
    pub sizes: Vec<(usize, usize)>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f64,
}

impl ClusterSummary {
    /// Summary of a corpus with no text to cluster.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            documents: 0,
            terms: 0,
            sizes: Vec::new(),
            iterations: 0,
            converged: true,
            inertia: 0.0,
        }
    }
}

/// Vectorize and cluster `texts`.
///
/// A corpus in which every text is blank has nothing to cluster and yields
/// an empty clustering.
///
/// # Errors
///
/// Fails when no term survives filtering or there are fewer texts than
/// clusters.
pub fn cluster_texts<S: AsRef<str>>(
    texts: &[S],
    cfg: &ClusterConfig,
) -> Result<(Clustering, ClusterSummary), ClusterError> {
    if texts.iter().all(|t| t.as_ref().trim().is_empty()) {
        info!(documents = texts.len(), "no comment text to cluster");
        let clustering = Clustering {
            assignments: Vec::new(),
            iterations: 0,
            converged: true,
            inertia: 0.0,
        };
        return Ok((clustering, ClusterSummary::empty()));
    }

    let matrix = Vectorizer::from(cfg).fit_transform(texts)?;
    let clustering = kmeans(&matrix.rows, &KMeansConfig::from(cfg))?;

    let summary = ClusterSummary {
        documents: texts.len(),
        terms: matrix.vocabulary.len(),
        sizes: clustering
            .groups()
            .into_iter()
            .map(|(cluster, members)| (cluster, members.len()))
            .collect(),
        iterations: clustering.iterations,
        converged: clustering.converged,
        inertia: clustering.inertia,
    };
    Ok((clustering, summary))
}

/// Texts of `column`; null cells and a missing column read as empty text.
#[must_use]
pub fn texts_from_table(table: &Table, column: &str) -> Vec<String> {
    let col = table.accessor(column);
    table
        .rows
        .iter()
        .map(|row| col.get(row).unwrap_or_default().to_string())
        .collect()
}

/// One row per document, grouped by cluster then by document row.
#[must_use]
pub fn clusters_table(clustering: &Clustering, texts: &[String]) -> Table {
    let rows = clustering
        .groups()
        .into_iter()
        .flat_map(|(cluster, members)| {
            members.into_iter().map(move |row| {
                vec![
                    Some(cluster.to_string()),
                    Some(row.to_string()),
                    texts.get(row).filter(|t| !t.is_empty()).cloned(),
                ]
            })
        })
        .collect();
    Table::with_rows(CLUSTER_COLUMNS.iter().map(|c| (*c).to_string()).collect(), rows)
}

/// Run the cluster stage from the deduplicated comment table on disk.
///
/// # Errors
///
/// Fails on a missing or malformed comment table, an unusable corpus, or an
/// unwritable output.
#[instrument(skip_all, fields(root = %paths.root.display()))]
pub fn run_cluster(cfg: &ClusterConfig, paths: &PipelinePaths) -> Result<ClusterSummary, ClusterError> {
    let comments = Table::read_csv(&paths.comments_dedup)?;
    cluster_comments(&comments, cfg, paths)
}

/// Cluster an in-memory comment table and write `clusters.csv`.
///
/// # Errors
///
/// Fails on an unusable corpus or an unwritable output.
pub fn cluster_comments(
    comments: &Table,
    cfg: &ClusterConfig,
    paths: &PipelinePaths,
) -> Result<ClusterSummary, ClusterError> {
    let texts = texts_from_table(comments, &cfg.text_column);
    let (clustering, summary) = cluster_texts(&texts, cfg)?;
    clusters_table(&clustering, &texts).write_csv(&paths.clusters)?;

    info!(
        documents = summary.documents,
        terms = summary.terms,
        clusters = summary.sizes.len(),
        "clustered comments"
    );
    Ok(summary)
}
