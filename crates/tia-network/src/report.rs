//! The centrality report: one row per scored actor.
//!
//! The three score series (in-degree, out-degree, eigenvector) are merged on
//! actor id and joined with the node tables. Graph nodes without a node row
//! are dropped, as are nodes that never appear in the graph. An id shared by
//! an author and a company yields one row per node, both with the same
//! scores.

use std::collections::HashMap;

use serde::Serialize;
use tia_core::table::{Cell, Table};

use crate::centrality::DegreeCentrality;
use crate::edges::ActorKind;
use crate::graph::ActorGraph;
use crate::nodes::{Node, NodeSet};

/// Fixed leading columns of the report table.
pub const REPORT_COLUMNS: [&str; 6] = [
    "node_id",
    "name",
    "type",
    "in_degree_centrality",
    "out_degree_centrality",
    "eigenvector_centrality",
];

/// One scored actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub node_id: String,
    pub name: Cell,
    #[serde(rename = "type")]
    pub kind: ActorKind,
    pub in_degree: Option<f64>,
    pub out_degree: Option<f64>,
    /// Null for every row when eigenvector centrality failed.
    pub eigenvector: Option<f64>,
    /// Values for [`CentralityReport::attribute_names`], in that order.
    pub attributes: Vec<Cell>,
}

/// Scores joined with node metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CentralityReport {
    /// Sorted union of node attribute names.
    pub attribute_names: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl CentralityReport {
    /// Join the score series with `nodes`.
    ///
    /// Rows follow graph node order, then node-table order (companies before
    /// authors) within one id. Pass `None` for `eigenvector` when it could not
    /// be computed.
    #[must_use]
    pub fn build(
        graph: &ActorGraph,
        nodes: &NodeSet,
        degree: &DegreeCentrality,
        eigenvector: Option<&HashMap<String, f64>>,
    ) -> Self {
        let attribute_names = nodes.attribute_names();

        let mut by_id: HashMap<&str, Vec<&Node>> = HashMap::new();
        for node in nodes.iter() {
            by_id.entry(node.id.as_str()).or_default().push(node);
        }

        let mut rows = Vec::new();
        for id in graph.node_ids() {
            let in_degree = degree.in_degree.get(id).copied();
            let out_degree = degree.out_degree.get(id).copied();
            let eigen = eigenvector.and_then(|scores| scores.get(id).copied());

            for node in by_id.get(id).into_iter().flatten() {
                rows.push(ReportRow {
                    node_id: id.to_string(),
                    name: node.label.clone(),
                    kind: node.kind,
                    in_degree,
                    out_degree,
                    eigenvector: eigen,
                    attributes: attribute_names
                        .iter()
                        .map(|a| node.attribute(a).map(str::to_string))
                        .collect(),
                });
            }
        }

        Self {
            attribute_names,
            rows,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `n` highest-scoring rows under `score`, ties in report order.
    /// Rows without a score are left out.
    #[must_use]
    pub fn top_by(&self, n: usize, score: impl Fn(&ReportRow) -> Option<f64>) -> Vec<&ReportRow> {
        let mut scored: Vec<(f64, &ReportRow)> = self
            .rows
            .iter()
            .filter_map(|row| Some((score(row)?, row)))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(n).map(|(_, row)| row).collect()
    }

    /// Render as the `centralities.csv` table.
    #[must_use]
    pub fn to_table(&self) -> Table {
        let mut columns: Vec<String> = REPORT_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        columns.extend(self.attribute_names.iter().cloned());

        let number = |v: Option<f64>| v.map(|x| x.to_string());
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    Some(row.node_id.clone()),
                    row.name.clone(),
                    Some(row.kind.to_string()),
                    number(row.in_degree),
                    number(row.out_degree),
                    number(row.eigenvector),
                ];
                cells.extend(row.attributes.iter().cloned());
                cells
            })
            .collect();

        Table::with_rows(columns, rows)
    }
}
