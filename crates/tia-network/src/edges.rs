//! Edge derivation: three join rules over the staging tables.
//!
//! Every rule is a relational inner join on string cells. Output order is
//! left-table row order, then right-table row order within one join key. A
//! null join key never matches, and a column a table lacks reads as null.
//!
//! 1. **author → company via post**: posts ⋈ companies on the post id.
//! 2. **author → company via comment**: the rule-1 `(post, company)` pairs
//!    ⋈ top-level comments (`parent == "0"`) on the post id.
//! 3. **author → author via reply**: comments ⋈ comments on
//!    `parent == id`, replies only (`parent != "0"`).

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tia_core::config::ColumnNames;
use tia_core::table::{Cell, ColumnRef, FlatRow, Table};
use tracing::{info, instrument};

use crate::error::NetworkError;

/// Column header of the edge table.
pub const EDGE_COLUMNS: [&str; 7] = [
    "index_id",
    "source",
    "target",
    "label",
    "source_type",
    "target_type",
    "edge_type",
];

/// Kind of actor at either end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Author,
    Company,
}

impl ActorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Company => "company",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "author" => Some(Self::Author),
            "company" => Some(Self::Company),
            _ => None,
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship an edge was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Post,
    Comment,
}

impl EdgeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(Self::Post),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed relationship between two actors.
///
/// Endpoints are raw cells: a join can pair a row whose author id is null,
/// and such an edge is still written out. The graph builder skips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub index: usize,
    pub source: Cell,
    pub target: Cell,
    /// Post title (rule 1) or comment excerpt (rules 2 and 3).
    pub label: Cell,
    pub source_type: ActorKind,
    pub target_type: ActorKind,
    pub edge_type: EdgeType,
}

impl Edge {
    fn row(&self) -> FlatRow {
        vec![
            Some(self.index.to_string()),
            self.source.clone(),
            self.target.clone(),
            self.label.clone(),
            Some(self.source_type.to_string()),
            Some(self.target_type.to_string()),
            Some(self.edge_type.to_string()),
        ]
    }
}

/// An edge before its position in the final list is known.
struct Pending {
    source: Cell,
    target: Cell,
    label: Cell,
    source_type: ActorKind,
    target_type: ActorKind,
    edge_type: EdgeType,
}

/// Row indices of `table` grouped by the non-null value of `key`, each
/// group in row order. `keep` filters rows before indexing.
fn index_rows<'a>(
    table: &'a Table,
    key: ColumnRef,
    keep: impl Fn(&[Cell]) -> bool,
) -> HashMap<&'a str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in table.rows.iter().enumerate() {
        if let Some(k) = key.get(row).filter(|_| keep(row.as_slice())) {
            index.entry(k).or_default().push(i);
        }
    }
    index
}

/// A `(post id, company id)` pair produced by rule 1.
struct PostCompany<'a> {
    post: &'a str,
    company: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Rule 1: author → company through a post that mentions the company.
///
/// Also returns the matched `(post, company)` pairs, in output order, for
/// rule 2 to join against.
fn post_edges<'a>(
    posts: &'a Table,
    companies: &'a Table,
    cols: &ColumnNames,
) -> (Vec<Pending>, Vec<PostCompany<'a>>) {
    let post_id = posts.accessor(&cols.post_id);
    let author = posts.accessor(&cols.post_author_id);
    let title = posts.accessor(&cols.post_title);
    let company_id = companies.accessor(&cols.company_id);
    let by_post = index_rows(companies, companies.accessor(&cols.company_post), |_| true);

    let mut edges = Vec::new();
    let mut pairs = Vec::new();
    for post in &posts.rows {
        let Some(pid) = post_id.get(post) else {
            continue;
        };
        for &c in by_post.get(pid).into_iter().flatten() {
            let company = &companies.rows[c];
            edges.push(Pending {
                source: author.cell(post),
                target: company_id.cell(company),
                label: title.cell(post),
                source_type: ActorKind::Author,
                target_type: ActorKind::Company,
                edge_type: EdgeType::Post,
            });
            pairs.push(PostCompany {
                post: pid,
                company: company_id.get(company),
            });
        }
    }
    (edges, pairs)
}

/// Rule 2: commenter → company for top-level comments on a company post.
fn comment_company_edges(
    pairs: &[PostCompany<'_>],
    comments: &Table,
    cols: &ColumnNames,
) -> Vec<Pending> {
    let parent = comments.accessor(&cols.comment_parent);
    let author = comments.accessor(&cols.comment_author_id);
    let excerpt = comments.accessor(&cols.comment_excerpt);
    let top_level = cols.top_level_parent.as_str();
    let by_post = index_rows(comments, comments.accessor(&cols.comment_post), |row| {
        parent.get(row) == Some(top_level)
    });

    let mut edges = Vec::new();
    for pair in pairs {
        for &c in by_post.get(pair.post).into_iter().flatten() {
            let comment = &comments.rows[c];
            edges.push(Pending {
                source: author.cell(comment),
                target: pair.company.map(str::to_string),
                label: excerpt.cell(comment),
                source_type: ActorKind::Author,
                target_type: ActorKind::Company,
                edge_type: EdgeType::Comment,
            });
        }
    }
    edges
}

/// Rule 3: replier → author of the comment replied to.
fn reply_edges(comments: &Table, cols: &ColumnNames) -> Vec<Pending> {
    let parent = comments.accessor(&cols.comment_parent);
    let author = comments.accessor(&cols.comment_author_id);
    let excerpt = comments.accessor(&cols.comment_excerpt);
    let top_level = cols.top_level_parent.as_str();
    let by_id = index_rows(comments, comments.accessor(&cols.comment_id), |_| true);

    let mut edges = Vec::new();
    for reply in &comments.rows {
        let Some(pid) = parent.get(reply).filter(|p| *p != top_level) else {
            continue;
        };
        for &p in by_id.get(pid).into_iter().flatten() {
            edges.push(Pending {
                source: author.cell(reply),
                target: author.cell(&comments.rows[p]),
                label: excerpt.cell(reply),
                source_type: ActorKind::Author,
                target_type: ActorKind::Author,
                edge_type: EdgeType::Comment,
            });
        }
    }
    edges
}

/// Derive every edge: rule 1, then rule 2, then rule 3, numbered from 0.
///
/// `comments` should be the deduplicated comment table; a repeated comment
/// id would repeat its edges.
#[must_use]
#[instrument(skip_all, fields(posts = posts.len(), companies = companies.len(), comments = comments.len()))]
pub fn build_edges(
    posts: &Table,
    companies: &Table,
    comments: &Table,
    cols: &ColumnNames,
) -> Vec<Edge> {
    let (via_post, pairs) = post_edges(posts, companies, cols);
    let via_comment = comment_company_edges(&pairs, comments, cols);
    let via_reply = reply_edges(comments, cols);

    info!(
        post = via_post.len(),
        comment = via_comment.len(),
        reply = via_reply.len(),
        "derived edges"
    );

    via_post
        .into_iter()
        .chain(via_comment)
        .chain(via_reply)
        .enumerate()
        .map(|(index, p)| Edge {
            index,
            source: p.source,
            target: p.target,
            label: p.label,
            source_type: p.source_type,
            target_type: p.target_type,
            edge_type: p.edge_type,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Edge table
// ---------------------------------------------------------------------------

/// Render edges as the `edges.csv` table.
#[must_use]
pub fn edges_table(edges: &[Edge]) -> Table {
    Table::with_rows(
        EDGE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
        edges.iter().map(Edge::row).collect(),
    )
}

fn parse_kind<T>(
    value: Option<&str>,
    column: &'static str,
    row: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, NetworkError> {
    let value = value.unwrap_or_default();
    parse(value).ok_or_else(|| NetworkError::UnknownKind {
        column,
        value: value.to_string(),
        row,
    })
}

/// Read edges back from an `edges.csv` table.
///
/// A missing or unparsable `index_id` falls back to the row position.
///
/// # Errors
///
/// Returns [`NetworkError::UnknownKind`] if a type column holds a value other
/// than the known actor or edge kinds.
pub fn edges_from_table(table: &Table) -> Result<Vec<Edge>, NetworkError> {
    let index = table.accessor("index_id");
    let source = table.accessor("source");
    let target = table.accessor("target");
    let label = table.accessor("label");
    let source_type = table.accessor("source_type");
    let target_type = table.accessor("target_type");
    let edge_type = table.accessor("edge_type");

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(Edge {
                index: index.get(row).and_then(|v| v.parse().ok()).unwrap_or(i),
                source: source.cell(row),
                target: target.cell(row),
                label: label.cell(row),
                source_type: parse_kind(source_type.get(row), "source_type", i, ActorKind::parse)?,
                target_type: parse_kind(target_type.get(row), "target_type", i, ActorKind::parse)?,
                edge_type: parse_kind(edge_type.get(row), "edge_type", i, EdgeType::parse)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[Option<&str>]]) -> Table {
        Table::with_rows(
            columns.iter().map(|c| (*c).to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        )
    }

    fn posts() -> Table {
        table(
            &["id", "title", "author_id"],
            &[
                &[Some("1"), Some("Acme raises"), Some("A")],
                &[Some("2"), Some("No company"), Some("B")],
            ],
        )
    }

    fn companies() -> Table {
        table(
            &["date_founded", "id", "name", "post_id"],
            &[&[Some("2015"), Some("C"), Some("Acme"), Some("1")]],
        )
    }

    fn comments(rows: &[&[Option<&str>]]) -> Table {
        table(&["id", "post", "parent", "author_id", "excerpt"], rows)
    }

    fn endpoints(edges: &[Edge]) -> Vec<(Option<&str>, Option<&str>, EdgeType)> {
        edges
            .iter()
            .map(|e| (e.source.as_deref(), e.target.as_deref(), e.edge_type))
            .collect()
    }

    #[test]
    fn rule_one_links_post_author_to_company() {
        let edges = build_edges(&posts(), &companies(), &comments(&[]), &ColumnNames::default());
        assert_eq!(endpoints(&edges), [(Some("A"), Some("C"), EdgeType::Post)]);
        assert_eq!(edges[0].label.as_deref(), Some("Acme raises"));
        assert_eq!(edges[0].source_type, ActorKind::Author);
        assert_eq!(edges[0].target_type, ActorKind::Company);
    }

    #[test]
    fn post_without_company_produces_no_edge() {
        let posts = table(&["id", "author_id"], &[&[Some("2"), Some("B")]]);
        let edges = build_edges(&posts, &companies(), &comments(&[]), &ColumnNames::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn rule_two_only_uses_top_level_comments_on_company_posts() {
        let comments = comments(&[
            &[Some("10"), Some("1"), Some("0"), Some("X"), Some("nice")],
            &[Some("11"), Some("1"), Some("10"), Some("Y"), Some("reply")],
            &[Some("12"), Some("2"), Some("0"), Some("Z"), Some("other post")],
        ]);
        let edges = build_edges(&posts(), &companies(), &comments, &ColumnNames::default());

        let via_comment: Vec<_> = edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Comment && e.target_type == ActorKind::Company)
            .collect();
        assert_eq!(via_comment.len(), 1);
        assert_eq!(via_comment[0].source.as_deref(), Some("X"));
        assert_eq!(via_comment[0].target.as_deref(), Some("C"));
        assert_eq!(via_comment[0].label.as_deref(), Some("nice"));
    }

    #[test]
    fn rule_two_repeats_per_company_link() {
        let companies = table(
            &["id", "name", "post_id"],
            &[
                &[Some("C"), Some("Acme"), Some("1")],
                &[Some("D"), Some("Beta"), Some("1")],
            ],
        );
        let comments = comments(&[&[Some("10"), Some("1"), Some("0"), Some("X"), Some("hi")]]);
        let edges = build_edges(&posts(), &companies, &comments, &ColumnNames::default());
        assert_eq!(
            endpoints(&edges),
            [
                (Some("A"), Some("C"), EdgeType::Post),
                (Some("A"), Some("D"), EdgeType::Post),
                (Some("X"), Some("C"), EdgeType::Comment),
                (Some("X"), Some("D"), EdgeType::Comment),
            ]
        );
    }

    #[test]
    fn rule_three_links_replier_to_parent_author() {
        let comments = comments(&[
            &[Some("10"), Some("1"), Some("0"), Some("A"), Some("root")],
            &[Some("11"), Some("1"), Some("10"), Some("B"), Some("reply")],
        ]);
        let posts = table(&["id"], &[]);
        let edges = build_edges(&posts, &companies(), &comments, &ColumnNames::default());
        assert_eq!(endpoints(&edges), [(Some("B"), Some("A"), EdgeType::Comment)]);
        assert_eq!(edges[0].target_type, ActorKind::Author);
        assert_eq!(edges[0].label.as_deref(), Some("reply"));
    }

    #[test]
    fn reply_to_unknown_parent_is_dropped() {
        let comments = comments(&[&[Some("11"), Some("1"), Some("99"), Some("B"), None]]);
        let edges = build_edges(&table(&["id"], &[]), &companies(), &comments, &ColumnNames::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn null_join_keys_never_match() {
        let posts = table(&["id", "author_id"], &[&[None, Some("A")]]);
        let companies = table(&["id", "post_id"], &[&[Some("C"), None]]);
        let comments = comments(&[
            &[None, Some("1"), Some("5"), Some("A"), None],
            &[Some("5"), Some("1"), None, Some("B"), None],
        ]);
        let edges = build_edges(&posts, &companies, &comments, &ColumnNames::default());
        assert!(edges.is_empty());
    }

    #[test]
    fn missing_columns_read_as_null() {
        // No author column on posts: the edge exists with a null source.
        let posts = table(&["id"], &[&[Some("1")]]);
        let edges = build_edges(&posts, &companies(), &comments(&[]), &ColumnNames::default());
        assert_eq!(endpoints(&edges), [(None, Some("C"), EdgeType::Post)]);
    }

    #[test]
    fn edges_are_numbered_across_rules() {
        let comments = comments(&[
            &[Some("10"), Some("1"), Some("0"), Some("X"), None],
            &[Some("11"), Some("1"), Some("10"), Some("Y"), None],
        ]);
        let edges = build_edges(&posts(), &companies(), &comments, &ColumnNames::default());
        let indices: Vec<_> = edges.iter().map(|e| e.index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(edges[2].edge_type, EdgeType::Comment);
        assert_eq!(edges[2].target_type, ActorKind::Author);
    }

    #[test]
    fn edge_table_reads_back() {
        let edges = build_edges(&posts(), &companies(), &comments(&[]), &ColumnNames::default());
        let table = edges_table(&edges);
        assert_eq!(table.columns, EDGE_COLUMNS);
        assert_eq!(table.value(0, "edge_type"), Some("post"));
        assert_eq!(edges_from_table(&table).expect("parse"), edges);
    }

    #[test]
    fn unknown_edge_type_is_rejected() {
        let table = table(
            &EDGE_COLUMNS,
            &[&[Some("0"), Some("A"), Some("C"), None, Some("author"), Some("company"), Some("like")]],
        );
        let err = edges_from_table(&table).expect_err("bad edge type");
        assert!(matches!(
            err,
            NetworkError::UnknownKind { column: "edge_type", row: 0, .. }
        ));
    }
}
