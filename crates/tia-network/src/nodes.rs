//! Actor nodes: authors and companies.
//!
//! Authors come from the post author columns followed by the comment author
//! columns, deduplicated on the whole `(id, name, roles)` tuple, so an author
//! who renamed themselves between posts yields two rows with one id.
//! Companies come from the post-companies side table, deduplicated on
//! `(id, name, founded)`.
//!
//! Node tables are written as `index_id, id, label, <attributes>, type`.

use std::collections::BTreeSet;

use tia_core::config::ColumnNames;
use tia_core::dedupe::dedupe_by_columns;
use tia_core::table::{Cell, FlatRow, Table};
use tracing::{debug, info, instrument};

use crate::edges::ActorKind;
use crate::error::NetworkError;

const INDEX_COLUMN: &str = "index_id";
const ID_COLUMN: &str = "id";
const LABEL_COLUMN: &str = "label";
const TYPE_COLUMN: &str = "type";

/// One actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub index: usize,
    pub id: String,
    /// Display name (authors) or company name.
    pub label: Cell,
    pub kind: ActorKind,
    /// Extra columns carried into the report, e.g. `author_roles`.
    pub attributes: Vec<(String, Cell)>,
}

impl Node {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }
}

/// Every company and author node of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    pub companies: Vec<Node>,
    pub authors: Vec<Node>,
}

/// Turn `[id, label, attr…]` rows into numbered nodes, skipping null ids.
fn number_nodes(rows: Vec<FlatRow>, kind: ActorKind, attributes: &[String]) -> Vec<Node> {
    let mut skipped = 0usize;
    let nodes: Vec<Node> = rows
        .into_iter()
        .filter_map(|row| {
            let mut cells = row.into_iter();
            let Some(id) = cells.next().flatten() else {
                skipped += 1;
                return None;
            };
            let label = cells.next().flatten();
            Some((id, label, cells.collect::<Vec<_>>()))
        })
        .enumerate()
        .map(|(index, (id, label, rest))| Node {
            index,
            id,
            label,
            kind,
            attributes: attributes.iter().cloned().zip(rest).collect(),
        })
        .collect();

    if skipped > 0 {
        debug!(kind = %kind, skipped, "skipped node rows without an id");
    }
    nodes
}

fn project(table: &Table, columns: &[&str]) -> Vec<FlatRow> {
    let refs: Vec<_> = columns.iter().map(|c| table.accessor(c)).collect();
    table
        .rows
        .iter()
        .map(|row| refs.iter().map(|r| r.cell(row)).collect())
        .collect()
}

impl NodeSet {
    /// Derive author and company nodes from the staging tables.
    #[must_use]
    #[instrument(skip_all)]
    pub fn derive(posts: &Table, companies: &Table, comments: &Table, cols: &ColumnNames) -> Self {
        let mut author_rows = project(
            posts,
            &[cols.post_author_id.as_str(), cols.author_name.as_str(), cols.author_roles.as_str()],
        );
        author_rows.extend(project(
            comments,
            &[cols.comment_author_id.as_str(), cols.author_name.as_str(), cols.author_roles.as_str()],
        ));
        let authors = number_nodes(
            dedupe_by_columns(author_rows, &[0, 1, 2]),
            ActorKind::Author,
            std::slice::from_ref(&cols.author_roles),
        );

        let company_rows = project(
            companies,
            &[cols.company_id.as_str(), cols.company_name.as_str(), cols.company_founded.as_str()],
        );
        let companies = number_nodes(
            dedupe_by_columns(company_rows, &[0, 1, 2]),
            ActorKind::Company,
            std::slice::from_ref(&cols.company_founded),
        );

        info!(
            authors = authors.len(),
            companies = companies.len(),
            "derived nodes"
        );
        Self { companies, authors }
    }

    /// Companies first, then authors.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.companies.iter().chain(&self.authors)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.companies.len() + self.authors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty() && self.authors.is_empty()
    }

    /// Sorted union of attribute names across every node.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        self.iter()
            .flat_map(|n| n.attributes.iter().map(|(name, _)| name.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[must_use]
    pub fn authors_table(&self) -> Table {
        nodes_table(&self.authors)
    }

    #[must_use]
    pub fn companies_table(&self) -> Table {
        nodes_table(&self.companies)
    }

    /// Rebuild a node set from the two node tables.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownKind`] if a `type` cell is not a known
    /// actor kind.
    pub fn from_tables(companies: &Table, authors: &Table) -> Result<Self, NetworkError> {
        Ok(Self {
            companies: nodes_from_table(companies)?,
            authors: nodes_from_table(authors)?,
        })
    }
}

/// Render nodes of one kind as a node table.
///
/// The attribute columns are taken from the first node; every node of one
/// kind carries the same attribute names.
#[must_use]
pub fn nodes_table(nodes: &[Node]) -> Table {
    let attributes: Vec<String> = nodes
        .first()
        .map(|n| n.attributes.iter().map(|(name, _)| name.clone()).collect())
        .unwrap_or_default();

    let mut columns = vec![
        INDEX_COLUMN.to_string(),
        ID_COLUMN.to_string(),
        LABEL_COLUMN.to_string(),
    ];
    columns.extend(attributes.iter().cloned());
    columns.push(TYPE_COLUMN.to_string());

    let rows = nodes
        .iter()
        .map(|node| {
            let mut row = vec![
                Some(node.index.to_string()),
                Some(node.id.clone()),
                node.label.clone(),
            ];
            row.extend(attributes.iter().map(|a| node.attribute(a).map(str::to_string)));
            row.push(Some(node.kind.to_string()));
            row
        })
        .collect();

    Table::with_rows(columns, rows)
}

/// Parse a node table written by [`nodes_table`].
///
/// Every column other than `index_id`, `id`, `label` and `type` is an
/// attribute. Rows without an id are skipped.
///
/// # Errors
///
/// Returns [`NetworkError::UnknownKind`] on an unrecognised `type` cell.
pub fn nodes_from_table(table: &Table) -> Result<Vec<Node>, NetworkError> {
    let index = table.accessor(INDEX_COLUMN);
    let id = table.accessor(ID_COLUMN);
    let label = table.accessor(LABEL_COLUMN);
    let kind = table.accessor(TYPE_COLUMN);
    let attributes: Vec<(String, _)> = table
        .columns
        .iter()
        .filter(|c| ![INDEX_COLUMN, ID_COLUMN, LABEL_COLUMN, TYPE_COLUMN].contains(&c.as_str()))
        .map(|c| (c.clone(), table.accessor(c)))
        .collect();

    let mut nodes = Vec::with_capacity(table.len());
    for (i, row) in table.rows.iter().enumerate() {
        let Some(node_id) = id.get(row) else {
            continue;
        };
        let kind_text = kind.get(row).unwrap_or_default();
        let node_kind = ActorKind::parse(kind_text).ok_or_else(|| NetworkError::UnknownKind {
            column: TYPE_COLUMN,
            value: kind_text.to_string(),
            row: i,
        })?;
        nodes.push(Node {
            index: index.get(row).and_then(|v| v.parse().ok()).unwrap_or(i),
            id: node_id.to_string(),
            label: label.cell(row),
            kind: node_kind,
            attributes: attributes
                .iter()
                .map(|(name, col)| (name.clone(), col.cell(row)))
                .collect(),
        });
    }
    Ok(nodes)
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

    fn fixture() -> NodeSet {
        let posts = table(
            &["id", "author_id", "author_display_name", "author_roles"],
            &[
                &[Some("1"), Some("A"), Some("Ann"), Some(r#"["author"]"#)],
                &[Some("2"), Some("A"), Some("Ann"), Some(r#"["author"]"#)],
                &[Some("3"), None, Some("Ghost"), None],
            ],
        );
        let companies = table(
            &["date_founded", "id", "name", "post_id"],
            &[
                &[Some("2015"), Some("C"), Some("Acme"), Some("1")],
                &[Some("2015"), Some("C"), Some("Acme"), Some("2")],
                &[None, Some("D"), Some("Beta"), Some("2")],
            ],
        );
        let comments = table(
            &["id", "author_id", "author_display_name", "author_roles"],
            &[
                &[Some("10"), Some("B"), Some("Bob"), Some("[]")],
                &[Some("11"), Some("A"), Some("Ann"), Some(r#"["author"]"#)],
                &[Some("12"), Some("A"), Some("Ann K"), Some(r#"["author"]"#)],
            ],
        );
        NodeSet::derive(&posts, &companies, &comments, &ColumnNames::default())
    }

    #[test]
    fn authors_deduplicate_on_full_tuple() {
        let nodes = fixture();
        let authors: Vec<_> = nodes
            .authors
            .iter()
            .map(|n| (n.index, n.id.as_str(), n.label.as_deref()))
            .collect();
        assert_eq!(
            authors,
            [(0, "A", Some("Ann")), (1, "B", Some("Bob")), (2, "A", Some("Ann K"))]
        );
        assert_eq!(nodes.authors[0].attribute("author_roles"), Some(r#"["author"]"#));
    }

    #[test]
    fn companies_deduplicate_and_keep_founding_date() {
        let nodes = fixture();
        assert_eq!(nodes.companies.len(), 2);
        assert_eq!(nodes.companies[0].id, "C");
        assert_eq!(nodes.companies[0].attribute("date_founded"), Some("2015"));
        assert_eq!(nodes.companies[1].attribute("date_founded"), None);
        assert!(nodes.companies.iter().all(|n| n.kind == ActorKind::Company));
    }

    #[test]
    fn iteration_lists_companies_first() {
        let nodes = fixture();
        let kinds: Vec<_> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(kinds[..2], [ActorKind::Company, ActorKind::Company]);
        assert!(kinds[2..].iter().all(|k| *k == ActorKind::Author));
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes.attribute_names(), ["author_roles", "date_founded"]);
    }

    #[test]
    fn node_table_layout() {
        let nodes = fixture();
        let authors = nodes.authors_table();
        assert_eq!(
            authors.columns,
            ["index_id", "id", "label", "author_roles", "type"]
        );
        assert_eq!(authors.value(1, "type"), Some("author"));

        let companies = nodes.companies_table();
        assert_eq!(
            companies.columns,
            ["index_id", "id", "label", "date_founded", "type"]
        );
        assert_eq!(companies.value(0, "label"), Some("Acme"));
    }

    #[test]
    fn node_tables_read_back() {
        let nodes = fixture();
        let back =
            NodeSet::from_tables(&nodes.companies_table(), &nodes.authors_table()).expect("parse");
        assert_eq!(back, nodes);
    }

    #[test]
    fn empty_inputs_give_header_only_tables() {
        let empty = table(&["id"], &[]);
        let nodes = NodeSet::derive(&empty, &empty, &empty, &ColumnNames::default());
        assert!(nodes.is_empty());
        assert_eq!(nodes.authors_table().columns, ["index_id", "id", "label", "type"]);
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let bad = table(
            &["index_id", "id", "label", "type"],
            &[&[Some("0"), Some("A"), None, Some("robot")]],
        );
        assert!(nodes_from_table(&bad).is_err());
    }
}
