//! Flattening nested records into fixed-width rows.
//!
//! # Posts
//!
//! One post becomes exactly one row: its top-level scalars (per the post
//! [`Schema`]) followed by one segment per nested object (`author_*`,
//! `seo_*`, `sponsor_*`). List fields (`categories`, `companies`, `tags`)
//! are split out into side tables, one row per list element, with the parent
//! post id appended as a `post_id` join column.
//!
//! # Comments
//!
//! One comment becomes one row per node of its reply tree. The tree is
//! walked depth-first with an explicit stack: the comment itself, then each
//! entry of `children` (with that entry's whole subtree before its next
//! sibling), then each entry of `replies` in the same way. Every row uses the
//! same comment schema, so the output width never depends on nesting depth.

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::error::TiaError;
use crate::schema::{self, Schema, SubSchema};
use crate::table::{FlatRow, Table};
use crate::value::{RawRecord, object_cell};

/// Join column appended to every side-table row.
pub const POST_ID_COLUMN: &str = "post_id";

/// Cells for `schema` read from `object`; missing fields are null.
fn scalar_cells(object: &Map<String, Value>, fields: &[String], out: &mut FlatRow) {
    out.extend(fields.iter().map(|f| object_cell(object, f)));
}

/// Cells for one nested-object segment. Absent or non-object → all null.
fn nested_cells(object: &Map<String, Value>, sub: &SubSchema, out: &mut FlatRow) {
    match object.get(sub.key()).and_then(Value::as_object) {
        Some(nested) => scalar_cells(nested, sub.fields(), out),
        None => out.extend(std::iter::repeat_n(None, sub.len())),
    }
}

fn warn_on_duplicate_headers(headers: &[String]) {
    let dups = schema::duplicate_headers(headers);
    if !dups.is_empty() {
        warn!(?dups, "flattened headers collide; later columns shadow earlier ones on lookup");
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Flattens post records into a post row plus side-table rows.
#[derive(Debug, Clone)]
pub struct PostFlattener {
    schema: Schema,
    nested: Vec<SubSchema>,
    lists: Vec<SubSchema>,
}

/// Output of flattening one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedPost {
    /// The post's own row.
    pub row: FlatRow,
    /// Side rows per list key, in the flattener's list order.
    pub lists: Vec<Vec<FlatRow>>,
}

/// All post tables for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTables {
    pub posts: Table,
    /// `(list key, side table)` in configured order.
    pub side: Vec<(String, Table)>,
}

impl PostTables {
    /// Side table for a list key such as `companies`.
    #[must_use]
    pub fn side(&self, key: &str) -> Option<&Table> {
        self.side.iter().find(|(k, _)| k == key).map(|(_, t)| t)
    }
}

impl PostFlattener {
    #[must_use]
    pub const fn new(schema: Schema, nested: Vec<SubSchema>, lists: Vec<SubSchema>) -> Self {
        Self {
            schema,
            nested,
            lists,
        }
    }

    /// Discover the post schema and every sub-schema from `records`.
    #[must_use]
    pub fn discover(
        records: &[RawRecord],
        exclude: &[String],
        nested: &[String],
        lists: &[String],
    ) -> Self {
        let schema = schema::discover(records, exclude);
        let nested = nested
            .iter()
            .map(|key| schema::discover_sub(records, key))
            .collect();
        let lists = lists
            .iter()
            .map(|key| schema::discover_sub(records, key))
            .collect();
        Self::new(schema, nested, lists)
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Header of the post table.
    #[must_use]
    pub fn post_headers(&self) -> Vec<String> {
        let mut headers = self.schema.fields().to_vec();
        for sub in &self.nested {
            headers.extend(sub.headers());
        }
        headers
    }

    /// Header of the side table for `key`: element fields then `post_id`.
    #[must_use]
    pub fn side_headers(&self, key: &str) -> Option<Vec<String>> {
        let sub = self.lists.iter().find(|s| s.key() == key)?;
        Some(Self::list_headers(sub))
    }

    fn list_headers(sub: &SubSchema) -> Vec<String> {
        let mut headers = sub.fields().to_vec();
        headers.push(POST_ID_COLUMN.to_string());
        headers
    }

    /// Flatten one post.
    #[must_use]
    pub fn flatten(&self, record: &RawRecord) -> FlattenedPost {
        let object = record.as_map();

        let width = self.schema.width() + self.nested.iter().map(SubSchema::len).sum::<usize>();
        let mut row = Vec::with_capacity(width);
        scalar_cells(object, self.schema.fields(), &mut row);
        for sub in &self.nested {
            nested_cells(object, sub, &mut row);
        }

        let post_id = record.cell(schema::ID_FIELD);
        let lists = self
            .lists
            .iter()
            .map(|sub| {
                record
                    .list(sub.key())
                    .into_iter()
                    .flatten()
                    .map(|element| {
                        let mut side = Vec::with_capacity(sub.len() + 1);
                        match element.as_object() {
                            Some(map) => scalar_cells(map, sub.fields(), &mut side),
                            None => side.extend(std::iter::repeat_n(None, sub.len())),
                        }
                        side.push(post_id.clone());
                        side
                    })
                    .collect()
            })
            .collect();

        FlattenedPost { row, lists }
    }

    /// Flatten every post into the post table and its side tables.
    ///
    /// # Errors
    ///
    /// Returns an error only if a produced row does not match its header,
    /// which indicates a bug in header composition.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn flatten_all(&self, records: &[RawRecord]) -> Result<PostTables, TiaError> {
        let post_headers = self.post_headers();
        warn_on_duplicate_headers(&post_headers);

        let mut posts = Table::new(post_headers);
        let mut side: Vec<(String, Table)> = self
            .lists
            .iter()
            .map(|sub| (sub.key().to_string(), Table::new(Self::list_headers(sub))))
            .collect();

        for record in records {
            let flat = self.flatten(record);
            posts.push(flat.row)?;
            for ((_, table), rows) in side.iter_mut().zip(flat.lists) {
                for row in rows {
                    table.push(row)?;
                }
            }
        }

        info!(
            posts = posts.len(),
            side_rows = side.iter().map(|(_, t)| t.len()).sum::<usize>(),
            "flattened posts"
        );
        Ok(PostTables { posts, side })
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// Flattens comment records and their reply trees.
#[derive(Debug, Clone)]
pub struct CommentFlattener {
    schema: Schema,
    nested: Vec<SubSchema>,
    descend: Vec<String>,
}

impl CommentFlattener {
    /// `descend` lists the keys holding child comments, visited in order
    /// (normally `children` then `replies`).
    #[must_use]
    pub const fn new(schema: Schema, nested: Vec<SubSchema>, descend: Vec<String>) -> Self {
        Self {
            schema,
            nested,
            descend,
        }
    }

    /// Discover the comment schema and nested sub-schemas from `records`.
    ///
    /// Only top-level comments are scanned, so a field that appears solely
    /// on nested replies has no column.
    #[must_use]
    pub fn discover(
        records: &[RawRecord],
        exclude: &[String],
        nested: &[String],
        descend: &[String],
    ) -> Self {
        let schema = schema::discover(records, exclude);
        let nested = nested
            .iter()
            .map(|key| schema::discover_sub(records, key))
            .collect();
        Self::new(schema, nested, descend.to_vec())
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.schema.fields().to_vec();
        for sub in &self.nested {
            headers.extend(sub.headers());
        }
        headers
    }

    fn row(&self, object: &Map<String, Value>) -> FlatRow {
        let mut row = Vec::with_capacity(self.headers_len());
        scalar_cells(object, self.schema.fields(), &mut row);
        for sub in &self.nested {
            nested_cells(object, sub, &mut row);
        }
        row
    }

    fn headers_len(&self) -> usize {
        self.schema.width() + self.nested.iter().map(SubSchema::len).sum::<usize>()
    }

    /// Flatten one comment and every descendant, depth-first.
    #[must_use]
    pub fn flatten(&self, record: &RawRecord) -> Vec<FlatRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<&Map<String, Value>> = vec![record.as_map()];

        while let Some(object) = stack.pop() {
            rows.push(self.row(object));

            // Push in reverse so the first child of the first descend key
            // is popped next.
            for key in self.descend.iter().rev() {
                if let Some(Value::Array(items)) = object.get(key) {
                    stack.extend(items.iter().rev().filter_map(Value::as_object));
                }
            }
        }

        rows
    }

    /// Flatten every comment tree into one table.
    ///
    /// # Errors
    ///
    /// Returns an error only if a produced row does not match the header.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn flatten_all(&self, records: &[RawRecord]) -> Result<Table, TiaError> {
        let headers = self.headers();
        warn_on_duplicate_headers(&headers);

        let mut table = Table::new(headers);
        for record in records {
            for row in self.flatten(record) {
                table.push(row)?;
            }
        }

        info!(
            top_level = records.len(),
            rows = table.len(),
            "flattened comments"
        );
        Ok(table)
    }
}
