//! First-occurrence deduplication of rows.
//!
//! Comment pages overlap (the same thread is served on several pages, and a
//! reply can appear both nested and at top level), so the flattened comment
//! table repeats ids. [`Dedupe`] keeps the first row for every key and drops
//! every later one, no matter how far apart the repeats are.

use std::collections::HashSet;

use crate::table::{Cell, FlatRow, Table};

/// Streaming first-occurrence filter over rows keyed by one column.
///
/// Rows are keyed by the cell text of `key_column`; a null cell is its own
/// key, so only the first null-keyed row survives.
#[derive(Debug)]
pub struct Dedupe<I> {
    rows: I,
    key_column: usize,
    seen: HashSet<Cell>,
}

impl<I> Dedupe<I>
where
    I: Iterator<Item = FlatRow>,
{
    pub fn new(rows: I, key_column: usize) -> Self {
        Self {
            rows,
            key_column,
            seen: HashSet::new(),
        }
    }
}

impl<I> Iterator for Dedupe<I>
where
    I: Iterator<Item = FlatRow>,
{
    type Item = FlatRow;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.rows.next()?;
            let key = row.get(self.key_column).cloned().flatten();
            if self.seen.insert(key) {
                return Some(row);
            }
        }
    }
}

/// Keep the first row for each value of `key_column`, preserving order.
#[must_use]
pub fn dedupe_by_key(rows: Vec<FlatRow>, key_column: usize) -> Vec<FlatRow> {
    Dedupe::new(rows.into_iter(), key_column).collect()
}

/// Keep the first row for each distinct tuple of `columns`, preserving order.
#[must_use]
pub fn dedupe_by_columns(rows: Vec<FlatRow>, columns: &[usize]) -> Vec<FlatRow> {
    let mut seen: HashSet<Vec<Cell>> = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let key = columns
                .iter()
                .map(|&c| row.get(c).cloned().flatten())
                .collect();
            seen.insert(key)
        })
        .collect()
}

/// Deduplicate a table on its first column (the `id` column).
#[must_use]
pub fn dedupe_table(table: Table) -> Table {
    let Table { columns, rows } = table;
    Table::with_rows(columns, dedupe_by_key(rows, 0))
}
