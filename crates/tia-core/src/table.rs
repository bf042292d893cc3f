//! In-memory tables and their CSV form.
//!
//! Every stage exchanges [`Table`]s: a header plus equally wide rows of
//! optional text cells. On disk a table is a CSV file with every field
//! quoted; a null cell is written as an empty field and read back as null.
//! CSV cannot tell an empty string from a null, so tables store an empty
//! string as null too; a table reads back exactly as it was written.

use std::fs;
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::error::TiaError;

/// One table cell. `None` is a null (missing) value.
pub type Cell = Option<String>;

/// One table row aligned to a header.
pub type FlatRow = Vec<Cell>;

/// A header and its rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRow>,
}

impl Table {
    #[must_use]
    pub const fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from prepared rows. Empty-string cells become null.
    #[must_use]
    pub fn with_rows(columns: Vec<String>, mut rows: Vec<FlatRow>) -> Self {
        for row in &mut rows {
            null_empty_cells(row);
        }
        Self { columns, rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Read a cell by row index and column name.
    ///
    /// A column the table does not have reads as null.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Resolve a column name into an accessor usable across many rows.
    #[must_use]
    pub fn accessor(&self, column: &str) -> ColumnRef {
        ColumnRef(self.column(column))
    }

    /// Append a row. The row must be exactly as wide as the header.
    /// Empty-string cells become null.
    ///
    /// # Errors
    ///
    /// Returns [`TiaError::RowWidth`] on a width mismatch.
    pub fn push(&mut self, mut row: FlatRow) -> Result<(), TiaError> {
        if row.len() != self.columns.len() {
            return Err(TiaError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        null_empty_cells(&mut row);
        self.rows.push(row);
        Ok(())
    }

    /// Write the table as an all-quoted CSV file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv(&self, path: &Path) -> Result<(), TiaError> {
        write_csv_rows(path, &self.columns, self.rows.iter())
    }

    /// Read a CSV file written by [`Table::write_csv`].
    ///
    /// Empty fields become null cells. Rows must match the header width.
    ///
    /// # Errors
    ///
    /// Returns [`TiaError::InputMissing`] if the file does not exist, or a
    /// CSV error if it cannot be parsed.
    pub fn read_csv(path: &Path) -> Result<Self, TiaError> {
        if !path.exists() {
            return Err(TiaError::InputMissing {
                path: path.to_path_buf(),
            });
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| TiaError::csv(path, e))?;

        let columns = reader
            .headers()
            .map_err(|e| TiaError::csv(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut table = Self::new(columns);
        for record in reader.records() {
            let record = record.map_err(|e| TiaError::csv(path, e))?;
            let row = record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect();
            table.push(row)?;
        }

        debug!(path = %path.display(), rows = table.len(), "read table");
        Ok(table)
    }
}

fn null_empty_cells(row: &mut [Cell]) {
    for cell in row {
        if cell.as_deref() == Some("") {
            *cell = None;
        }
    }
}

/// A resolved column position; reads null when the column is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef(Option<usize>);

impl ColumnRef {
    #[must_use]
    pub fn get<'a>(&self, row: &'a [Cell]) -> Option<&'a str> {
        row.get(self.0?)?.as_deref()
    }

    #[must_use]
    pub fn cell(&self, row: &[Cell]) -> Cell {
        self.get(row).map(str::to_string)
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

/// Stream rows into an all-quoted CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row cannot be written.
pub fn write_csv_rows<'a, I>(path: &Path, columns: &[String], rows: I) -> Result<(), TiaError>
where
    I: IntoIterator<Item = &'a FlatRow>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TiaError::io(parent, e))?;
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(path)
        .map_err(|e| TiaError::csv(path, e))?;

    writer
        .write_record(columns)
        .map_err(|e| TiaError::csv(path, e))?;

    let mut count = 0usize;
    for row in rows {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(|e| TiaError::csv(path, e))?;
        count += 1;
    }

    writer.flush().map_err(|e| TiaError::io(path, e))?;
    debug!(path = %path.display(), rows = count, "wrote table");
    Ok(())
}
