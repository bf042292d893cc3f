//! Schema discovery over semi-structured records.
//!
//! Field names are not known ahead of time: the crawler stores whatever the
//! API returned. A [`Schema`] is the union of top-level keys seen across all
//! records of one kind, with `id` pinned to the first column and the rest
//! sorted so that every run over the same snapshot produces the same column
//! layout. A [`SubSchema`] does the same for one nested object or list key.

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;
use tracing::debug;

use crate::value::RawRecord;

/// Name of the identifier column, always first.
pub const ID_FIELD: &str = "id";

/// Ordered top-level column names for one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    /// Build a schema from explicit field names (used by tests and fixtures).
    ///
    /// `id` is moved (or inserted) to the front; the rest keep their order.
    #[must_use]
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = vec![ID_FIELD.to_string()];
        out.extend(
            fields
                .into_iter()
                .map(Into::into)
                .filter(|f: &String| f != ID_FIELD),
        );
        Self { fields: out }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of columns; at least one, since `id` is always present.
    #[must_use]
    pub fn width(&self) -> usize {
        self.fields.len()
    }
}

/// Sorted field names of one nested object or list of objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubSchema {
    key: String,
    fields: Vec<String>,
}

impl SubSchema {
    #[must_use]
    pub fn new<S: Into<String>>(
        key: impl Into<String>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            key: key.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The nested key this sub-schema describes (e.g. `author`).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Prefixed column names: `author` + `id` → `author_id`.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| format!("{}_{f}", self.key))
            .collect()
    }
}

/// Discover the top-level schema of `records`.
///
/// The result is the union of all keys minus `exclude`, with `id` first and
/// the remaining names sorted. Excluding a name that never appeared is a
/// no-op.
#[must_use]
pub fn discover<'a, I>(records: I, exclude: &[String]) -> Schema
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut keys: BTreeSet<String> = BTreeSet::new();
    for record in records {
        keys.extend(record.keys().map(str::to_string));
    }

    for name in exclude {
        if !keys.remove(name) {
            debug!(field = %name, "excluded field not present in input");
        }
    }
    keys.remove(ID_FIELD);

    let mut fields = Vec::with_capacity(keys.len() + 1);
    fields.push(ID_FIELD.to_string());
    fields.extend(keys);
    Schema { fields }
}

/// Discover the sorted field names found under `key` across `records`.
///
/// An object value contributes its keys; a list contributes the keys of every
/// object element. Anything else contributes nothing.
#[must_use]
pub fn discover_sub<'a, I>(records: I, key: &str) -> SubSchema
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut fields: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        match record.field(key) {
            Some(Value::Object(map)) => fields.extend(map.keys().map(String::as_str)),
            Some(Value::Array(items)) => {
                for item in items.iter().filter_map(Value::as_object) {
                    fields.extend(item.keys().map(String::as_str));
                }
            }
            _ => {}
        }
    }
    SubSchema::new(key, fields)
}

/// Header names that occur more than once, in order of their repeat.
#[must_use]
pub fn duplicate_headers(headers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .filter(|h| !seen.insert(h.as_str()))
        .cloned()
        .collect()
}
