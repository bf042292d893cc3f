//! Semi-structured records loaded from crawled JSON.
//!
//! A [`RawRecord`] wraps one JSON object (a post or a comment). Field access
//! never panics and never reflects: every lookup returns an `Option`, and the
//! caller decides what a missing field means (almost always a null cell).

use serde_json::{Map, Value};

use crate::table::Cell;

/// Which top-level array of an input document a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Posts,
    Comments,
}

impl RecordKind {
    /// Key of the top-level array holding records of this kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Comments => "comments",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One post or comment object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value if it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Top-level field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Look up a top-level field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Look up a field that is expected to hold a nested object.
    ///
    /// Returns `None` when the field is absent or holds anything other
    /// than an object (including `null`).
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }

    /// Look up a field that is expected to hold a list.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<&Vec<Value>> {
        self.0.get(name).and_then(Value::as_array)
    }

    /// Encode a top-level field as a table cell.
    #[must_use]
    pub fn cell(&self, name: &str) -> Cell {
        self.field(name).and_then(to_cell)
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Drop for RawRecord {
    fn drop(&mut self) {
        dismantle(Value::Object(std::mem::take(&mut self.0)));
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Drop a JSON value of any depth without recursing.
///
/// `Value`'s own destructor recurses once per nesting level, which overflows
/// the stack on reply threads thousands of levels deep. Containers are
/// emptied onto a work list instead, so every value is dropped shallow.
pub fn dismantle(value: Value) {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }
}

/// Encode a JSON value as a scalar cell.
///
/// `null` and the empty string are a missing cell, other strings are kept
/// verbatim, and anything nested is serialized to compact JSON so it can be
/// parsed back later.
#[must_use]
pub fn to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Encode a field of a nested object as a cell.
#[must_use]
pub fn object_cell(object: &Map<String, Value>, name: &str) -> Cell {
    object.get(name).and_then(to_cell)
}
