//! Loading crawled JSON snapshots from disk.
//!
//! An input directory holds one JSON document per crawled page. Each document
//! carries a top-level `posts` or `comments` array; documents without the
//! expected key contribute nothing. Files are visited in sorted path order so
//! a run over the same snapshot always sees records in the same order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::TiaError;
use crate::value::{RawRecord, RecordKind, dismantle};

/// List the regular files of `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`TiaError::InputMissing`] if `dir` does not exist, or an I/O
/// error if it cannot be listed.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>, TiaError> {
    if !dir.is_dir() {
        return Err(TiaError::InputMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| TiaError::io(dir, e))? {
        let path = entry.map_err(|e| TiaError::io(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse a JSON document with no nesting limit.
///
/// Reply threads nest without bound, so serde_json's recursion limit is
/// lifted and the parser grows its stack on the heap as needed.
fn parse_unbounded(text: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Parse one input document and return its records of `kind`.
///
/// Array elements that are not JSON objects are skipped. Records may nest
/// to any depth.
///
/// # Errors
///
/// Malformed JSON is fatal: returns [`TiaError::MalformedJson`].
pub fn read_document(path: &Path, kind: RecordKind) -> Result<Vec<RawRecord>, TiaError> {
    let text = fs::read_to_string(path).map_err(|e| TiaError::io(path, e))?;
    let doc = parse_unbounded(&text).map_err(|source| TiaError::MalformedJson {
        path: path.to_path_buf(),
        source,
    })?;

    let records = match doc {
        Value::Object(mut map) => {
            let items = map.remove(kind.key());
            dismantle(Value::Object(map));
            match items {
                Some(Value::Array(items)) => {
                    items.into_iter().filter_map(RawRecord::from_value).collect()
                }
                Some(other) => {
                    dismantle(other);
                    Vec::new()
                }
                None => Vec::new(),
            }
        }
        other => {
            dismantle(other);
            Vec::new()
        }
    };

    debug!(path = %path.display(), kind = %kind, records = records.len(), "read document");
    Ok(records)
}

/// Load every record of `kind` from the documents in `dir`.
///
/// # Errors
///
/// Fails if the directory is missing or any document is malformed.
#[instrument]
pub fn load_records(dir: &Path, kind: RecordKind) -> Result<Vec<RawRecord>, TiaError> {
    let files = list_input_files(dir)?;
    let mut records = Vec::new();
    for file in &files {
        records.extend(read_document(file, kind)?);
    }
    info!(files = files.len(), records = records.len(), kind = %kind, "loaded records");
    Ok(records)
}

/// Collect the `id` of every post in `dir`, sorted ascending.
///
/// Numeric ids sort numerically; ids that are not integers are dropped.
///
/// # Errors
///
/// Fails if the directory is missing or any document is malformed.
pub fn collect_post_ids(dir: &Path) -> Result<Vec<u64>, TiaError> {
    let mut ids: Vec<u64> = load_records(dir, RecordKind::Posts)?
        .iter()
        .filter_map(|post| match post.field("id")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .collect();
    ids.sort_unstable();
    Ok(ids)
}
