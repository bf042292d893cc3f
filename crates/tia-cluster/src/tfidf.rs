//! TF-IDF document vectors.
//!
//! - **terms**: tokens from [`Tokenizer`], stemmed unless disabled.
//! - **tf**: raw token count in the document.
//! - **idf**: smoothed, `ln((1 + n) / (1 + df)) + 1`, so a term present in
//!   every document still carries weight 1.
//! - Terms whose document frequency is above `max_df · n` or below
//!   `min_df · n` are dropped before weighting.
//! - Each row is scaled to unit L2 norm; a document with no kept terms is
//!   the zero vector.
//!
//! The vocabulary is sorted, so column `j` always names the same term for
//! the same corpus.

use std::collections::{BTreeMap, HashMap, HashSet};

use tia_core::config::ClusterConfig;
use tracing::debug;

use crate::error::ClusterError;
use crate::tokenize::Tokenizer;

/// Document-frequency limits, as fractions of the corpus size, and whether
/// tokens are stemmed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vectorizer {
    pub max_df: f64,
    pub min_df: f64,
    pub stem: bool,
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self {
            max_df: 0.5,
            min_df: 0.1,
            stem: true,
        }
    }
}

impl From<&ClusterConfig> for Vectorizer {
    fn from(cfg: &ClusterConfig) -> Self {
        Self {
            max_df: cfg.max_df,
            min_df: cfg.min_df,
            stem: cfg.stem,
        }
    }
}

/// Dense TF-IDF matrix: one row per document, one column per kept term.
#[derive(Debug, Clone, PartialEq)]
pub struct TfIdfMatrix {
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    pub rows: Vec<Vec<f64>>,
}

impl TfIdfMatrix {
    #[must_use]
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }
}

impl Vectorizer {
    /// Fit the vocabulary on `docs` and return their TF-IDF rows.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NoTerms`] if no term survives the
    /// document-frequency limits (including an empty corpus).
    #[allow(clippy::cast_precision_loss)]
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> Result<TfIdfMatrix, ClusterError> {
        let tokenizer = Tokenizer::new(self.stem);
        let tokenized: Vec<Vec<String>> =
            docs.iter().map(|d| tokenizer.tokenize(d.as_ref())).collect();
        let n = tokenized.len() as f64;

        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_default() += 1;
            }
        }

        let max_count = self.max_df * n;
        let min_count = self.min_df * n;
        let kept: Vec<(&str, usize)> = df
            .into_iter()
            .filter(|&(_, count)| {
                let count = count as f64;
                count <= max_count && count >= min_count
            })
            .collect();

        if kept.is_empty() {
            return Err(ClusterError::NoTerms);
        }

        let vocabulary: Vec<String> = kept.iter().map(|(t, _)| (*t).to_string()).collect();
        let idf: Vec<f64> = kept
            .iter()
            .map(|&(_, count)| ((1.0 + n) / (1.0 + count as f64)).ln() + 1.0)
            .collect();
        let column: HashMap<&str, usize> = kept
            .iter()
            .enumerate()
            .map(|(j, (t, _))| (*t, j))
            .collect();

        let rows = tokenized
            .iter()
            .map(|tokens| {
                let mut row = vec![0.0; vocabulary.len()];
                for token in tokens {
                    if let Some(&j) = column.get(token.as_str()) {
                        row[j] += idf[j];
                    }
                }
                normalize(&mut row);
                row
            })
            .collect();

        debug!(documents = tokenized.len(), terms = vocabulary.len(), "fitted tf-idf");
        Ok(TfIdfMatrix {
            vocabulary,
            idf,
            rows,
        })
    }
}

fn normalize(row: &mut [f64]) {
    let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in row {
            *x /= norm;
        }
    }
}
