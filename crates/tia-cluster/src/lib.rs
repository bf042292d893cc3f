#![forbid(unsafe_code)]
//! tia-cluster library.
//!
//! Groups comment excerpts by vocabulary: tokenize, weight terms with
//! TF-IDF, then partition the document vectors with k-means.
//!
//! ```text
//! excerpts ─ tokenize ─ Vectorizer::fit_transform ─ kmeans ─ Clustering
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Library operations return [`error::ClusterError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod error;
pub mod kmeans;
pub mod stage;
pub mod tfidf;
pub mod tokenize;

pub use error::ClusterError;
pub use kmeans::{Clustering, KMeansConfig, kmeans};
pub use tfidf::{TfIdfMatrix, Vectorizer};
pub use tokenize::{Tokenizer, tokenize};
