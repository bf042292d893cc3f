use tia_core::{ErrorCode, TiaError};

/// Errors raised while clustering text.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error(transparent)]
    Table(#[from] TiaError),

    #[error("no terms remain after document-frequency filtering")]
    NoTerms,

    #[error("cannot form {clusters} clusters from {documents} documents")]
    TooFewDocuments { clusters: usize, documents: usize },
}

impl ClusterError {
    /// Map the error onto its stable [`ErrorCode`].
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Table(e) => e.error_code(),
            Self::NoTerms | Self::TooFewDocuments { .. } => ErrorCode::ClusterInputInvalid,
        }
    }
}
