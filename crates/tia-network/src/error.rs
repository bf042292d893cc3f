use tia_core::{ErrorCode, TiaError};

use crate::centrality::CentralityComputationError;

/// Errors raised while deriving the actor network or scoring it.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Table(#[from] TiaError),

    #[error("unknown {column} value '{value}' in row {row}")]
    UnknownKind {
        column: &'static str,
        value: String,
        row: usize,
    },

    #[error(transparent)]
    Centrality(#[from] CentralityComputationError),
}

impl NetworkError {
    /// Map the error onto its stable [`ErrorCode`].
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Table(e) => e.error_code(),
            Self::UnknownKind { .. } => ErrorCode::MalformedTable,
            Self::Centrality(_) => ErrorCode::CentralityNotConverged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn table_errors_keep_their_code() {
        let err = NetworkError::from(TiaError::InputMissing {
            path: PathBuf::from("staging/posts.csv"),
        });
        assert_eq!(err.error_code(), ErrorCode::InputMissing);
        assert!(err.to_string().contains("staging/posts.csv"));
    }

    #[test]
    fn centrality_failure_maps_to_not_converged() {
        let err = NetworkError::from(CentralityComputationError::NotConverged { iterations: 100 });
        assert_eq!(err.error_code(), ErrorCode::CentralityNotConverged);
        assert_eq!(err.error_code().code(), "E6001");
    }

    #[test]
    fn unknown_kind_is_a_table_problem() {
        let err = NetworkError::UnknownKind {
            column: "edge_type",
            value: "like".into(),
            row: 3,
        };
        assert_eq!(err.error_code(), ErrorCode::MalformedTable);
        assert_eq!(err.to_string(), "unknown edge_type value 'like' in row 3");
    }
}
