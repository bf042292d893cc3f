use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InputMissing,
    MalformedInput,
    MalformedTable,
    OutputWriteFailed,
    CentralityNotConverged,
    ClusterInputInvalid,
    CrawlRequestFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::InputMissing => "E2001",
            Self::MalformedInput => "E2002",
            Self::MalformedTable => "E2003",
            Self::OutputWriteFailed => "E5001",
            Self::CentralityNotConverged => "E6001",
            Self::ClusterInputInvalid => "E6002",
            Self::CrawlRequestFailed => "E7001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InputMissing => "Input directory or file not found",
            Self::MalformedInput => "Malformed JSON input",
            Self::MalformedTable => "Malformed CSV table",
            Self::OutputWriteFailed => "Output file write failed",
            Self::CentralityNotConverged => "Eigenvector centrality did not converge",
            Self::ClusterInputInvalid => "Text clustering input unusable",
            Self::CrawlRequestFailed => "Crawl request failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in tia.toml and retry."),
            Self::InputMissing => Some("Run `tia crawl` first or point --data-dir at the snapshot root."),
            Self::MalformedInput => Some("Remove or re-crawl the offending JSON file."),
            Self::MalformedTable => Some("Re-run the previous stage to regenerate the CSV."),
            Self::OutputWriteFailed => Some("Check disk space and write permissions."),
            Self::CentralityNotConverged => {
                Some("Raise centrality.max_iterations or loosen centrality.tolerance.")
            }
            Self::ClusterInputInvalid => Some("Lower cluster.clusters or relax min_df/max_df."),
            Self::CrawlRequestFailed => Some("Check network access and the crawl.base_url setting."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while loading, flattening, or writing tables.
#[derive(Debug, thiserror::Error)]
pub enum TiaError {
    #[error("input path {} does not exist", .path.display())]
    InputMissing { path: PathBuf },

    #[error("failed to parse JSON in {}: {source}", .path.display())]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row} has {actual} cells, header has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl TiaError {
    /// Map the error onto its stable [`ErrorCode`].
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InputMissing { .. } => ErrorCode::InputMissing,
            Self::MalformedJson { .. } => ErrorCode::MalformedInput,
            Self::Csv { .. } | Self::RowWidth { .. } => ErrorCode::MalformedTable,
            Self::Io { .. } => ErrorCode::OutputWriteFailed,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
