//! Error handling for the survey pipeline.

use std::io;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

use crate::models::CompositeKey;

/// Specialized error type for every pipeline stage
#[derive(Debug, thiserror::Error)]
pub enum SurveyError {
    /// A source file is missing, unreadable or disagrees with the fixed schema
    #[error("Source read error for {}: {message}", .path.display())]
    SourceRead {
        /// File or directory that failed
        path: PathBuf,
        /// Description of the failure
        message: String,
    },

    /// An expected column is absent or has the wrong type
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A duplicate identity survived cleaning
    #[error("Identity invariant violated: duplicate key {key}")]
    IdentityInvariantViolation {
        /// The offending key
        key: CompositeKey,
    },

    /// The sink rejected the write
    #[error(
        "Load error after {attempted_rows} attempted rows{}: {message}",
        first_failing_suffix(.first_failing)
    )]
    Load {
        /// Rows handed to the sink, up to and including the failing one
        attempted_rows: usize,
        /// Identity of the first failing row, when the failure is row-specific
        first_failing: Option<CompositeKey>,
        /// Description of the failure
        message: String,
    },

    /// A category mapping could not be constructed
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn first_failing_suffix(key: &Option<CompositeKey>) -> String {
    key.as_ref()
        .map(|k| format!(" (first failing row {k})"))
        .unwrap_or_default()
}

impl SurveyError {
    /// Create a source read error for a path
    pub fn source_read(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a load error that is not tied to a specific row
    pub fn load(attempted_rows: usize, message: impl Into<String>) -> Self {
        Self::Load {
            attempted_rows,
            first_failing: None,
            message: message.into(),
        }
    }

    /// Whether this error is a fatal programming fault rather than bad input
    #[must_use]
    pub const fn is_logic_fault(&self) -> bool {
        matches!(self, Self::IdentityInvariantViolation { .. })
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, SurveyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_mentions_first_failing_row() {
        let err = SurveyError::Load {
            attempted_rows: 12,
            first_failing: Some(CompositeKey::new(1001, 2019, 1)),
            message: "UNIQUE constraint failed".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("12 attempted rows"));
        assert!(text.contains("(1001, 2019, 1)"));
    }

    #[test]
    fn only_identity_violation_is_a_logic_fault() {
        let violation = SurveyError::IdentityInvariantViolation {
            key: CompositeKey::new(1, 2020, 2),
        };
        assert!(violation.is_logic_fault());
        assert!(!SurveyError::SchemaMismatch("x".into()).is_logic_fault());
    }
}
