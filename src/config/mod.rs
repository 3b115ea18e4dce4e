//! Configuration for a pipeline run.
//!
//! Paths and the sink location arrive already resolved (from the command line
//! or the caller) and are scoped to a single run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SurveyError;
use crate::schema::SurveyField;

/// Default batch size for source readers
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Default name of the sink table
pub const DEFAULT_TABLE_NAME: &str = "food_security";

/// Environment variable overriding the reader batch size
pub const BATCH_SIZE_ENV: &str = "SURVEY_BATCH_SIZE";

/// What the loader does when the sink table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Drop and recreate the table inside the load transaction
    Replace,
    /// Refuse to write into an existing table
    FailIfExists,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::FailIfExists => f.write_str("fail"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "fail" | "fail-if-exists" | "fail_if_exists" => Ok(Self::FailIfExists),
            other => Err(SurveyError::Config(format!(
                "Unknown write mode '{other}' (expected 'replace' or 'fail')"
            ))),
        }
    }
}

/// Configuration for a `Pipeline` run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding one extract per census year
    pub source_dir: PathBuf,
    /// Sink connection string: a SQLite file path or `:memory:`
    pub sink: String,
    /// Name of the sink table
    pub table_name: String,
    /// Behavior when the sink table exists
    pub write_mode: WriteMode,
    /// Rows per batch when reading source files
    pub batch_size: usize,
    /// Fields summarized by the aggregator
    pub aggregate_fields: Vec<SurveyField>,
    /// Show a progress spinner while stages run
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data"),
            sink: ":memory:".to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            write_mode: WriteMode::FailIfExists,
            batch_size: batch_size_from_env().unwrap_or(DEFAULT_BATCH_SIZE),
            aggregate_fields: vec![SurveyField::FoodSecurity12m],
            show_progress: false,
        }
    }
}

impl PipelineConfig {
    /// Create a config for a source directory and sink
    pub fn new(source_dir: impl Into<PathBuf>, sink: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            sink: sink.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    #[must_use]
    pub const fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_aggregate_fields(mut self, fields: Vec<SurveyField>) -> Self {
        self.aggregate_fields = fields;
        self
    }

    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Check values that cannot be enforced by types
    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.batch_size == 0 {
            return Err(SurveyError::Config("batch size must be positive".to_string()));
        }
        if self.sink.trim().is_empty() {
            return Err(SurveyError::Config("sink connection string is empty".to_string()));
        }
        if let Some(field) = self.aggregate_fields.iter().find(|f| !f.is_categorical()) {
            return Err(SurveyError::Config(format!(
                "'{field}' is not a categorical field and cannot be aggregated"
            )));
        }
        Ok(())
    }
}

/// Helper function to get batch size from environment
#[must_use]
pub fn batch_size_from_env() -> Option<usize> {
    std::env::var(BATCH_SIZE_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mode_parses_both_spellings() {
        assert_eq!("replace".parse::<WriteMode>().unwrap(), WriteMode::Replace);
        assert_eq!("fail-if-exists".parse::<WriteMode>().unwrap(), WriteMode::FailIfExists);
        assert!("upsert".parse::<WriteMode>().is_err());
    }

    #[test]
    fn rejects_non_categorical_aggregate() {
        let config = PipelineConfig::new("data", "out.db")
            .with_aggregate_fields(vec![SurveyField::ResidentCount]);
        assert!(matches!(config.validate(), Err(SurveyError::Config(_))));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let config = PipelineConfig::new("data", "out.db").with_batch_size(0);
        assert!(config.validate().is_err());
    }
}
