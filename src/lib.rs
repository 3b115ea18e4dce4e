//! A Rust library for turning multi-year household survey extracts into a
//! clean, uniquely keyed relational table with recoded categories, and for
//! summarizing category counts across census years.

pub mod aggregate;
pub mod clean;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod recode;
pub mod schema;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{PipelineConfig, WriteMode};
pub use error::{Result, SurveyError};
pub use models::{CompositeKey, RecodedRecord, SurveyRecord};
pub use schema::{SchemaCompatibilityReport, SchemaIssue, SurveyField};

// Pipeline stages
pub use aggregate::{TemporalAggregator, YearlyCategoryCounts};
pub use clean::{CleanedTable, CleaningEngine, CleaningReport};
pub use loader::{LoadReport, SinkTable, SqliteLoader};
pub use pipeline::{Pipeline, PipelineSummary};
pub use reader::{RawTable, SourceAdapter};
pub use recode::{CategoryMapping, MappingRegistry, RecodedTable, Recoder};

// Arrow types
pub use arrow::record_batch::RecordBatch;
