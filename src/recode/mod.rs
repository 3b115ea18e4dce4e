//! Categorical recoder.
//!
//! Replaces every categorical code column of a cleaned table with its label
//! column. Codes outside a mapping's known set get the mapping's fallback, so
//! recoding never fails on data values.

pub mod mapping;
pub mod registry;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, ArrayRef, Int32Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

pub use mapping::{CategoryMapping, CategoryMappingBuilder};
pub use registry::MappingRegistry;

use crate::clean::CleanedTable;
use crate::error::{Result, SurveyError};
use crate::models::{CompositeKey, RecodedRecord};
use crate::schema::{SurveyField, recoded_schema};
use crate::utils::logging::log_stage;

/// Fallback for physical, ownership and type fields
pub const FALLBACK_OTHER: &str = "Other";

/// Fallback for survey-response fields
pub const FALLBACK_UNKNOWN: &str = "Unknown";

/// Label of the no-response sentinel code on food-security fields
pub const NO_RESPONSE: &str = "No Response";

/// Survey code recorded when a respondent gave no answer
pub const NO_RESPONSE_CODE: i32 = -9;

/// Labels that carry no category information
pub const SENTINEL_LABELS: [&str; 2] = [FALLBACK_UNKNOWN, NO_RESPONSE];

#[must_use]
pub fn is_sentinel_label(label: &str) -> bool {
    SENTINEL_LABELS.contains(&label)
}

/// A cleaned table whose categorical columns hold labels.
///
/// Only [`Recoder::recode`] creates these, and it consumes the cleaned
/// table, so a table cannot be recoded twice.
#[derive(Debug, Clone)]
pub struct RecodedTable {
    batch: RecordBatch,
    keys: BTreeSet<CompositeKey>,
}

impl RecodedTable {
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// The primary index carried over from cleaning
    #[must_use]
    pub const fn keys(&self) -> &BTreeSet<CompositeKey> {
        &self.keys
    }

    /// Row view of the table
    pub fn records(&self) -> Result<Vec<RecodedRecord>> {
        RecodedRecord::from_record_batch(&self.batch)
    }
}

/// Applies a mapping registry to cleaned tables
#[derive(Debug, Clone)]
pub struct Recoder {
    registry: MappingRegistry,
}

impl Recoder {
    #[must_use]
    pub const fn new(registry: MappingRegistry) -> Self {
        Self { registry }
    }

    /// A recoder over the survey's code dictionaries
    pub fn standard() -> Result<Self> {
        Ok(Self::new(MappingRegistry::standard()?))
    }

    #[must_use]
    pub const fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    /// Recode a cleaned table, consuming it
    pub fn recode(&self, table: CleanedTable) -> Result<RecodedTable> {
        let start = Instant::now();
        let (batch, keys) = table.into_parts();
        let batch = self.recode_batch(&batch)?;
        log_stage("Recoding", batch.num_rows(), batch.num_rows(), start.elapsed());
        Ok(RecodedTable { batch, keys })
    }

    /// Recode a batch with the cleaned table's schema
    ///
    /// # Errors
    /// Returns a schema mismatch if a column is absent or a categorical column
    /// does not hold integer codes, which includes a batch that was already
    /// recoded
    pub fn recode_batch(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let columns = SurveyField::ALL
            .iter()
            .map(|&field| {
                let name = field.column_name();
                let column = batch.column_by_name(name).ok_or_else(|| {
                    SurveyError::SchemaMismatch(format!("Column '{name}' not found"))
                })?;
                if field.is_categorical() {
                    self.recode_column(field, column)
                } else {
                    Ok(Arc::clone(column))
                }
            })
            .collect::<Result<Vec<ArrayRef>>>()?;

        Ok(RecordBatch::try_new(Arc::new(recoded_schema()), columns)?)
    }

    fn recode_column(&self, field: SurveyField, column: &ArrayRef) -> Result<ArrayRef> {
        let codes = column.as_any().downcast_ref::<Int32Array>().ok_or_else(|| {
            match column.data_type() {
                DataType::Utf8 => SurveyError::SchemaMismatch(format!(
                    "Column '{field}' already holds labels; recoding applies once"
                )),
                other => SurveyError::SchemaMismatch(format!(
                    "Column '{field}' has type {other}, expected Int32 codes"
                )),
            }
        })?;
        let mapping = self.registry.get(field)?;

        let fallbacks = codes
            .iter()
            .filter(|code| code.is_none_or(|c| !mapping.is_known(c)))
            .count();
        if fallbacks > 0 {
            log::debug!(
                "{fallbacks} '{field}' codes outside the known set recoded to '{}'",
                mapping.fallback()
            );
        }

        let labels: StringArray = codes
            .iter()
            .map(|code| Some(mapping.label_or_fallback(code)))
            .collect();
        Ok(Arc::new(labels))
    }
}
