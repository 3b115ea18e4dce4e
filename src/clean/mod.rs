//! Identity and cleaning engine.
//!
//! Reduces the raw unified table to the fixed analysis columns, removes
//! duplicate identities (first encountered wins), drops structurally invalid
//! rows and verifies that the composite identity is unique afterwards.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::error::{Result, SurveyError};
use crate::filter::{
    AndFilter, BatchFilter, CompleteIdentityFilter, DeduplicateFilter, KeyColumns, MinValueFilter,
};
use crate::models::CompositeKey;
use crate::reader::RawTable;
use crate::schema::{SurveyField, cast_strict, cleaned_schema, require_source_columns};
use crate::utils::logging::log_stage;

/// Row counts of one cleaning pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub invalid_removed: usize,
    pub retained_rows: usize,
}

/// A projected, deduplicated, structurally valid table keyed by composite identity.
///
/// Only the cleaning engine creates these, after the uniqueness check passed.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    batch: RecordBatch,
    keys: BTreeSet<CompositeKey>,
}

impl CleanedTable {
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// The primary index, in key order
    #[must_use]
    pub const fn keys(&self) -> &BTreeSet<CompositeKey> {
        &self.keys
    }

    #[must_use]
    pub fn contains(&self, key: &CompositeKey) -> bool {
        self.keys.contains(key)
    }

    /// Hand the batch and index to the next stage
    pub(crate) fn into_parts(self) -> (RecordBatch, BTreeSet<CompositeKey>) {
        (self.batch, self.keys)
    }
}

/// Projects, deduplicates and filters a raw survey table
#[derive(Debug)]
pub struct CleaningEngine {
    deduplicate: DeduplicateFilter,
    validity: AndFilter,
}

impl Default for CleaningEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CleaningEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deduplicate: DeduplicateFilter,
            validity: AndFilter::default()
                .and(CompleteIdentityFilter)
                .and(MinValueFilter::completed_interviews()),
        }
    }

    /// Clean the table produced by the source adapter
    pub fn clean_raw(&self, raw: &RawTable) -> Result<(CleanedTable, CleaningReport)> {
        self.clean(&raw.batch)
    }

    /// Clean a raw table
    ///
    /// # Errors
    /// Returns a schema mismatch if an expected column is absent or not an
    /// integer column, and an identity violation if a duplicate survives
    pub fn clean(&self, raw: &RecordBatch) -> Result<(CleanedTable, CleaningReport)> {
        let start = Instant::now();
        let input_rows = raw.num_rows();

        let projected = project(raw)?;
        let deduplicated = self.deduplicate.filter(&projected)?;
        let valid = self.validity.filter(&deduplicated)?;

        let keys = verify_unique(&valid)?;
        let report = CleaningReport {
            input_rows,
            duplicates_removed: input_rows - deduplicated.num_rows(),
            invalid_removed: deduplicated.num_rows() - valid.num_rows(),
            retained_rows: valid.num_rows(),
        };
        if report.duplicates_removed > 0 {
            log::warn!(
                "Removed {} rows with a duplicate identity (first encountered kept)",
                report.duplicates_removed
            );
        }
        log_stage("Cleaning", input_rows, report.retained_rows, start.elapsed());

        Ok((CleanedTable { batch: valid, keys }, report))
    }
}

/// Keep only the analysis columns, renamed to their table names and cast to
/// their canonical integer types
///
/// # Errors
/// Returns a schema mismatch if a column is absent, not integer-typed, or
/// holds a value its canonical type cannot represent
pub fn project(raw: &RecordBatch) -> Result<RecordBatch> {
    require_source_columns(&raw.schema())?;

    let columns = SurveyField::ALL
        .iter()
        .map(|field| {
            let name = field.source_name();
            let column = raw.column_by_name(name).ok_or_else(|| {
                SurveyError::SchemaMismatch(format!("Expected column '{name}' absent"))
            })?;
            let data_type = column.data_type();
            if data_type == &field.raw_type() {
                Ok(Arc::clone(column))
            } else if data_type.is_integer() || matches!(data_type, DataType::Null) {
                cast_strict(column, &field.raw_type()).map_err(|e| {
                    SurveyError::SchemaMismatch(format!(
                        "Column '{name}' holds a value outside {}: {e}",
                        field.raw_type()
                    ))
                })
            } else {
                Err(SurveyError::SchemaMismatch(format!(
                    "Column '{name}' has type {data_type}, expected an integer code"
                )))
            }
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(Arc::new(cleaned_schema()), columns)?)
}

/// Build the primary index, failing on any repeated or incomplete identity
pub fn verify_unique(batch: &RecordBatch) -> Result<BTreeSet<CompositeKey>> {
    let keys = KeyColumns::new(batch)?;
    let mut index = BTreeSet::new();
    for key in keys.iter() {
        let key = key.ok_or_else(|| {
            SurveyError::SchemaMismatch("Incomplete identity survived cleaning".to_string())
        })?;
        if !index.insert(key) {
            return Err(SurveyError::IdentityInvariantViolation { key });
        }
    }
    Ok(index)
}
