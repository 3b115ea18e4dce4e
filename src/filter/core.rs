//! Core filtering functionality for survey tables
//!
//! Common trait and mask application shared by the cleaning filters.

use std::collections::HashSet;

use arrow::array::{Array, ArrayRef, BooleanArray, Int32Array, Int64Array};
use arrow::compute::filter as arrow_filter;
use arrow::record_batch::RecordBatch;

use crate::error::{Result, SurveyError};

/// Filter a record batch based on a boolean mask
///
/// # Arguments
/// * `batch` - The record batch to filter
/// * `mask` - The boolean mask indicating which rows to keep
///
/// # Errors
/// Returns an error if the mask length differs from the batch or filtering fails
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return Err(SurveyError::SchemaMismatch(format!(
            "Mask length ({}) doesn't match batch row count ({})",
            mask.len(),
            batch.num_rows()
        )));
    }

    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| arrow_filter(col, mask))
        .collect::<arrow::error::Result<_>>()?;

    Ok(RecordBatch::try_new(batch.schema(), filtered_columns)?)
}

/// Trait for objects that can filter record batches
pub trait BatchFilter: std::fmt::Debug {
    /// Filter a record batch, returning only the retained rows
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch>;

    /// Returns the set of column names required by this filter
    fn required_columns(&self) -> HashSet<String>;
}

/// Look up an `Int32` column by name
pub fn int32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SurveyError::SchemaMismatch(format!("Column '{name}' not found")))?
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| {
            SurveyError::SchemaMismatch(format!("Column '{name}' is not an Int32 array"))
        })
}

/// Look up an `Int64` column by name
pub fn int64_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SurveyError::SchemaMismatch(format!("Column '{name}' not found")))?
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| {
            SurveyError::SchemaMismatch(format!("Column '{name}' is not an Int64 array"))
        })
}

/// Fail unless every column the filter needs is present
pub fn check_required_columns(filter: &dyn BatchFilter, batch: &RecordBatch) -> Result<()> {
    let schema = batch.schema();
    let mut missing: Vec<String> = filter
        .required_columns()
        .into_iter()
        .filter(|name| schema.index_of(name).is_err())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(SurveyError::SchemaMismatch(format!(
        "Column(s) required by {filter:?} not found: {}",
        missing.join(", ")
    )))
}

/// Keeps rows retained by every inner filter, applied in order
#[derive(Debug, Default)]
pub struct AndFilter {
    filters: Vec<Box<dyn BatchFilter>>,
}

impl AndFilter {
    #[must_use]
    pub fn new(filters: Vec<Box<dyn BatchFilter>>) -> Self {
        Self { filters }
    }

    /// Append a filter
    #[must_use]
    pub fn and(mut self, filter: impl BatchFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl BatchFilter for AndFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        check_required_columns(self, batch)?;
        self.filters
            .iter()
            .try_fold(batch.clone(), |current, filter| filter.filter(&current))
    }

    fn required_columns(&self) -> HashSet<String> {
        self.filters
            .iter()
            .flat_map(|f| f.required_columns())
            .collect()
    }
}
