//! Structural validity filters

use std::collections::HashSet;

use arrow::array::{Array, BooleanArray};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::filter::core::{BatchFilter, check_required_columns, filter_record_batch, int32_column};
use crate::filter::identity::KeyColumns;
use crate::schema::SurveyField;

/// Keeps rows whose `Int32` column is non-null and at least `min`
#[derive(Debug, Clone)]
pub struct MinValueFilter {
    column: String,
    min: i32,
}

impl MinValueFilter {
    #[must_use]
    pub fn new(column: impl Into<String>, min: i32) -> Self {
        Self {
            column: column.into(),
            min,
        }
    }

    /// Rows with fewer than one resident are non-completed interviews
    #[must_use]
    pub fn completed_interviews() -> Self {
        Self::new(SurveyField::ResidentCount.column_name(), 1)
    }
}

impl BatchFilter for MinValueFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        check_required_columns(self, batch)?;
        let values = int32_column(batch, &self.column)?;
        let mask: BooleanArray = (0..values.len())
            .map(|i| !values.is_null(i) && values.value(i) >= self.min)
            .collect::<Vec<bool>>()
            .into();
        filter_record_batch(batch, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        HashSet::from([self.column.clone()])
    }
}

/// Drops rows whose composite identity has a null part
#[derive(Debug, Clone, Default)]
pub struct CompleteIdentityFilter;

impl BatchFilter for CompleteIdentityFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        check_required_columns(self, batch)?;
        let keys = KeyColumns::new(batch)?;
        let mask: BooleanArray = keys.iter().map(|k| k.is_some()).collect::<Vec<bool>>().into();
        filter_record_batch(batch, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        SurveyField::IDENTITY
            .iter()
            .map(|f| f.column_name().to_string())
            .collect()
    }
}
