//! Composite identity extraction and deduplication

use std::collections::HashSet;

use arrow::array::{Array, BooleanArray, Int32Array, Int64Array};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::filter::core::{
    BatchFilter, check_required_columns, filter_record_batch, int32_column, int64_column,
};
use crate::models::CompositeKey;
use crate::schema::SurveyField;

/// Typed view over the three identity columns of a table
#[derive(Debug)]
pub struct KeyColumns<'a> {
    household: &'a Int64Array,
    year: &'a Int32Array,
    line: &'a Int32Array,
}

impl<'a> KeyColumns<'a> {
    /// Borrow the identity columns of a cleaned or recoded table
    pub fn new(batch: &'a RecordBatch) -> Result<Self> {
        Ok(Self {
            household: int64_column(batch, SurveyField::HouseholdId.column_name())?,
            year: int32_column(batch, SurveyField::CensusYear.column_name())?,
            line: int32_column(batch, SurveyField::RespondentLine.column_name())?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.household.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.household.is_empty()
    }

    /// Key of row `row`, or `None` when any part is null
    #[must_use]
    pub fn key(&self, row: usize) -> Option<CompositeKey> {
        if self.household.is_null(row) || self.year.is_null(row) || self.line.is_null(row) {
            return None;
        }
        Some(CompositeKey::new(
            self.household.value(row),
            self.year.value(row),
            self.line.value(row),
        ))
    }

    /// Iterate over the keys of all rows
    pub fn iter(&self) -> impl Iterator<Item = Option<CompositeKey>> + '_ {
        (0..self.len()).map(|row| self.key(row))
    }
}

/// Keeps the first row encountered for each composite identity.
///
/// Later rows sharing an identity are dropped, whatever their other values.
/// Rows with an incomplete identity pass through untouched; they are removed
/// by the validity filters.
#[derive(Debug, Clone, Default)]
pub struct DeduplicateFilter;

impl DeduplicateFilter {
    /// Build the retention mask for a batch
    pub fn mask(batch: &RecordBatch) -> Result<BooleanArray> {
        let keys = KeyColumns::new(batch)?;
        let mut seen: FxHashSet<CompositeKey> = FxHashSet::default();
        seen.reserve(keys.len());
        Ok(keys
            .iter()
            .map(|key| key.is_none_or(|k| seen.insert(k)))
            .collect::<Vec<bool>>()
            .into())
    }
}

impl BatchFilter for DeduplicateFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        check_required_columns(self, batch)?;
        let mask = Self::mask(batch)?;
        filter_record_batch(batch, &mask)
    }

    fn required_columns(&self) -> HashSet<String> {
        SurveyField::IDENTITY
            .iter()
            .map(|f| f.column_name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::cleaned_schema;
    use arrow::array::ArrayRef;
    use std::sync::Arc;

    fn batch(rows: &[(Option<i64>, i32, i32, i32)]) -> RecordBatch {
        let schema = Arc::new(cleaned_schema());
        let columns: Vec<ArrayRef> = schema
            .fields()
            .iter()
            .map(|f| -> ArrayRef {
                let ints = |pick: fn(&(Option<i64>, i32, i32, i32)) -> i32| {
                    Int32Array::from(rows.iter().map(pick).collect::<Vec<_>>())
                };
                match f.name().as_str() {
                    "household_id" => {
                        Arc::new(Int64Array::from(rows.iter().map(|r| r.0).collect::<Vec<_>>()))
                    }
                    "census_year" => Arc::new(ints(|r| r.1)),
                    "respondent_line" => Arc::new(ints(|r| r.2)),
                    _ => Arc::new(ints(|r| r.3)),
                }
            })
            .collect();
        RecordBatch::try_new(schema, columns).unwrap()
    }

    #[test]
    fn first_encountered_duplicate_wins() {
        let input = batch(&[
            (Some(1001), 2019, 1, 2),
            (Some(1001), 2019, 2, 5),
            (Some(1001), 2019, 1, 9),
        ]);
        let out = DeduplicateFilter.filter(&input).unwrap();
        assert_eq!(out.num_rows(), 2);
        let tenure = int32_column(&out, "tenure").unwrap();
        assert_eq!(tenure.value(0), 2);
        assert_eq!(tenure.value(1), 5);
    }

    #[test]
    fn same_household_different_year_is_distinct() {
        let input = batch(&[(Some(7), 2019, 1, 1), (Some(7), 2020, 1, 1)]);
        assert_eq!(DeduplicateFilter.filter(&input).unwrap().num_rows(), 2);
    }

    #[test]
    fn incomplete_identity_is_left_for_validity_filters() {
        let input = batch(&[(None, 2019, 1, 1), (None, 2019, 1, 1)]);
        let out = DeduplicateFilter.filter(&input).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert_eq!(KeyColumns::new(&out).unwrap().key(0), None);
    }
}
