//! Temporal aggregation of recoded tables
//!
//! Counts records per census year and category label for one categorical
//! field. Sentinel labels are excluded entirely.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use arrow::array::{Array, StringArray};
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::error::{Result, SurveyError};
use crate::filter::int32_column;
use crate::recode::{RecodedTable, is_sentinel_label};
use crate::schema::SurveyField;

/// Per-year counts of each label of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyCategoryCounts {
    pub field: SurveyField,
    /// Distinct census years in ascending order
    pub years: Vec<i32>,
    /// Label to counts aligned with `years`; missing combinations are zero
    pub counts: BTreeMap<String, Vec<u64>>,
}

impl YearlyCategoryCounts {
    /// Counts of one label, aligned with `years`
    #[must_use]
    pub fn series(&self, label: &str) -> Option<&[u64]> {
        self.counts.get(label).map(Vec::as_slice)
    }

    /// Count of one label in one year
    #[must_use]
    pub fn count(&self, label: &str, year: i32) -> u64 {
        let Ok(idx) = self.years.binary_search(&year) else {
            return 0;
        };
        self.series(label)
            .and_then(|s| s.get(idx).copied())
            .unwrap_or(0)
    }

    /// Count of one label over all years
    #[must_use]
    pub fn total_for(&self, label: &str) -> u64 {
        self.series(label).map_or(0, |s| s.iter().sum())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Serialize for external charting
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Functions for cross-year category summaries
pub struct TemporalAggregator;

impl TemporalAggregator {
    /// Count records per year and label of `field`
    ///
    /// # Errors
    /// Returns a schema mismatch if `field` is not categorical
    pub fn aggregate(table: &RecodedTable, field: SurveyField) -> Result<YearlyCategoryCounts> {
        Self::aggregate_batch(table.batch(), field)
    }

    /// Summaries of every categorical field, in table order
    pub fn aggregate_all(table: &RecodedTable) -> Result<Vec<YearlyCategoryCounts>> {
        SurveyField::categorical()
            .map(|field| Self::aggregate(table, field))
            .collect()
    }

    /// Count records per year and label of `field` in a recoded batch
    pub fn aggregate_batch(
        batch: &RecordBatch,
        field: SurveyField,
    ) -> Result<YearlyCategoryCounts> {
        let start = Instant::now();
        if !field.is_categorical() {
            return Err(SurveyError::SchemaMismatch(format!(
                "'{field}' is not a categorical field"
            )));
        }
        let years = int32_column(batch, SurveyField::CensusYear.column_name())?;
        let labels = batch
            .column_by_name(field.column_name())
            .ok_or_else(|| SurveyError::SchemaMismatch(format!("Column '{field}' not found")))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                SurveyError::SchemaMismatch(format!(
                    "Column '{field}' does not hold labels; recode it first"
                ))
            })?;

        let distinct: Vec<i32> = years
            .iter()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        let mut excluded = 0usize;
        for (year, label) in years.iter().zip(labels.iter()) {
            let (Some(year), Some(label)) = (year, label) else {
                continue;
            };
            if is_sentinel_label(label) {
                excluded += 1;
                continue;
            }
            let Ok(idx) = distinct.binary_search(&year) else {
                continue;
            };
            counts
                .entry(label.to_string())
                .or_insert_with(|| vec![0; distinct.len()])[idx] += 1;
        }

        log::debug!(
            "Aggregated '{field}' over {} years: {} labels, \
             {excluded} sentinel rows excluded in {:?}",
            distinct.len(),
            counts.len(),
            start.elapsed()
        );

        Ok(YearlyCategoryCounts {
            field,
            years: distinct,
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::CleaningEngine;
    use crate::models::{CompositeKey, SurveyRecord};
    use crate::recode::Recoder;

    fn recoded(rows: &[(i32, i32)]) -> RecodedTable {
        let records: Vec<SurveyRecord> = rows
            .iter()
            .zip(1..)
            .map(|(&(year, code), household)| {
                let mut r = SurveyRecord::new(CompositeKey::new(household, year, 1), 1);
                r.food_security_12m_code = Some(code);
                r
            })
            .collect();
        let raw = SurveyRecord::to_record_batch(&records).unwrap();
        let (cleaned, _) = CleaningEngine::new().clean(&raw).unwrap();
        Recoder::standard().unwrap().recode(cleaned).unwrap()
    }

    #[test]
    fn counts_per_year_and_label() {
        // 2019: High x3, Low x1; 2020: High x2, Low x2
        let table = recoded(&[
            (2019, 1),
            (2019, 1),
            (2019, 1),
            (2019, 3),
            (2020, 1),
            (2020, 1),
            (2020, 3),
            (2020, 3),
        ]);
        let counts = TemporalAggregator::aggregate(&table, SurveyField::FoodSecurity12m).unwrap();
        assert_eq!(counts.years, vec![2019, 2020]);
        assert_eq!(counts.series("High"), Some(&[3, 2][..]));
        assert_eq!(counts.series("Low"), Some(&[1, 2][..]));
        assert_eq!(counts.total_for("High"), 5);
    }

    #[test]
    fn sentinels_are_excluded() {
        let table = recoded(&[(2019, -9), (2019, 77), (2019, 4), (2020, -9)]);
        let counts = TemporalAggregator::aggregate(&table, SurveyField::FoodSecurity12m).unwrap();
        assert!(counts.series("No Response").is_none());
        assert!(counts.series("Unknown").is_none());
        assert_eq!(counts.labels().collect::<Vec<_>>(), vec!["Very Low"]);
        // years come from the data, not only from counted rows
        assert_eq!(counts.years, vec![2019, 2020]);
        assert_eq!(counts.series("Very Low"), Some(&[1, 0][..]));
    }

    #[test]
    fn missing_combinations_are_zero() {
        let table = recoded(&[(2018, 2), (2020, 1)]);
        let counts = TemporalAggregator::aggregate(&table, SurveyField::FoodSecurity12m).unwrap();
        assert_eq!(counts.count("Medium", 2020), 0);
        assert_eq!(counts.count("High", 2018), 0);
        assert_eq!(counts.count("High", 2020), 1);
        assert_eq!(counts.count("High", 1999), 0);
    }

    #[test]
    fn short_series_counts_as_zero() {
        let counts = YearlyCategoryCounts {
            field: SurveyField::FoodSecurity12m,
            years: vec![2019, 2020],
            counts: BTreeMap::from([("High".to_string(), vec![4])]),
        };
        assert_eq!(counts.count("High", 2019), 4);
        assert_eq!(counts.count("High", 2020), 0);
        assert_eq!(counts.total_for("High"), 4);
    }

    #[test]
    fn fallback_other_is_counted() {
        let table = recoded(&[(2019, 1)]);
        let counts = TemporalAggregator::aggregate(&table, SurveyField::Tenure).unwrap();
        assert_eq!(counts.series("Other"), Some(&[1][..]));
    }

    #[test]
    fn non_categorical_field_is_rejected() {
        let table = recoded(&[(2019, 1)]);
        let err = TemporalAggregator::aggregate(&table, SurveyField::ResidentCount).unwrap_err();
        assert!(matches!(err, SurveyError::SchemaMismatch(_)));
    }

    #[test]
    fn aggregate_all_covers_every_categorical_field() {
        let table = recoded(&[(2019, 1)]);
        let all = TemporalAggregator::aggregate_all(&table).unwrap();
        assert_eq!(all.len(), 8);
        assert!(all.iter().all(|c| c.years == vec![2019]));
    }

    #[test]
    fn json_shape() {
        let table = recoded(&[(2019, 1), (2020, 1)]);
        let counts = TemporalAggregator::aggregate(&table, SurveyField::FoodSecurity12m).unwrap();
        let value: serde_json::Value = serde_json::from_str(&counts.to_json().unwrap()).unwrap();
        assert_eq!(value["field"], "food_security_12m");
        assert_eq!(value["years"], serde_json::json!([2019, 2020]));
        assert_eq!(value["counts"]["High"], serde_json::json!([1, 1]));
    }
}
