//! Typed row views over survey tables
//!
//! Tables move through the pipeline as Arrow record batches. These structs are
//! the row-level view of the same data, converted with `serde_arrow`.

use arrow::datatypes::FieldRef;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::models::CompositeKey;
use crate::schema::source_schema;

/// One interview response as it appears in a source extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRecord {
    #[serde(rename = "HRHHID")]
    pub household_id: i64,
    #[serde(rename = "HRYEAR4")]
    pub census_year: i32,
    #[serde(rename = "PULINENO")]
    pub respondent_line: i32,
    #[serde(rename = "HETENURE")]
    pub tenure_code: Option<i32>,
    #[serde(rename = "HEHOUSUT")]
    pub housing_unit_type_code: Option<i32>,
    #[serde(rename = "HEFAMINC")]
    pub family_income_code: Option<i32>,
    #[serde(rename = "HRNUMHOU")]
    pub resident_count: Option<i32>,
    #[serde(rename = "HRHTYPE")]
    pub household_type_code: Option<i32>,
    #[serde(rename = "GEDIV")]
    pub geo_division_code: Option<i32>,
    #[serde(rename = "GTMETSTA")]
    pub metro_status_code: Option<i32>,
    #[serde(rename = "HRFS12MD")]
    pub food_security_12m_code: Option<i32>,
    #[serde(rename = "HRFS30D2")]
    pub food_security_30d_code: Option<i32>,
}

impl SurveyRecord {
    /// A record with the given identity and resident count; every code is unset
    #[must_use]
    pub const fn new(key: CompositeKey, resident_count: i32) -> Self {
        Self {
            household_id: key.household_id,
            census_year: key.census_year,
            respondent_line: key.respondent_line,
            tenure_code: None,
            housing_unit_type_code: None,
            family_income_code: None,
            resident_count: Some(resident_count),
            household_type_code: None,
            geo_division_code: None,
            metro_status_code: None,
            food_security_12m_code: None,
            food_security_30d_code: None,
        }
    }

    #[must_use]
    pub const fn key(&self) -> CompositeKey {
        CompositeKey::new(self.household_id, self.census_year, self.respondent_line)
    }

    /// Convert records into a batch with the fixed source schema
    pub fn to_record_batch(records: &[Self]) -> Result<RecordBatch> {
        let fields: Vec<FieldRef> = source_schema().fields().iter().cloned().collect();
        serde_arrow::to_record_batch(&fields, &records)
            .map_err(|e| SurveyError::SchemaMismatch(format!("Serialization error: {e}")))
    }

    /// Read records back from a batch with the fixed source schema
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        serde_arrow::from_record_batch(batch)
            .map_err(|e| SurveyError::SchemaMismatch(format!("Failed to deserialize: {e}")))
    }
}

/// One response after cleaning and recoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecodedRecord {
    pub household_id: i64,
    pub census_year: i32,
    pub respondent_line: i32,
    pub tenure: String,
    pub housing_unit_type: String,
    pub family_income: String,
    pub resident_count: i32,
    pub household_type: String,
    pub geo_division: String,
    pub metro_status: String,
    pub food_security_12m: String,
    pub food_security_30d: String,
}

impl RecodedRecord {
    #[must_use]
    pub const fn key(&self) -> CompositeKey {
        CompositeKey::new(self.household_id, self.census_year, self.respondent_line)
    }

    /// Convert a recoded batch to a vector of records
    pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        serde_arrow::from_record_batch(batch)
            .map_err(|e| SurveyError::SchemaMismatch(format!("Failed to deserialize: {e}")))
    }
}
