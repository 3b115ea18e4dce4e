//! Fixed field dictionary of the survey extract.
//!
//! Every source file carries these columns under their upper-case survey
//! names. Projection renames them to the snake_case names used by the
//! cleaned table and the sink.

use std::fmt;
use std::str::FromStr;

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// Role a field plays in the analysis table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Part of the composite identity
    Identity,
    /// Plain count, kept as an integer
    Count,
    /// Coded integer recoded to a category label
    Categorical,
}

/// One of the analysis fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyField {
    HouseholdId,
    CensusYear,
    RespondentLine,
    Tenure,
    HousingUnitType,
    FamilyIncome,
    ResidentCount,
    HouseholdType,
    GeoDivision,
    MetroStatus,
    #[serde(rename = "food_security_12m")]
    FoodSecurity12m,
    #[serde(rename = "food_security_30d")]
    FoodSecurity30d,
}

impl SurveyField {
    /// All analysis fields in table order
    pub const ALL: [Self; 12] = [
        Self::HouseholdId,
        Self::CensusYear,
        Self::RespondentLine,
        Self::Tenure,
        Self::HousingUnitType,
        Self::FamilyIncome,
        Self::ResidentCount,
        Self::HouseholdType,
        Self::GeoDivision,
        Self::MetroStatus,
        Self::FoodSecurity12m,
        Self::FoodSecurity30d,
    ];

    /// The composite identity, in key order
    pub const IDENTITY: [Self; 3] = [Self::HouseholdId, Self::CensusYear, Self::RespondentLine];

    /// Column name in the source extract
    #[must_use]
    pub const fn source_name(self) -> &'static str {
        match self {
            Self::HouseholdId => "HRHHID",
            Self::CensusYear => "HRYEAR4",
            Self::RespondentLine => "PULINENO",
            Self::Tenure => "HETENURE",
            Self::HousingUnitType => "HEHOUSUT",
            Self::FamilyIncome => "HEFAMINC",
            Self::ResidentCount => "HRNUMHOU",
            Self::HouseholdType => "HRHTYPE",
            Self::GeoDivision => "GEDIV",
            Self::MetroStatus => "GTMETSTA",
            Self::FoodSecurity12m => "HRFS12MD",
            Self::FoodSecurity30d => "HRFS30D2",
        }
    }

    /// Column name in the cleaned table and the sink
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::HouseholdId => "household_id",
            Self::CensusYear => "census_year",
            Self::RespondentLine => "respondent_line",
            Self::Tenure => "tenure",
            Self::HousingUnitType => "housing_unit_type",
            Self::FamilyIncome => "family_income",
            Self::ResidentCount => "resident_count",
            Self::HouseholdType => "household_type",
            Self::GeoDivision => "geo_division",
            Self::MetroStatus => "metro_status",
            Self::FoodSecurity12m => "food_security_12m",
            Self::FoodSecurity30d => "food_security_30d",
        }
    }

    #[must_use]
    pub const fn role(self) -> FieldRole {
        match self {
            Self::HouseholdId | Self::CensusYear | Self::RespondentLine => FieldRole::Identity,
            Self::ResidentCount => FieldRole::Count,
            _ => FieldRole::Categorical,
        }
    }

    /// Canonical Arrow type of the raw (pre-recode) column
    #[must_use]
    pub const fn raw_type(self) -> DataType {
        match self {
            Self::HouseholdId => DataType::Int64,
            _ => DataType::Int32,
        }
    }

    #[must_use]
    pub const fn is_categorical(self) -> bool {
        matches!(self.role(), FieldRole::Categorical)
    }

    /// Categorical fields in table order
    pub fn categorical() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|f| f.is_categorical())
    }
}

impl fmt::Display for SurveyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for SurveyField {
    type Err = SurveyError;

    /// Accepts either the source column name or the snake_case column name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.source_name() == s || f.column_name() == s)
            .ok_or_else(|| SurveyError::SchemaMismatch(format!("Unknown survey field '{s}'")))
    }
}
