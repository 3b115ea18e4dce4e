//! Registry of the hand-authored code dictionaries, one per categorical field

use std::collections::BTreeMap;

use crate::error::{Result, SurveyError};
use crate::recode::mapping::CategoryMapping;
use crate::recode::{FALLBACK_OTHER, FALLBACK_UNKNOWN, NO_RESPONSE, NO_RESPONSE_CODE};
use crate::schema::SurveyField;

/// Family income bands, codes 1 through 16
const FAMILY_INCOME_BANDS: [&str; 16] = [
    "Less than $5,000",
    "$5,000 to $7,499",
    "$7,500 to $9,999",
    "$10,000 to $12,499",
    "$12,500 to $14,999",
    "$15,000 to $19,999",
    "$20,000 to $24,999",
    "$25,000 to $29,999",
    "$30,000 to $34,999",
    "$35,000 to $39,999",
    "$40,000 to $49,999",
    "$50,000 to $59,999",
    "$60,000 to $74,999",
    "$75,000 to $99,999",
    "$100,000 to $149,999",
    "$150,000 or more",
];

const GEO_DIVISIONS: [&str; 9] = [
    "New England",
    "Middle Atlantic",
    "East North Central",
    "West North Central",
    "South Atlantic",
    "East South Central",
    "West South Central",
    "Mountain",
    "Pacific",
];

/// One mapping per categorical field
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    mappings: BTreeMap<SurveyField, CategoryMapping>,
}

impl MappingRegistry {
    /// Build a registry, requiring a mapping for every categorical field
    ///
    /// # Errors
    /// Returns a mapping error if a categorical field has no mapping or a
    /// field is mapped twice
    pub fn new(mappings: impl IntoIterator<Item = CategoryMapping>) -> Result<Self> {
        let mut by_field = BTreeMap::new();
        for mapping in mappings {
            let field = mapping.field();
            if by_field.insert(field, mapping).is_some() {
                return Err(SurveyError::Mapping(format!("'{field}' has more than one mapping")));
            }
        }
        if let Some(missing) = SurveyField::categorical().find(|f| !by_field.contains_key(f)) {
            return Err(SurveyError::Mapping(format!("No mapping registered for '{missing}'")));
        }
        Ok(Self { mappings: by_field })
    }

    /// The survey's code dictionaries
    pub fn standard() -> Result<Self> {
        Self::new([
            tenure()?,
            housing_unit_type()?,
            family_income()?,
            household_type()?,
            geo_division()?,
            metro_status()?,
            food_security(SurveyField::FoodSecurity12m)?,
            food_security(SurveyField::FoodSecurity30d)?,
        ])
    }

    /// Replace the mapping of one field
    #[must_use]
    pub fn with_mapping(mut self, mapping: CategoryMapping) -> Self {
        self.mappings.insert(mapping.field(), mapping);
        self
    }

    /// Mapping for a field
    pub fn get(&self, field: SurveyField) -> Result<&CategoryMapping> {
        self.mappings
            .get(&field)
            .ok_or_else(|| SurveyError::Mapping(format!("No mapping registered for '{field}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryMapping> {
        self.mappings.values()
    }
}

fn tenure() -> Result<CategoryMapping> {
    CategoryMapping::builder(SurveyField::Tenure)
        .code(1, "Owned")
        .code(2, "Rented")
        .code(3, "Occupied Without Payment")
        .fallback(FALLBACK_OTHER)
        .build()
}

fn housing_unit_type() -> Result<CategoryMapping> {
    CategoryMapping::builder(SurveyField::HousingUnitType)
        .code(1, "House/Apartment")
        .codes(&[2, 3, 4], "Hotel/Rooming House")
        .codes(&[5, 6], "Mobile Home")
        .codes(&[8, 9, 10], "Non-Housing Quarters")
        .code(11, "Student Quarters")
        .fallback(FALLBACK_OTHER)
        .build()
}

fn family_income() -> Result<CategoryMapping> {
    FAMILY_INCOME_BANDS
        .iter()
        .zip(1..)
        .fold(CategoryMapping::builder(SurveyField::FamilyIncome), |b, (label, code)| {
            b.code(code, *label)
        })
        .fallback(FALLBACK_UNKNOWN)
        .build()
}

fn household_type() -> Result<CategoryMapping> {
    CategoryMapping::builder(SurveyField::HouseholdType)
        .codes(&[1, 2], "Married Couple Family")
        .codes(&[3, 4, 5], "Other Family")
        .codes(&[6, 7, 8], "Nonfamily Household")
        .codes(&[9, 10], "Group Quarters")
        .fallback(FALLBACK_OTHER)
        .build()
}

fn geo_division() -> Result<CategoryMapping> {
    GEO_DIVISIONS
        .iter()
        .zip(1..)
        .fold(CategoryMapping::builder(SurveyField::GeoDivision), |b, (label, code)| {
            b.code(code, *label)
        })
        .fallback(FALLBACK_UNKNOWN)
        .build()
}

fn metro_status() -> Result<CategoryMapping> {
    CategoryMapping::builder(SurveyField::MetroStatus)
        .code(1, "Metropolitan")
        .code(2, "Nonmetropolitan")
        .code(3, "Not Identified")
        .fallback(FALLBACK_UNKNOWN)
        .build()
}

fn food_security(field: SurveyField) -> Result<CategoryMapping> {
    CategoryMapping::builder(field)
        .code(1, "High")
        .code(2, "Medium")
        .code(3, "Low")
        .code(4, "Very Low")
        .code(NO_RESPONSE_CODE, NO_RESPONSE)
        .fallback(FALLBACK_UNKNOWN)
        .build()
}
