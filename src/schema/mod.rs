//! Module for the fixed survey schema and source file compatibility checks.

pub mod fields;

use std::collections::BTreeSet;

use arrow::array::ArrayRef;
use arrow::compute::{CastOptions, cast_with_options};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;

pub use fields::{FieldRole, SurveyField};

use crate::error::{Result, SurveyError};

/// A struct that represents the compatibility between source file schemas
#[derive(Debug)]
pub struct SchemaCompatibilityReport {
    /// Whether all schemas are compatible
    pub compatible: bool,
    /// List of incompatibility issues, if any
    pub issues: Vec<SchemaIssue>,
}

impl SchemaCompatibilityReport {
    /// A report with no issues
    #[must_use]
    pub const fn compatible() -> Self {
        Self {
            compatible: true,
            issues: Vec::new(),
        }
    }

    /// Record issues found for one file
    pub fn extend(&mut self, issues: Vec<SchemaIssue>) {
        if !issues.is_empty() {
            self.compatible = false;
            self.issues.extend(issues);
        }
    }

    /// Render every issue on its own line
    #[must_use]
    pub fn describe(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A schema compatibility issue
#[derive(Debug, Clone)]
pub struct SchemaIssue {
    /// The path of the file that has incompatible schema
    pub file_path: String,
    /// The reference file path being compared to
    pub reference_path: String,
    /// Description of the incompatibility
    pub description: String,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (compared to {}): {}",
            self.file_path, self.reference_path, self.description
        )
    }
}

/// Arrow schema of the fixed source columns, with canonical types
#[must_use]
pub fn source_schema() -> Schema {
    Schema::new(
        SurveyField::ALL
            .iter()
            .map(|f| Field::new(f.source_name(), f.raw_type(), true))
            .collect::<Vec<_>>(),
    )
}

/// Arrow schema of the cleaned (projected, pre-recode) table
#[must_use]
pub fn cleaned_schema() -> Schema {
    Schema::new(
        SurveyField::ALL
            .iter()
            .map(|f| Field::new(f.column_name(), f.raw_type(), true))
            .collect::<Vec<_>>(),
    )
}

/// Arrow schema of the recoded table: categorical columns become labels
#[must_use]
pub fn recoded_schema() -> Schema {
    Schema::new(
        SurveyField::ALL
            .iter()
            .map(|f| {
                let data_type = if f.is_categorical() {
                    DataType::Utf8
                } else {
                    f.raw_type()
                };
                Field::new(f.column_name(), data_type, true)
            })
            .collect::<Vec<_>>(),
    )
}

/// Cast a column, failing on any value the target type cannot hold
pub fn cast_strict(column: &ArrayRef, to: &DataType) -> std::result::Result<ArrayRef, ArrowError> {
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(column, to, &options)
}

/// Source column names absent from `schema`
#[must_use]
pub fn missing_source_columns(schema: &Schema) -> Vec<&'static str> {
    SurveyField::ALL
        .iter()
        .map(|f| f.source_name())
        .filter(|name| schema.index_of(name).is_err())
        .collect()
}

/// Fail with a schema mismatch unless every fixed source column is present
pub fn require_source_columns(schema: &Schema) -> Result<()> {
    let missing = missing_source_columns(schema);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SurveyError::SchemaMismatch(format!(
            "Expected column(s) absent: {}",
            missing.join(", ")
        )))
    }
}

/// Checks if two source schemas carry the same set of column names
#[must_use]
pub fn schemas_compatible(reference: &Schema, other: &Schema) -> bool {
    column_names(reference) == column_names(other)
}

fn column_names(schema: &Schema) -> BTreeSet<&str> {
    schema.fields().iter().map(|f| f.name().as_str()).collect()
}

/// Finds and returns detailed incompatibilities between two source schemas.
///
/// Column order is irrelevant; the adapter reorders columns to the reference.
#[must_use]
pub fn find_schema_incompatibilities(
    reference: &Schema,
    other: &Schema,
    reference_path: &str,
    file_path: &str,
) -> Vec<SchemaIssue> {
    let issue = |description: String| SchemaIssue {
        file_path: file_path.to_string(),
        reference_path: reference_path.to_string(),
        description,
    };

    let mut issues: Vec<SchemaIssue> = missing_source_columns(other)
        .into_iter()
        .map(|name| issue(format!("Expected column '{name}' not found")))
        .collect();

    let reference_names = column_names(reference);
    let other_names = column_names(other);

    issues.extend(
        reference_names
            .difference(&other_names)
            .map(|name| issue(format!("Column '{name}' missing relative to reference"))),
    );
    issues.extend(
        other_names
            .difference(&reference_names)
            .map(|name| issue(format!("Unexpected column '{name}'"))),
    );

    issues
}
