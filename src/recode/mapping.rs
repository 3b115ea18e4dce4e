//! Category mappings: finite code tables with a mandatory fallback label

use std::collections::BTreeMap;

use crate::error::{Result, SurveyError};
use crate::schema::SurveyField;

/// Total function from integer codes to category labels.
///
/// Built through [`CategoryMappingBuilder`], which refuses to produce a
/// mapping without a fallback, so `label` is defined for every integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMapping {
    field: SurveyField,
    codes: BTreeMap<i32, String>,
    /// Labels in the order they were declared
    labels: Vec<String>,
    fallback: String,
}

impl CategoryMapping {
    /// Start a mapping for a categorical field
    #[must_use]
    pub fn builder(field: SurveyField) -> CategoryMappingBuilder {
        CategoryMappingBuilder {
            field,
            entries: Vec::new(),
            fallback: None,
        }
    }

    #[must_use]
    pub const fn field(&self) -> SurveyField {
        self.field
    }

    /// Label for a code; unknown codes get the fallback label
    #[must_use]
    pub fn label(&self, code: i32) -> &str {
        self.codes.get(&code).map_or(self.fallback.as_str(), String::as_str)
    }

    /// Label for a possibly missing code; a missing code gets the fallback label
    #[must_use]
    pub fn label_or_fallback(&self, code: Option<i32>) -> &str {
        code.map_or(self.fallback.as_str(), |c| self.label(c))
    }

    /// Whether the code is in the known set
    #[must_use]
    pub fn is_known(&self, code: i32) -> bool {
        self.codes.contains_key(&code)
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Distinct labels of known codes, in declaration order
    #[must_use]
    pub fn known_labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of known codes
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Builder for [`CategoryMapping`]
#[derive(Debug, Clone)]
pub struct CategoryMappingBuilder {
    field: SurveyField,
    entries: Vec<(i32, String)>,
    fallback: Option<String>,
}

impl CategoryMappingBuilder {
    /// Map one code to a label
    #[must_use]
    pub fn code(mut self, code: i32, label: impl Into<String>) -> Self {
        self.entries.push((code, label.into()));
        self
    }

    /// Map several codes to the same label (a bucket)
    #[must_use]
    pub fn codes(mut self, codes: &[i32], label: impl Into<String>) -> Self {
        let label = label.into();
        self.entries
            .extend(codes.iter().map(|&code| (code, label.clone())));
        self
    }

    /// Label for every code outside the known set
    #[must_use]
    pub fn fallback(mut self, label: impl Into<String>) -> Self {
        self.fallback = Some(label.into());
        self
    }

    /// Finish the mapping
    ///
    /// # Errors
    /// Returns a mapping error if the field is not categorical, no fallback was
    /// given, a label is blank, or a code is mapped twice
    pub fn build(self) -> Result<CategoryMapping> {
        let field = self.field;
        if !field.is_categorical() {
            return Err(SurveyError::Mapping(format!("'{field}' is not a categorical field")));
        }
        let fallback = self.fallback.ok_or_else(|| {
            SurveyError::Mapping(format!("Mapping for '{field}' has no fallback label"))
        })?;
        if fallback.trim().is_empty() {
            return Err(SurveyError::Mapping(format!(
                "Mapping for '{field}' has a blank fallback label"
            )));
        }

        let mut codes = BTreeMap::new();
        let mut labels: Vec<String> = Vec::new();
        for (code, label) in self.entries {
            if label.trim().is_empty() {
                return Err(SurveyError::Mapping(format!(
                    "Mapping for '{field}' has a blank label for code {code}"
                )));
            }
            if !labels.contains(&label) {
                labels.push(label.clone());
            }
            if codes.insert(code, label).is_some() {
                return Err(SurveyError::Mapping(format!(
                    "Mapping for '{field}' maps code {code} more than once"
                )));
            }
        }

        Ok(CategoryMapping {
            field,
            codes,
            labels,
            fallback,
        })
    }
}
