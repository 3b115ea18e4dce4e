//! Relational schema of the sink table, derived from a table's Arrow schema

use arrow::datatypes::{DataType, Schema};

use crate::error::{Result, SurveyError};
use crate::schema::SurveyField;

/// Declared SQL column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// 64-bit integer
    BigInt,
    /// 32-bit integer
    Integer,
    Text,
}

impl SqlType {
    /// Map an Arrow column type to its declared SQL type
    pub fn from_arrow(data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Int64 => Ok(Self::BigInt),
            DataType::Int32 => Ok(Self::Integer),
            DataType::Utf8 => Ok(Self::Text),
            other => Err(SurveyError::SchemaMismatch(format!(
                "No sink column type for Arrow type {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::BigInt => "BIGINT",
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkColumn {
    pub name: String,
    pub sql_type: SqlType,
    pub not_null: bool,
}

/// Column layout and primary key of one sink table
#[derive(Debug, Clone)]
pub struct SinkSchema {
    columns: Vec<SinkColumn>,
}

impl SinkSchema {
    /// Derive the sink layout from a cleaned or recoded table schema
    ///
    /// # Errors
    /// Returns a schema mismatch if an identity column is absent or a column
    /// type has no SQL counterpart
    pub fn from_arrow(schema: &Schema) -> Result<Self> {
        for field in SurveyField::IDENTITY {
            schema.index_of(field.column_name()).map_err(|_| {
                SurveyError::SchemaMismatch(format!("Identity column '{field}' not found"))
            })?;
        }
        let columns = schema
            .fields()
            .iter()
            .map(|f| {
                Ok(SinkColumn {
                    name: f.name().clone(),
                    sql_type: SqlType::from_arrow(f.data_type())?,
                    not_null: SurveyField::IDENTITY.iter().any(|id| id.column_name() == f.name()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    #[must_use]
    pub fn columns(&self) -> &[SinkColumn] {
        &self.columns
    }

    /// `CREATE TABLE` statement for this layout
    #[must_use]
    pub fn create_sql(&self, table: &str) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let constraint = if c.not_null { " NOT NULL" } else { "" };
                format!("    \"{}\" {}{constraint}", c.name, c.sql_type.as_sql())
            })
            .collect();
        let key = SurveyField::IDENTITY
            .iter()
            .map(|f| format!("\"{}\"", f.column_name()))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("    PRIMARY KEY ({key})"));
        format!("CREATE TABLE \"{table}\" (\n{}\n)", lines.join(",\n"))
    }

    /// Parameterized `INSERT` statement for this layout
    #[must_use]
    pub fn insert_sql(&self, table: &str) -> String {
        let names = self
            .columns
            .iter()
            .map(|c| format!("\"{}\"", c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT INTO \"{table}\" ({names}) VALUES ({placeholders})")
    }
}

/// Check that a table name is a plain SQL identifier
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SurveyError::Config(format!("Invalid sink table name '{name}'")))
    }
}
