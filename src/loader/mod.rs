//! Schema-typed loader.
//!
//! Persists a cleaned or recoded table into one SQLite table keyed by the
//! composite identity. Every load runs in a single transaction; any failure
//! leaves the sink as it was.

pub mod schema;

use std::time::Instant;

use arrow::array::{Array, Int32Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use rusqlite::types::Value;
use rusqlite::{Connection, Transaction, params, params_from_iter};
use serde::Serialize;

pub use schema::{SinkColumn, SinkSchema, SqlType, validate_table_name};

use crate::clean::CleanedTable;
use crate::config::WriteMode;
use crate::error::{Result, SurveyError};
use crate::filter::KeyColumns;
use crate::recode::RecodedTable;
use crate::utils::logging::log_stage;

/// Connection string of a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// A table the loader can persist
pub trait SinkTable {
    fn batch(&self) -> &RecordBatch;
}

impl SinkTable for CleanedTable {
    fn batch(&self) -> &RecordBatch {
        CleanedTable::batch(self)
    }
}

impl SinkTable for RecodedTable {
    fn batch(&self) -> &RecordBatch {
        RecodedTable::batch(self)
    }
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub rows_written: usize,
    pub write_mode: WriteMode,
}

/// Writes tables into a SQLite database
#[derive(Debug)]
pub struct SqliteLoader {
    conn: Connection,
}

impl SqliteLoader {
    /// Open the sink named by a connection string: a file path or `:memory:`
    ///
    /// # Errors
    /// Returns a load error if the database cannot be opened
    pub fn open(sink: &str) -> Result<Self> {
        let conn = if sink == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(sink)
        }
        .map_err(|e| SurveyError::load(0, format!("Cannot open sink '{sink}': {e}")))?;
        Ok(Self { conn })
    }

    /// A loader over a fresh in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(IN_MEMORY)
    }

    /// The underlying connection, for reading back what was written
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Whether `table` exists in the sink
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        table_exists(&self.conn, table).map_err(|e| SurveyError::load(0, e.to_string()))
    }

    /// Number of rows stored in `table`
    pub fn row_count(&self, table: &str) -> Result<usize> {
        validate_table_name(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
            .map_err(|e| SurveyError::load(0, e.to_string()))?;
        usize::try_from(count).map_err(|e| SurveyError::load(0, e.to_string()))
    }

    /// Persist `table` as `name`
    ///
    /// # Errors
    /// Returns a configuration error for an invalid table name, a schema
    /// mismatch if the table has no sink layout, and a load error if the table
    /// exists under [`WriteMode::FailIfExists`] or the sink rejects a row.
    /// Nothing is written when an error is returned.
    pub fn load(
        &mut self,
        table: &impl SinkTable,
        name: &str,
        mode: WriteMode,
    ) -> Result<LoadReport> {
        let start = Instant::now();
        validate_table_name(name)?;
        let batch = table.batch();
        let layout = SinkSchema::from_arrow(&batch.schema())?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| SurveyError::load(0, format!("Cannot start transaction: {e}")))?;

        match mode {
            WriteMode::Replace => {
                tx.execute(&format!("DROP TABLE IF EXISTS \"{name}\""), [])
                    .map_err(|e| SurveyError::load(0, e.to_string()))?;
            }
            WriteMode::FailIfExists => {
                if table_exists(&tx, name).map_err(|e| SurveyError::load(0, e.to_string()))? {
                    return Err(SurveyError::load(0, format!("Table '{name}' already exists")));
                }
            }
        }
        tx.execute(&layout.create_sql(name), [])
            .map_err(|e| SurveyError::load(0, format!("Cannot create table '{name}': {e}")))?;

        let rows_written = insert_rows(&tx, &layout, name, batch)?;
        tx.commit()
            .map_err(|e| SurveyError::load(rows_written, format!("Commit failed: {e}")))?;

        log_stage("Loading", batch.num_rows(), rows_written, start.elapsed());
        Ok(LoadReport {
            table: name.to_string(),
            rows_written,
            write_mode: mode,
        })
    }
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count > 0)
}

/// Typed access to one column's values
enum ColumnValues<'a> {
    Int64(&'a Int64Array),
    Int32(&'a Int32Array),
    Text(&'a StringArray),
}

impl ColumnValues<'_> {
    fn value(&self, row: usize) -> Value {
        match self {
            Self::Int64(a) if a.is_valid(row) => Value::Integer(a.value(row)),
            Self::Int32(a) if a.is_valid(row) => Value::Integer(i64::from(a.value(row))),
            Self::Text(a) if a.is_valid(row) => Value::Text(a.value(row).to_string()),
            _ => Value::Null,
        }
    }
}

fn column_values<'a>(batch: &'a RecordBatch, column: &SinkColumn) -> Result<ColumnValues<'a>> {
    let array = batch
        .column_by_name(&column.name)
        .ok_or_else(|| SurveyError::SchemaMismatch(format!("Column '{}' not found", column.name)))?
        .as_any();
    let values = match column.sql_type {
        SqlType::BigInt => array.downcast_ref::<Int64Array>().map(ColumnValues::Int64),
        SqlType::Integer => array.downcast_ref::<Int32Array>().map(ColumnValues::Int32),
        SqlType::Text => array.downcast_ref::<StringArray>().map(ColumnValues::Text),
    };
    values.ok_or_else(|| {
        SurveyError::SchemaMismatch(format!(
            "Column '{}' does not match its declared type {}",
            column.name,
            column.sql_type.as_sql()
        ))
    })
}

fn insert_rows(
    tx: &Transaction<'_>,
    layout: &SinkSchema,
    name: &str,
    batch: &RecordBatch,
) -> Result<usize> {
    let columns = layout
        .columns()
        .iter()
        .map(|c| column_values(batch, c))
        .collect::<Result<Vec<_>>>()?;
    let keys = KeyColumns::new(batch)?;

    let mut stmt = tx
        .prepare(&layout.insert_sql(name))
        .map_err(|e| SurveyError::load(0, format!("Cannot prepare insert: {e}")))?;

    let mut row_values = Vec::with_capacity(columns.len());
    for row in 0..batch.num_rows() {
        row_values.clear();
        row_values.extend(columns.iter().map(|c| c.value(row)));
        stmt.execute(params_from_iter(row_values.iter()))
            .map_err(|e| SurveyError::Load {
                attempted_rows: row + 1,
                first_failing: keys.key(row),
                message: e.to_string(),
            })?;
    }
    Ok(batch.num_rows())
}
