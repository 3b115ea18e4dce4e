//! Record source adapter.
//!
//! Reads one extract per census year from a directory and concatenates them
//! into a single raw table. Every file must carry the same set of columns,
//! including the fixed survey columns; no deduplication happens here.

pub mod csv;
pub mod parquet;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, ArrayRef};
use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::{Result, SurveyError};
use crate::schema::{
    SchemaCompatibilityReport, SurveyField, cast_strict, find_schema_incompatibilities,
    missing_source_columns,
};
use crate::utils::{SourceFormat, find_source_files, log_operation_complete, log_operation_start};

/// The unified, unprocessed table produced by the adapter
#[derive(Debug, Clone)]
pub struct RawTable {
    /// All rows of all files, in file order
    pub batch: RecordBatch,
    /// Files that contributed rows, in read order
    pub files: Vec<PathBuf>,
}

impl RawTable {
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}

/// Reads a directory of same-schema survey extracts
#[derive(Debug, Clone)]
pub struct SourceAdapter {
    dir: PathBuf,
    batch_size: usize,
}

impl SourceAdapter {
    /// Create an adapter over `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extracts in the directory, in read order
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        find_source_files(&self.dir)
    }

    /// Read one extract into record batches
    pub fn read_file(&self, path: &Path) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        match SourceFormat::from_path(path) {
            Some(SourceFormat::Csv) => csv::read_csv(path, self.batch_size),
            Some(SourceFormat::Parquet) => parquet::read_parquet(path, self.batch_size),
            None => Err(SurveyError::source_read(path, "Unsupported file type")),
        }
    }

    fn read_schema(path: &Path) -> Result<SchemaRef> {
        match SourceFormat::from_path(path) {
            Some(SourceFormat::Csv) => csv::read_csv_schema(path),
            Some(SourceFormat::Parquet) => parquet::read_parquet_schema(path),
            None => Err(SurveyError::source_read(path, "Unsupported file type")),
        }
    }

    /// Compare the schemas of every extract against the first one without reading rows
    pub fn compatibility_report(&self) -> Result<SchemaCompatibilityReport> {
        let files = self.source_files()?;
        let mut report = SchemaCompatibilityReport::compatible();
        let Some((first, rest)) = files.split_first() else {
            return Ok(report);
        };

        let reference = Self::read_schema(first)?;
        let reference_path = first.display().to_string();
        report.extend(find_schema_incompatibilities(
            &reference,
            &reference,
            &reference_path,
            &reference_path,
        ));
        for path in rest {
            let schema = Self::read_schema(path)?;
            report.extend(find_schema_incompatibilities(
                &reference,
                &schema,
                &reference_path,
                &path.display().to_string(),
            ));
        }
        Ok(report)
    }

    /// Read every extract and concatenate them into one table
    ///
    /// # Errors
    /// Returns a source read error if the directory holds no extracts, a file
    /// cannot be read, or a file's columns differ from the fixed schema or from
    /// the first file
    pub fn load(&self) -> Result<RawTable> {
        let start = Instant::now();
        log_operation_start("Loading survey extracts from", &self.dir);

        let files = self.source_files()?;
        if files.is_empty() {
            return Err(SurveyError::source_read(&self.dir, "No source extracts found"));
        }

        let mut reference: Option<(SchemaRef, String)> = None;
        let mut conformed = Vec::new();

        for path in &files {
            let (schema, batches) = self.read_file(path)?;
            let path_str = path.display().to_string();

            let (target, reference_path) = match reference.clone() {
                Some(existing) => existing,
                None => {
                    let missing = missing_source_columns(&schema);
                    if !missing.is_empty() {
                        return Err(SurveyError::source_read(
                            path,
                            format!("Expected column(s) absent: {}", missing.join(", ")),
                        ));
                    }
                    let first = (canonical_schema(&schema), path_str.clone());
                    reference = Some(first.clone());
                    first
                }
            };

            let issues =
                find_schema_incompatibilities(&target, &schema, &reference_path, &path_str);
            if !issues.is_empty() {
                let mut report = SchemaCompatibilityReport::compatible();
                report.extend(issues);
                return Err(SurveyError::source_read(path, report.describe()));
            }

            let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
            for batch in &batches {
                conformed.push(conform_batch(batch, &target, path)?);
            }
            log::debug!("Read {} rows from {}", rows, path.display());
        }

        let Some((target, _)) = reference else {
            return Err(SurveyError::source_read(&self.dir, "No source extracts found"));
        };
        let batch = concat_batches(&target, &conformed)?;

        log_operation_complete("read", &self.dir, batch.num_rows(), Some(start.elapsed()));
        Ok(RawTable { batch, files })
    }
}

/// The reference schema: fixed columns get canonical types, everything is nullable
fn canonical_schema(schema: &Schema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| {
            let data_type = SurveyField::ALL
                .iter()
                .find(|sf| sf.source_name() == f.name())
                .map_or_else(|| f.data_type().clone(), |sf| sf.raw_type());
            Field::new(f.name(), data_type, true)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

/// Reorder and cast a batch's columns to the reference schema
fn conform_batch(batch: &RecordBatch, target: &SchemaRef, path: &Path) -> Result<RecordBatch> {
    let columns = target
        .fields()
        .iter()
        .map(|field| {
            let column = batch.column_by_name(field.name()).ok_or_else(|| {
                SurveyError::source_read(path, format!("Column '{}' not found", field.name()))
            })?;
            if column.data_type() == field.data_type() {
                Ok(Arc::clone(column))
            } else {
                cast_strict(column, field.data_type()).map_err(|e| {
                    SurveyError::source_read(
                        path,
                        format!(
                            "Cannot convert column '{}' from {} to {}: {e}",
                            field.name(),
                            column.data_type(),
                            field.data_type()
                        ),
                    )
                })
            }
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(Arc::clone(target), columns)?)
}
