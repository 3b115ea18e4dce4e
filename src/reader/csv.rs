//! CSV extracts with a header row.
//!
//! Column types are inferred over the whole file; the adapter casts the fixed
//! survey columns to their canonical types afterwards.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{Result, SurveyError};

fn open(path: &Path) -> Result<File> {
    File::open(path)
        .map_err(|e| SurveyError::source_read(path, format!("Failed to open file: {e}")))
}

fn infer(path: &Path, file: &mut File) -> Result<(Format, SchemaRef)> {
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(&mut *file, None)
        .map_err(|e| SurveyError::source_read(path, format!("Failed to infer CSV schema: {e}")))?;
    Ok((format, Arc::new(schema)))
}

/// Read only the inferred schema of a CSV file
pub fn read_csv_schema(path: &Path) -> Result<SchemaRef> {
    let mut file = open(path)?;
    Ok(infer(path, &mut file)?.1)
}

/// Read a CSV file into Arrow record batches
pub fn read_csv(path: &Path, batch_size: usize) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let mut file = open(path)?;
    let (format, schema) = infer(path, &mut file)?;
    file.rewind()
        .map_err(|e| SurveyError::source_read(path, format!("Failed to rewind file: {e}")))?;

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .with_batch_size(batch_size)
        .build(file)
        .map_err(|e| SurveyError::source_read(path, format!("Failed to build CSV reader: {e}")))?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SurveyError::source_read(path, format!("CSV parse error: {e}")))?;
    Ok((schema, batches))
}
