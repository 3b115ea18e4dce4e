//! Parquet extracts

use std::fs::File;
use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::{Result, SurveyError};

fn open_builder(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>> {
    let file = File::open(path)
        .map_err(|e| SurveyError::source_read(path, format!("Failed to open file: {e}")))?;
    ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| SurveyError::source_read(path, format!("Failed to read parquet file: {e}")))
}

/// Read only the Arrow schema of a Parquet file
pub fn read_parquet_schema(path: &Path) -> Result<SchemaRef> {
    Ok(open_builder(path)?.schema().clone())
}

/// Read a Parquet file into Arrow record batches
pub fn read_parquet(path: &Path, batch_size: usize) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let builder = open_builder(path)?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(batch_size)
        .build()
        .map_err(|e| {
            SurveyError::source_read(path, format!("Failed to build parquet reader: {e}"))
        })?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SurveyError::source_read(path, format!("Failed to read record batch: {e}")))?;
    Ok((schema, batches))
}
