use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use survey_etl::{CompositeKey, SurveyRecord};
use tempfile::TempDir;

/// A response with every code set; food security as given
#[must_use]
pub fn survey_record(
    household_id: i64,
    census_year: i32,
    resident_count: i32,
    food_security: i32,
) -> SurveyRecord {
    let key = CompositeKey::new(household_id, census_year, 1);
    let mut record = SurveyRecord::new(key, resident_count);
    record.tenure_code = Some(1);
    record.housing_unit_type_code = Some(1);
    record.family_income_code = Some(12);
    record.household_type_code = Some(1);
    record.geo_division_code = Some(5);
    record.metro_status_code = Some(1);
    record.food_security_12m_code = Some(food_security);
    record.food_security_30d_code = Some(food_security);
    record
}

#[must_use]
pub fn to_batch(records: &[SurveyRecord]) -> RecordBatch {
    SurveyRecord::to_record_batch(records).expect("fixture records convert to a batch")
}

/// Write records as a CSV extract with a header row
pub fn write_csv(dir: &Path, name: &str, records: &[SurveyRecord]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).expect("create csv fixture");
    let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(file);
    writer.write(&to_batch(records)).expect("write csv fixture");
    path
}

/// Write records as a Parquet extract
pub fn write_parquet(dir: &Path, name: &str, records: &[SurveyRecord]) -> PathBuf {
    let path = dir.join(name);
    let batch = to_batch(records);
    let file = File::create(&path).expect("create parquet fixture");
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).expect("open parquet writer");
    writer.write(&batch).expect("write parquet fixture");
    writer.close().expect("close parquet writer");
    path
}

/// Temporary source directory plus a sink path beside it
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir(dir.path().join("extracts")).expect("create source dir");
        Self { dir }
    }

    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("extracts")
    }

    /// Connection string of a SQLite file outside the source directory
    #[must_use]
    pub fn sink(&self) -> String {
        self.dir.path().join("survey.db").to_string_lossy().to_string()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
