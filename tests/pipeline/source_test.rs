use arrow::array::{Array, Int32Array};
use survey_etl::{CleaningEngine, SourceAdapter, SurveyError};

use crate::utils::{Workspace, survey_record, write_csv, write_parquet};

#[test]
fn mixed_csv_and_parquet_extracts_concatenate() {
    let ws = Workspace::new();
    write_parquet(&ws.source_dir(), "cps_2019.parquet", &[survey_record(1, 2019, 2, 1)]);
    write_csv(
        &ws.source_dir(),
        "cps_2020.csv",
        &[survey_record(2, 2020, 2, 1), survey_record(3, 2020, 4, 2)],
    );

    let raw = SourceAdapter::new(ws.source_dir()).load().unwrap();
    assert_eq!(raw.num_rows(), 3);
    assert_eq!(raw.files.len(), 2);

    let (cleaned, report) = CleaningEngine::new().clean_raw(&raw).unwrap();
    assert_eq!(report.retained_rows, 3);
    let residents = cleaned
        .batch()
        .column_by_name("resident_count")
        .unwrap()
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap()
        .values()
        .to_vec();
    assert_eq!(residents, vec![2, 2, 4]);
}

#[test]
fn extract_with_extra_column_is_rejected() {
    let ws = Workspace::new();
    write_csv(&ws.source_dir(), "cps_2019.csv", &[survey_record(1, 2019, 1, 1)]);
    let header = "HRHHID,HRYEAR4,PULINENO,HETENURE,HEHOUSUT,HEFAMINC,\
                  HRNUMHOU,HRHTYPE,GEDIV,GTMETSTA,HRFS12MD,HRFS30D2,PEAGE";
    std::fs::write(
        ws.source_dir().join("cps_2020.csv"),
        format!("{header}\n2,2020,1,1,1,1,1,1,1,1,1,1,40\n"),
    )
    .unwrap();

    let adapter = SourceAdapter::new(ws.source_dir());
    let report = adapter.compatibility_report().unwrap();
    assert!(!report.compatible);
    assert!(report.describe().contains("PEAGE"));

    let err = adapter.load().unwrap_err();
    assert!(matches!(err, SurveyError::SourceRead { .. }));
}

#[test]
fn unreadable_extract_is_a_source_error() {
    let ws = Workspace::new();
    std::fs::write(ws.source_dir().join("cps_2019.parquet"), b"not parquet").unwrap();
    let err = SourceAdapter::new(ws.source_dir()).load().unwrap_err();
    assert!(matches!(err, SurveyError::SourceRead { .. }));
}

#[test]
fn missing_directory_is_a_source_error() {
    let ws = Workspace::new();
    let err = SourceAdapter::new(ws.dir.path().join("absent")).load().unwrap_err();
    assert!(matches!(err, SurveyError::SourceRead { .. }));
}
