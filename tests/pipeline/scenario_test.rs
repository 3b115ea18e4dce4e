use rusqlite::Connection;
use survey_etl::{
    CompositeKey, Pipeline, PipelineConfig, SurveyError, SurveyField, WriteMode,
};

use crate::utils::{Workspace, survey_record, write_csv, write_parquet};

fn config(ws: &Workspace) -> PipelineConfig {
    PipelineConfig::new(ws.source_dir(), ws.sink()).with_write_mode(WriteMode::Replace)
}

fn tenure_of(sink: &str, key: CompositeKey) -> String {
    Connection::open(sink)
        .unwrap()
        .query_row(
            "SELECT tenure FROM food_security \
             WHERE household_id = ?1 AND census_year = ?2 AND respondent_line = ?3",
            rusqlite::params![key.household_id, key.census_year, key.respondent_line],
            |row| row.get(0),
        )
        .unwrap()
}

#[test]
fn duplicate_identity_across_files_keeps_first() {
    let ws = Workspace::new();
    let mut first = survey_record(1001, 2019, 2, 1);
    first.tenure_code = Some(1);
    let mut repeat = survey_record(1001, 2019, 2, 1);
    repeat.tenure_code = Some(2);
    write_csv(&ws.source_dir(), "a_2019.csv", &[first, survey_record(1002, 2019, 1, 2)]);
    write_csv(&ws.source_dir(), "b_2019_resubmitted.csv", &[repeat]);

    let summary = Pipeline::new(config(&ws)).run().unwrap();
    assert_eq!(summary.source_files, 2);
    assert_eq!(summary.cleaning.input_rows, 3);
    assert_eq!(summary.cleaning.duplicates_removed, 1);
    assert_eq!(summary.load.rows_written, 2);
    assert_eq!(tenure_of(&ws.sink(), CompositeKey::new(1001, 2019, 1)), "Owned");
}

#[test]
fn households_without_residents_are_dropped() {
    let ws = Workspace::new();
    write_csv(
        &ws.source_dir(),
        "cps_2019.csv",
        &[survey_record(1, 2019, 0, 1), survey_record(2, 2019, 3, 1)],
    );

    let (summary, table) = Pipeline::new(config(&ws)).run_with_table().unwrap();
    assert_eq!(summary.cleaning.invalid_removed, 1);
    assert_eq!(table.num_rows(), 1);
    assert!(table.keys().contains(&CompositeKey::new(2, 2019, 1)));
    assert_eq!(table.records().unwrap()[0].resident_count, 3);
}

#[test]
fn unknown_codes_are_recoded_not_rejected() {
    let ws = Workspace::new();
    let mut odd = survey_record(5, 2020, 2, 77);
    odd.tenure_code = Some(47);
    write_parquet(&ws.source_dir(), "cps_2020.parquet", &[odd, survey_record(6, 2020, 2, -9)]);

    let (_, table) = Pipeline::new(config(&ws)).run_with_table().unwrap();
    let rows = table.records().unwrap();
    assert_eq!(rows[0].tenure, "Other");
    assert_eq!(rows[0].food_security_12m, "Unknown");
    assert_eq!(rows[1].food_security_12m, "No Response");
}

#[test]
fn food_security_counts_per_year() {
    let ws = Workspace::new();
    let mut household = 0;
    let mut next = |year: i32, code: i32| {
        household += 1;
        survey_record(household, year, 1, code)
    };
    let y2019 = vec![next(2019, 1), next(2019, 1), next(2019, 1), next(2019, 3), next(2019, -9)];
    let y2020 = vec![next(2020, 1), next(2020, 1), next(2020, 3), next(2020, 3)];
    write_csv(&ws.source_dir(), "cps_2019.csv", &y2019);
    write_parquet(&ws.source_dir(), "cps_2020.parquet", &y2020);

    let summary = Pipeline::new(config(&ws)).run().unwrap();
    let counts = &summary.aggregates[0];
    assert_eq!(counts.field, SurveyField::FoodSecurity12m);
    assert_eq!(counts.years, vec![2019, 2020]);
    assert_eq!(counts.series("High"), Some(&[3, 2][..]));
    assert_eq!(counts.series("Low"), Some(&[1, 2][..]));
    assert!(counts.series("No Response").is_none());
}

#[test]
fn second_run_fails_if_table_exists() {
    let ws = Workspace::new();
    write_csv(&ws.source_dir(), "cps_2019.csv", &[survey_record(1, 2019, 1, 1)]);
    let config = PipelineConfig::new(ws.source_dir(), ws.sink());
    Pipeline::new(config.clone()).run().unwrap();

    write_csv(&ws.source_dir(), "cps_2020.csv", &[survey_record(2, 2020, 1, 1)]);
    let err = Pipeline::new(config.clone()).run().unwrap_err();
    assert!(matches!(err, SurveyError::Load { .. }));

    let rows: i64 = Connection::open(ws.sink())
        .unwrap()
        .query_row("SELECT COUNT(*) FROM food_security", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    let summary = Pipeline::new(config.with_write_mode(WriteMode::Replace)).run().unwrap();
    assert_eq!(summary.load.rows_written, 2);
}

#[test]
fn summary_serializes_to_json() {
    let ws = Workspace::new();
    write_csv(&ws.source_dir(), "cps_2019.csv", &[survey_record(1, 2019, 1, 2)]);
    let summary = Pipeline::new(
        config(&ws).with_aggregate_fields(vec![SurveyField::FoodSecurity12m, SurveyField::Tenure]),
    )
    .run()
    .unwrap();

    let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
    assert_eq!(value["load"]["write_mode"], "replace");
    assert_eq!(value["cleaning"]["retained_rows"], 1);
    assert_eq!(value["aggregates"][1]["counts"]["Owned"], serde_json::json!([1]));
    assert!(value["started_at"].is_string());
}

#[test]
fn invalid_config_fails_before_reading() {
    let ws = Workspace::new();
    let err = Pipeline::new(config(&ws).with_aggregate_fields(vec![SurveyField::CensusYear]))
        .run()
        .unwrap_err();
    assert!(matches!(err, SurveyError::Config(_)));
}
