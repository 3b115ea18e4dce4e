use survey_etl::{CleaningEngine, Recoder, SqliteLoader, SurveyError, WriteMode};

use crate::utils::{Workspace, survey_record, to_batch};

#[test]
fn pre_and_post_recode_tables_load_side_by_side() {
    let ws = Workspace::new();
    let raw = to_batch(&[survey_record(1, 2019, 2, 2), survey_record(2, 2019, 1, -9)]);
    let (cleaned, _) = CleaningEngine::new().clean(&raw).unwrap();

    let mut loader = SqliteLoader::open(&ws.sink()).unwrap();
    loader.load(&cleaned, "fs_codes", WriteMode::FailIfExists).unwrap();
    let recoded = Recoder::standard().unwrap().recode(cleaned).unwrap();
    loader.load(&recoded, "fs_labels", WriteMode::FailIfExists).unwrap();

    let conn = loader.connection();
    let (code, label): (i64, String) = conn
        .query_row(
            "SELECT c.food_security_12m, l.food_security_12m FROM fs_codes c \
             JOIN fs_labels l USING (household_id, census_year, respondent_line) \
             WHERE household_id = 2",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(code, -9);
    assert_eq!(label, "No Response");
}

#[test]
fn unopenable_sink_is_a_load_error() {
    let ws = Workspace::new();
    let sink = ws.dir.path().join("missing").join("dir").join("survey.db");
    let err = SqliteLoader::open(&sink.to_string_lossy()).unwrap_err();
    assert!(matches!(err, SurveyError::Load { attempted_rows: 0, .. }));
}
