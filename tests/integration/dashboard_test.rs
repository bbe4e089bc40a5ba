//! Dashboard interactions against a scripted store.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;
use secure_check::dashboard::Dashboard;
use secure_check::db::{ColumnInfo, MockConnectionProvider, QueryResult, Value};
use secure_check::output::{self, OutputFormat, NO_DATA_MESSAGE};
use secure_check::predict::{NewStopLog, PredictionSource, StopQuery};
use secure_check::query::{QueryExecutor, CATALOG};
use secure_check::stops::{stop_log_table, FormColumn, Gender, StopRecord, OVERVIEW_SQL};

fn stop(country: &str, age: i64, outcome: &str, violation: &str) -> StopRecord {
    StopRecord {
        stop_date: NaiveDate::from_ymd_opt(2020, 1, 1),
        stop_time: NaiveTime::from_hms_opt(22, 30, 0),
        country_name: country.to_string(),
        driver_gender: "Male".to_string(),
        driver_age: Some(age),
        driver_race: "White".to_string(),
        search_conducted: false,
        search_type: String::new(),
        stop_duration: "0".to_string(),
        drugs_related_stop: false,
        vehicle_number: "AB123".to_string(),
        stop_outcome: outcome.to_string(),
        violation: violation.to_string(),
        is_arrested: outcome == "Arrest",
    }
}

fn police_log() -> Vec<StopRecord> {
    vec![
        stop("USA", 30, "Warning", "Speeding"),
        stop("USA", 30, "Warning", "Speeding"),
        stop("USA", 30, "Warning", "Speeding"),
        stop("USA", 30, "Arrest", "Speeding"),
        stop("Canada", 45, "Arrest", "DUI"),
        stop("Canada", 45, "Arrest", "DUI"),
        stop("Canada", 45, "Ticket", "Seatbelt"),
    ]
}

fn new_stop(country: &str, age: i64) -> NewStopLog {
    NewStopLog {
        stop_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        stop_time: NaiveTime::from_hms_opt(8, 15, 0).unwrap(),
        query: StopQuery {
            driver_gender: Gender::Male,
            driver_age: age,
            stop_duration: "0".to_string(),
            search_conducted: false,
            drugs_related_stop: false,
            country_name: country.to_string(),
            driver_race: "White".to_string(),
            vehicle_number: "AB123".to_string(),
            search_type: String::new(),
        },
    }
}

fn dashboard(provider: MockConnectionProvider) -> Dashboard {
    Dashboard::new(QueryExecutor::new(Arc::new(provider)))
}

#[tokio::test]
async fn test_overview_decodes_to_the_stored_log() {
    let provider =
        MockConnectionProvider::new().with_result(OVERVIEW_SQL, stop_log_table(&police_log()));
    let dashboard = dashboard(provider);

    let overview = dashboard.overview().await.unwrap();
    assert_eq!(overview.row_count, 7);
    assert_eq!(overview.columns.len(), 14);

    let records = dashboard.stop_records().await.unwrap();
    assert_eq!(records, police_log());
}

#[tokio::test]
async fn test_predict_majority_and_default() {
    let provider =
        MockConnectionProvider::new().with_result(OVERVIEW_SQL, stop_log_table(&police_log()));
    let dashboard = dashboard(provider);

    let usa = dashboard.predict(new_stop("USA", 30)).await.unwrap();
    assert_eq!(usa.prediction.violation, "Speeding");
    assert_eq!(usa.prediction.outcome, "Warning");
    assert_eq!(usa.prediction.matched_rows, 4);

    let canada = dashboard.predict(new_stop("Canada", 45)).await.unwrap();
    assert_eq!(canada.prediction.violation, "DUI");
    assert_eq!(canada.prediction.outcome, "Arrest");

    let unseen = dashboard.predict(new_stop("India", 30)).await.unwrap();
    assert_eq!(unseen.prediction.source, PredictionSource::Default);
    assert_eq!(unseen.prediction.violation, "Speeding");
    assert_eq!(unseen.prediction.outcome, "Warning");
}

#[tokio::test]
async fn test_same_question_twice_gives_same_table() {
    let entry = &CATALOG[9];
    let table = QueryResult::with_data(
        vec![
            ColumnInfo::new("violation", "VARCHAR"),
            ColumnInfo::new("total_cases", "BIGINT"),
        ],
        vec![
            vec![Value::from("Speeding"), Value::Int(4)],
            vec![Value::from("DUI"), Value::Int(2)],
        ],
    );
    let provider = MockConnectionProvider::new().with_result(entry.sql, table);
    let dashboard = dashboard(provider);

    let first = dashboard.insight(entry.question).await.unwrap();
    let second = dashboard.insight(entry.question).await.unwrap();

    assert!(first.result.same_data(&second.result));
}

#[tokio::test]
async fn test_every_question_releases_its_connection() {
    let provider = CATALOG.iter().fold(MockConnectionProvider::new(), |p, entry| {
        p.with_error(entry.sql, "ERROR 1146 (42S02): Table 'secure_check.policelog' doesn't exist")
    });
    let stats = provider.stats();
    let dashboard = dashboard(provider);

    for position in 1..=CATALOG.len() {
        let err = dashboard.insight(&position.to_string()).await.unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));
    }

    assert_eq!(stats.opened(), CATALOG.len());
    assert_eq!(stats.closed(), CATALOG.len());
    assert_eq!(stats.open_now(), 0);
}

#[tokio::test]
async fn test_unreachable_store_degrades_every_interaction() {
    let dashboard = dashboard(MockConnectionProvider::failing("Connection refused"));

    let overview = dashboard.overview().await.unwrap();
    assert!(overview.columns.is_empty());
    assert!(overview.rows.is_empty());
    assert_eq!(
        output::render_result(&overview, OutputFormat::Text).unwrap(),
        NO_DATA_MESSAGE
    );

    let options = dashboard.form_options().await.unwrap();
    for column in FormColumn::ALL {
        assert!(options.get(column).is_empty());
    }

    let insight = dashboard.insight("1").await.unwrap();
    assert!(insight.result.is_empty());

    let summary = dashboard.predict(new_stop("USA", 30)).await.unwrap();
    assert_eq!(summary.prediction.source, PredictionSource::Default);

    assert_eq!(dashboard.questions().len(), 20);
}

#[tokio::test]
async fn test_prediction_summary_renders_as_json() {
    let provider =
        MockConnectionProvider::new().with_result(OVERVIEW_SQL, stop_log_table(&police_log()));
    let summary = dashboard(provider)
        .predict(new_stop("USA", 30))
        .await
        .unwrap();

    let json = output::render_summary(&summary, OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["prediction"]["outcome"], "Warning");
    assert_eq!(parsed["prediction"]["source"], "matched");
    assert_eq!(parsed["log"]["country_name"], "USA");
    assert_eq!(parsed["log"]["stop_date"], "2024-06-01");
}
