//! MySQL integration tests.
//!
//! Tests that need a live server skip unless DATABASE_URL is set.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secure_check::config::ConnectionConfig;
use secure_check::dashboard::Dashboard;
use secure_check::db::{ConnectionProvider, DatabaseClient, MySqlConnectionProvider, Value};
use secure_check::query::{QueryExecutor, CATALOG};
use secure_check::stops::FormColumn;

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a provider for the test database.
fn get_test_provider() -> Option<MySqlConnectionProvider> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    Some(MySqlConnectionProvider::new(config))
}

#[tokio::test]
async fn test_execute_simple_select() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let client = provider.open().await.unwrap();
    let result = client
        .execute_query("SELECT 1 AS num, 'hello' AS greeting, NULL AS nothing")
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 3);
    assert_eq!(result.columns[0].name, "num");
    assert_eq!(
        result.rows,
        vec![vec![Value::Int(1), Value::from("hello"), Value::Null]]
    );

    client.close().await.unwrap();
    assert!(client.execute_query("SELECT 1").await.is_err());
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let executor = QueryExecutor::new(Arc::new(provider));
    let result = executor
        .execute("SELECT violation FROM policelog WHERE 1 = 0")
        .await
        .unwrap();

    assert!(result.rows.is_empty());
    assert_eq!(result.columns[0].name, "violation");
}

#[tokio::test]
async fn test_syntax_error_is_query_error() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let executor = QueryExecutor::new(Arc::new(provider));
    let err = executor.execute("SELECT FROM policelog").await.unwrap_err();

    assert_eq!(err.category(), "Query Error");
    assert!(err.to_string().contains("1064"));
}

#[tokio::test]
async fn test_catalog_runs_against_police_log() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let dashboard = Dashboard::new(QueryExecutor::new(Arc::new(provider)));

    for entry in CATALOG {
        let first = dashboard.insight(entry.question).await.unwrap();
        let second = dashboard.insight(entry.question).await.unwrap();
        assert!(
            first.result.same_data(&second.result),
            "{} is not deterministic",
            entry.question
        );
    }
}

#[tokio::test]
async fn test_distinct_countries_sorted_and_unique() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let executor = QueryExecutor::new(Arc::new(provider));
    let countries = executor
        .distinct_values(FormColumn::CountryName)
        .await
        .unwrap();

    // MySQL's default collation orders case-insensitively
    assert!(countries
        .windows(2)
        .all(|pair| pair[0].to_lowercase() < pair[1].to_lowercase()));
}

#[tokio::test]
async fn test_stop_records_decode() {
    let Some(provider) = get_test_provider() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let dashboard = Dashboard::new(QueryExecutor::new(Arc::new(provider)));
    let overview = dashboard.overview().await.unwrap();
    let records = dashboard.stop_records().await.unwrap();

    assert_eq!(records.len(), overview.row_count);
}

#[tokio::test]
async fn test_unreachable_server_gives_empty_table() {
    let config = ConnectionConfig {
        host: Some("127.0.0.1".to_string()),
        // Nothing listens on port 1
        port: Some(1),
        ..Default::default()
    };
    let executor = QueryExecutor::new(Arc::new(MySqlConnectionProvider::new(config)));

    let result = executor.execute("SELECT * FROM policelog").await.unwrap();

    assert!(result.columns.is_empty());
    assert!(result.rows.is_empty());
}
