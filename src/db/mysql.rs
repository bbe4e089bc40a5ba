//! MySQL database client implementation.
//!
//! Provides `MySqlConnectionProvider`, which opens one dedicated sqlx
//! connection per request, and `MySqlClient`, the `DatabaseClient` wrapping it.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, ConnectionProvider, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Result, SecureCheckError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::{Column as _, ConnectOptions, Connection as _, Executor as _, Row as _, Statement as _};
use sqlx::{TypeInfo, ValueRef as _};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Connect timeout in seconds, per attempt.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of connection attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Opens MySQL connections from a fixed configuration.
#[derive(Debug, Clone)]
pub struct MySqlConnectionProvider {
    config: ConnectionConfig,
}

impl MySqlConnectionProvider {
    /// Creates a provider for the given connection settings.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn connect_once(
        options: &MySqlConnectOptions,
    ) -> std::result::Result<MySqlConnection, sqlx::Error> {
        tokio::time::timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), options.connect())
            .await
            .unwrap_or_else(|_| {
                Err(sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "connect timed out",
                )))
            })
    }
}

#[async_trait]
impl ConnectionProvider for MySqlConnectionProvider {
    async fn open(&self) -> Result<Box<dyn DatabaseClient>> {
        let conn_str = self.config.to_connection_string()?;
        let options = MySqlConnectOptions::from_str(&conn_str)
            .map_err(|e| SecureCheckError::config(format!("Invalid connection settings: {e}")))?;

        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt = 1;

        loop {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            match Self::connect_once(&options).await {
                Ok(conn) => {
                    debug!("Opened connection to {}", self.config.display_string());
                    return Ok(Box::new(MySqlClient::new(conn)));
                }
                Err(e) if attempt < MAX_RETRY_ATTEMPTS && is_transient_error(&e) => {
                    warn!(
                        "Connection attempt {} failed (transient error), retrying in {:?}",
                        attempt, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                    attempt += 1;
                }
                Err(e) => return Err(map_connection_error(e, &self.config)),
            }
        }
    }

    fn describe(&self) -> String {
        self.config.display_string()
    }
}

/// A single MySQL connection.
///
/// The connection sits behind a mutex because sqlx executes on `&mut`;
/// `close()` takes it out so later calls fail instead of reusing it.
#[derive(Debug)]
pub struct MySqlClient {
    conn: Mutex<Option<MySqlConnection>>,
}

impl MySqlClient {
    /// Wraps an established connection.
    pub fn new(conn: MySqlConnection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| SecureCheckError::connection("Connection is already closed"))?;

        debug!("Executing: {}", sql);
        let start = Instant::now();

        let result: Vec<MySqlRow> = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&mut *conn),
        )
        .await
        .map_err(|_| {
            SecureCheckError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(|e| SecureCheckError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        // Column metadata comes from the first row, or from the prepared statement when empty
        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => match (&mut *conn).prepare(sql).await {
                Ok(statement) => statement
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect(),
                Err(e) => {
                    debug!("Could not describe empty result: {}", e);
                    Vec::new()
                }
            },
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();
        debug!("Fetched {} rows in {:?}", rows.len(), execution_time);

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        if let Some(conn) = self.conn.lock().await.take() {
            conn.close()
                .await
                .map_err(|e| SecureCheckError::connection(format!("Failed to close: {e}")))?;
            debug!("Connection closed");
        }
        Ok(())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    if row.try_get_raw(index).map(|v| v.is_null()).unwrap_or(true) {
        return Value::Null;
    }

    let type_name = type_name.to_uppercase();

    if type_name.ends_with("UNSIGNED") {
        return row
            .try_get::<u64, _>(index)
            .ok()
            .and_then(|v| i64::try_from(v).ok())
            .map(Value::Int)
            .unwrap_or(Value::Null);
    }

    match type_name.as_str() {
        "BOOLEAN" => row
            .try_get::<bool, _>(index)
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "YEAR" => row
            .try_get_unchecked::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<f32, _>(index)
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),

        // DECIMAL travels as text in both protocols; ROUND() and AVG() produce it
        "DECIMAL" => row
            .try_get_unchecked::<String, _>(index)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .map(Value::Date)
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .map(Value::Time)
            .unwrap_or(Value::Null),

        "DATETIME" | "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(index)
            .map(Value::DateTime)
            .unwrap_or(Value::Null),

        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // For all other types, try to get as string
        _ => row
            .try_get::<String, _>(index)
            .or_else(|_| row.try_get_unchecked::<String, _>(index))
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::PoolTimedOut) {
        return true;
    }

    let error_str = error.to_string().to_lowercase();

    // Authentication and unknown-database errors are never transient
    if error_str.contains("access denied")
        || error_str.contains("unknown database")
        || error_str.contains("ssl")
        || error_str.contains("tls")
    {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> SecureCheckError {
    let host = config
        .host
        .as_deref()
        .unwrap_or(crate::config::DEFAULT_HOST);
    let port = config.port_or_default();
    let user = config
        .user
        .as_deref()
        .unwrap_or(crate::config::DEFAULT_USER);
    let database = config
        .database
        .as_deref()
        .unwrap_or(crate::config::DEFAULT_DATABASE);

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        SecureCheckError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        SecureCheckError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("unknown database") {
        SecureCheckError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        SecureCheckError::connection(
            "Server requires TLS. Add '?ssl-mode=required' to the connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        SecureCheckError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        SecureCheckError::connection(error.to_string())
    }
}

/// Formats a query error with the MySQL error number and SQLSTATE if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    match db_error.try_downcast_ref::<MySqlDatabaseError>() {
        Some(mysql_error) => match mysql_error.code() {
            Some(state) => format!(
                "ERROR {} ({}): {}",
                mysql_error.number(),
                state,
                mysql_error.message()
            ),
            None => format!("ERROR {}: {}", mysql_error.number(), mysql_error.message()),
        },
        None => format!("ERROR: {}", db_error.message()),
    }
}
