//! Query execution with scoped connections.
//!
//! Every call opens its own connection, runs one statement, and closes the
//! connection again whatever the statement did, including when the call is
//! cancelled. There is no pooling.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::db::{ConnectionProvider, QueryResult, ScopedConnection};
use crate::error::Result;
use crate::query::catalog;
use crate::safety::ensure_read_only;
use crate::stops::FormColumn;

/// Where user-facing warnings and errors are shown.
///
/// A failed connection is reported here at the point of failure; the caller
/// only ever sees an empty table.
pub trait StatusReporter: Send + Sync {
    /// Reports a failure the user should see.
    fn error(&self, message: &str);

    /// Reports a non-fatal condition.
    fn warning(&self, message: &str);
}

/// Reporter that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }
}

/// Runs read-only statements against the police log.
#[derive(Clone)]
pub struct QueryExecutor {
    provider: Arc<dyn ConnectionProvider>,
    reporter: Arc<dyn StatusReporter>,
}

impl QueryExecutor {
    /// Creates an executor that reports through the log.
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Replaces the status reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn StatusReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Executes one statement and returns every row.
    ///
    /// If no connection can be opened the failure is reported and an empty
    /// table (no columns, no rows) is returned. Statement errors are
    /// returned to the caller; the connection is closed either way.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        ensure_read_only(sql)?;

        let connection = match ScopedConnection::open(self.provider.as_ref()).await {
            Ok(connection) => connection,
            Err(e) => {
                self.reporter
                    .error(&format!("Database connection error: {e}"));
                return Ok(QueryResult::new());
            }
        };

        let result = connection.execute_query(sql).await;
        connection.release().await;

        match &result {
            Ok(table) => debug!("Statement returned {} rows", table.row_count),
            Err(e) => debug!("Statement failed: {}", e),
        }

        result
    }

    /// Runs the catalog entry for `question`.
    pub async fn run_question(&self, question: &str) -> Result<QueryResult> {
        let sql = catalog::lookup(question)?;
        self.execute(sql).await
    }

    /// Returns the distinct values of a form column in ascending order.
    ///
    /// NULLs are skipped; an empty table gives an empty list.
    pub async fn distinct_values(&self, column: FormColumn) -> Result<Vec<String>> {
        let result = self.execute(&column.distinct_sql()).await?;
        if result.is_empty() {
            return Ok(Vec::new());
        }

        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.first())
            .filter(|value| !value.is_null())
            .map(|value| value.to_display_string())
            .collect())
    }
}
