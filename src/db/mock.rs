//! Mock database for testing.
//!
//! Serves scripted results from memory and counts how many connections were
//! opened and closed, so tests can check that every path releases what it
//! acquired.

use super::{ConnectionProvider, DatabaseClient, QueryResult};
use crate::error::{Result, SecureCheckError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters shared between a mock provider and the clients it hands out.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    executed: AtomicUsize,
}

impl ConnectionStats {
    /// Number of connections opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of connections currently open.
    pub fn open_now(&self) -> usize {
        self.opened() - self.closed()
    }

    /// Number of statements that reached a connection.
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Rows(QueryResult),
    Error(String),
}

/// A mock connection provider that answers statements from a script.
///
/// Statements are matched on their exact text; anything unscripted fails
/// the way an unknown table would.
#[derive(Debug, Clone, Default)]
pub struct MockConnectionProvider {
    responses: HashMap<String, MockResponse>,
    open_error: Option<String>,
    latency: Option<Duration>,
    stats: Arc<ConnectionStats>,
}

impl MockConnectionProvider {
    /// Creates a provider with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider whose `open()` always fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            open_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Scripts the result returned for a statement.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.responses.insert(sql.into(), MockResponse::Rows(result));
        self
    }

    /// Scripts a query error for a statement.
    pub fn with_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(sql.into(), MockResponse::Error(message.into()));
        self
    }

    /// Makes every statement take `latency` before it answers.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Shared counters for this provider and every client it opened.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl ConnectionProvider for MockConnectionProvider {
    async fn open(&self) -> Result<Box<dyn DatabaseClient>> {
        if let Some(message) = &self.open_error {
            return Err(SecureCheckError::connection(message.clone()));
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDatabaseClient {
            responses: self.responses.clone(),
            latency: self.latency,
            stats: Arc::clone(&self.stats),
            closed: AtomicBool::new(false),
        }))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// A connection handed out by `MockConnectionProvider`.
#[derive(Debug)]
pub struct MockDatabaseClient {
    responses: HashMap<String, MockResponse>,
    latency: Option<Duration>,
    stats: Arc<ConnectionStats>,
    closed: AtomicBool,
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SecureCheckError::connection("Connection is already closed"));
        }
        self.stats.executed.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.responses.get(sql) {
            Some(MockResponse::Rows(result)) => Ok(result
                .clone()
                .with_execution_time(Duration::from_millis(1))),
            Some(MockResponse::Error(message)) => Err(SecureCheckError::query(message.clone())),
            None => Err(SecureCheckError::query(format!(
                "ERROR 1064 (42000): no scripted result for: {sql}"
            ))),
        }
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
