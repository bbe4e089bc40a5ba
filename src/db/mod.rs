//! Database abstraction layer for SecureCheck.
//!
//! Provides a trait-based interface for opening connections and running
//! statements, allowing the MySQL backend and the in-memory mock to be used
//! interchangeably.

mod mock;
mod mysql;
mod scoped;
mod types;

pub use mock::{ConnectionStats, MockConnectionProvider, MockDatabaseClient};
pub use mysql::{MySqlClient, MySqlConnectionProvider};
pub use scoped::ScopedConnection;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    MySql,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            _ => None,
        }
    }

    /// Returns the default port for this backend.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::MySql => 3306,
        }
    }
}

/// Creates the connection provider for the given configuration.
///
/// No connection is opened here; every `open()` on the returned provider
/// establishes a fresh one.
pub fn provider(config: &ConnectionConfig) -> Box<dyn ConnectionProvider> {
    Box::new(MySqlConnectionProvider::new(config.clone()))
}

/// Opens connections to the store holding the police log.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Opens a new dedicated connection.
    ///
    /// The caller owns the returned client; `ScopedConnection` closes it on
    /// every exit path.
    async fn open(&self) -> Result<Box<dyn DatabaseClient>>;

    /// Human-readable description of the target, without credentials.
    fn describe(&self) -> String;
}

/// A single open database connection.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns all of its rows.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection. Closing twice is a no-op.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(DatabaseBackend::parse("MySQL"), Some(DatabaseBackend::MySql));
        assert_eq!(DatabaseBackend::parse("mariadb"), Some(DatabaseBackend::MySql));
        assert_eq!(DatabaseBackend::parse("postgres"), None);
    }

    #[test]
    fn test_backend_defaults() {
        let backend = DatabaseBackend::default();
        assert_eq!(backend.as_str(), "mysql");
        assert_eq!(backend.default_port(), 3306);
    }

    #[test]
    fn test_provider_describes_target_without_password() {
        let config = ConnectionConfig {
            password: Some("ashu".to_string()),
            ..Default::default()
        };
        let provider = provider(&config);
        let description = provider.describe();
        assert!(description.contains("secure_check"));
        assert!(!description.contains("ashu"));
    }
}
