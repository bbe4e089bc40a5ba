//! Connections that are closed on every exit path.

use super::{ConnectionProvider, DatabaseClient, QueryResult};
use crate::error::{Result, SecureCheckError};
use tracing::{debug, warn};

/// An open connection owned by one scope.
///
/// `release()` closes it in place. If the guard is dropped while still
/// holding the connection (the owning future was cancelled, or a statement
/// panicked) the close is spawned onto the current runtime instead.
pub struct ScopedConnection {
    client: Option<Box<dyn DatabaseClient>>,
    target: String,
}

impl ScopedConnection {
    /// Opens a connection from `provider`.
    pub async fn open(provider: &dyn ConnectionProvider) -> Result<Self> {
        let client = provider.open().await?;
        Ok(Self {
            client: Some(client),
            target: provider.describe(),
        })
    }

    /// Runs one statement on the held connection.
    pub async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        match &self.client {
            Some(client) => client.execute_query(sql).await,
            None => Err(SecureCheckError::connection("Connection is already closed")),
        }
    }

    /// Closes the connection now. Close failures are logged, not returned.
    pub async fn release(mut self) {
        if let Some(client) = self.client.take() {
            close_client(client, &self.target).await;
        }
    }
}

async fn close_client(client: Box<dyn DatabaseClient>, target: &str) {
    if let Err(e) = client.close().await {
        warn!("Failed to close connection to {}: {}", target, e);
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        let target = std::mem::take(&mut self.target);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Connection to {} dropped while open, closing in background", target);
                handle.spawn(async move { close_client(client, &target).await });
            }
            // The socket still goes away with the client
            Err(_) => warn!("No runtime to close connection to {}; dropping it", target),
        }
    }
}
