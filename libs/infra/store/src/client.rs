use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{info, instrument};

use crate::errors::StoreError;
use crate::schema::apply_schema;

/// Wraps a `libsql::Database`, local-file, `:memory:`, or remote-URL
/// backed. The engine assumes a single writer process per store; writers
/// are serialized by libSQL's own transaction discipline.
#[derive(Clone)]
pub struct StoreClient {
    database: Arc<Database>,
    /// Keeps an in-memory database alive for the process lifetime — SQLite
    /// drops an in-memory database's contents once its last connection
    /// closes, so one connection is held open here.
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(url: &str, auth_token: Option<String>) -> Result<Self, StoreError> {
        if url.is_empty() {
            return Err(StoreError::Connection("storage location is empty".into()));
        }

        info!(url, "connecting to store");

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        let database = if is_remote {
            let token = auth_token
                .ok_or_else(|| StoreError::Connection("remote store requires an auth token".into()))?;
            Builder::new_remote(url.to_string(), token).build().await
        } else {
            Builder::new_local(url).build().await
        }
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        let database = Arc::new(database);
        let anchor = if is_memory {
            let conn = database
                .connect()
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            apply_schema(&conn)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            Some(Arc::new(conn))
        } else {
            let conn = database
                .connect()
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            apply_schema(&conn)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            None
        };

        Ok(Self {
            database,
            _memory_anchor: anchor,
        })
    }

    pub fn connection(&self) -> Result<Connection, StoreError> {
        self.database
            .connect()
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}
