//! MCP server struct definition and initialization.

use crate::config::DatabaseConfig;
use crate::database::ConnectionManager;
use crate::error::ServerError;
use std::path::Path;
use std::sync::Arc;

/// The SQLite read-only MCP server instance.
///
/// This struct is cloned for each session, but the database handle is
/// shared via Arc. The server exposes three tools: `read_query`,
/// `list_tables` and `describe_table`.
#[derive(Clone, Debug)]
pub struct SqliteMcpServer {
    /// Shared database connection.
    pub(crate) db: Arc<ConnectionManager>,
}

impl SqliteMcpServer {
    /// Create a server around an already opened connection.
    pub fn new(db: Arc<ConnectionManager>) -> Self {
        Self { db }
    }

    /// Open the configured database and create a server for it.
    ///
    /// Fails if the file cannot be opened or is not a readable database.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, ServerError> {
        let db = ConnectionManager::open(&config.path)?;
        Ok(Self::new(Arc::new(db)))
    }

    /// Get a reference to the connection manager.
    pub fn database(&self) -> &Arc<ConnectionManager> {
        &self.db
    }

    /// Path of the served database file.
    pub fn database_path(&self) -> &Path {
        self.db.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::TempDir;

    #[test]
    fn test_connect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER);")
            .unwrap();

        let server = SqliteMcpServer::connect(&DatabaseConfig::new(&path)).unwrap();
        assert_eq!(server.database_path(), path.as_path());

        let clone = server.clone();
        assert!(Arc::ptr_eq(clone.database(), server.database()));
    }

    #[test]
    fn test_connect_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = SqliteMcpServer::connect(&DatabaseConfig::new(dir.path().join("nope.db")))
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
