//! Single shared SQLite connection management.
//!
//! The process holds exactly one database handle. Jobs reach it through
//! [`ConnectionManager::run`], which serializes access, moves the blocking
//! SQLite work onto the blocking thread pool, and ties each job to the
//! caller's cancellation token. [`ConnectionManager::close`] interrupts
//! whatever job is running before it takes the handle.

use crate::constants::{PING_SQL, PROGRESS_HANDLER_OPS};
use crate::error::ServerError;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owner of the process-wide database handle.
pub struct ConnectionManager {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
    closing: Arc<AtomicBool>,
}

impl ConnectionManager {
    /// Open the database read-only and verify it is readable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ServerError::config("database file path is empty"));
        }

        info!("Opening database {} (read-only)", path.display());

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            ServerError::connection_with_source(
                format!("failed to open database {}", path.display()),
                e,
            )
        })?;

        ping(&conn).map_err(|e| {
            ServerError::connection_with_source(
                format!("failed to connect to database {}", path.display()),
                e,
            )
        })?;

        info!("Successfully connected to database: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            conn: Arc::new(Mutex::new(Some(conn))),
            closing: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Path of the open database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the handle is still open.
    pub async fn is_open(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Run `job` against the shared connection.
    ///
    /// Cancelling `ct` while waiting for the connection abandons the wait;
    /// cancelling it while the job runs interrupts the job's statement.
    /// Dropping the returned future interrupts the job as well, and so does
    /// [`close`](Self::close).
    pub async fn run<T, F>(&self, ct: &CancellationToken, job: F) -> Result<T, ServerError>
    where
        F: FnOnce(&Connection) -> Result<T, ServerError> + Send + 'static,
        T: Send + 'static,
    {
        if ct.is_cancelled() {
            return Err(ServerError::Cancelled);
        }

        let guard = tokio::select! {
            biased;
            _ = ct.cancelled() => {
                debug!("Cancelled while waiting for the database connection");
                return Err(ServerError::Cancelled);
            }
            guard = self.conn.clone().lock_owned() => guard,
        };

        let interrupted = Arc::new(AtomicBool::new(false));
        let _interrupt_on_drop = InterruptOnDrop(interrupted.clone());
        let closing = self.closing.clone();

        let mut task = tokio::task::spawn_blocking(move || {
            let conn = guard
                .as_ref()
                .ok_or_else(|| ServerError::connection("database connection is closed"))?;

            let (flag, closing_flag) = (interrupted.clone(), closing.clone());
            conn.progress_handler(
                PROGRESS_HANDLER_OPS,
                Some(move || {
                    flag.load(Ordering::Relaxed) || closing_flag.load(Ordering::SeqCst)
                }),
            );

            let result = if closing.load(Ordering::SeqCst) {
                Err(ServerError::connection("database connection is closing"))
            } else if interrupted.load(Ordering::Relaxed) {
                Err(ServerError::Cancelled)
            } else {
                match job(conn) {
                    Err(_) if closing.load(Ordering::SeqCst) => {
                        Err(ServerError::connection("database connection is closing"))
                    }
                    other => other,
                }
            };

            conn.progress_handler(0, None::<fn() -> bool>);
            result
        });

        tokio::select! {
            joined = &mut task => flatten(joined),
            _ = ct.cancelled() => {
                debug!("Cancelling in-flight query");
                drop(_interrupt_on_drop);
                // The statement unwinds at the next progress check.
                let _ = task.await;
                Err(ServerError::Cancelled)
            }
        }
    }

    /// Close the handle. Later calls are no-ops.
    ///
    /// A statement still running is interrupted at its next progress check,
    /// so closing never waits on a query that would not finish by itself.
    pub async fn close(&self) -> Result<(), ServerError> {
        if !self.closing.swap(true, Ordering::SeqCst) {
            debug!("Interrupting in-flight query before close");
        }

        let mut slot = self.conn.lock().await;
        let Some(conn) = slot.take() else {
            debug!("Database connection already closed");
            return Ok(());
        };

        info!("Closing database connection...");
        conn.close().map_err(|(_, e)| {
            warn!("Error closing database connection: {}", e);
            ServerError::connection_with_source("failed to close database connection", e)
        })
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Raises the job's interrupt flag when dropped.
struct InterruptOnDrop(Arc<AtomicBool>);

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Verify the handle can read the schema catalog.
fn ping(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row(PING_SQL, [], |row| row.get::<_, i64>(0))
        .map(|_| ())
}

/// Collapse a blocking task's join result into the job's own result.
fn flatten<T>(
    joined: Result<Result<T, ServerError>, tokio::task::JoinError>,
) -> Result<T, ServerError> {
    joined.unwrap_or_else(|e| Err(ServerError::internal(format!("query task failed: {}", e))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const ENDLESS_QUERY: &str = "SELECT COUNT(*) FROM (WITH RECURSIVE c(x) AS \
                                 (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c)";

    fn create_database(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("test.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1), (2);")
            .unwrap();
        path
    }

    #[test]
    fn test_open_empty_path() {
        let err = ConnectionManager::open("").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ConnectionManager::open(dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, ServerError::Connection { .. }));
    }

    #[test]
    fn test_open_not_a_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();
        let err = ConnectionManager::open(&path).unwrap_err();
        assert!(matches!(err, ServerError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_run_job() {
        let dir = TempDir::new().unwrap();
        let manager = ConnectionManager::open(create_database(&dir)).unwrap();
        let ct = CancellationToken::new();

        let count = manager
            .run(&ct, |conn| {
                conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get::<_, i64>(0))
                    .map_err(|e| ServerError::execution("count", e))
            })
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_handle_is_read_only() {
        let dir = TempDir::new().unwrap();
        let manager = ConnectionManager::open(create_database(&dir)).unwrap();
        let ct = CancellationToken::new();

        let result = manager
            .run(&ct, |conn| {
                conn.execute("INSERT INTO t VALUES (3)", [])
                    .map_err(|e| ServerError::execution("insert", e))
            })
            .await;
        assert!(matches!(result, Err(ServerError::Execution { .. })));
    }

    #[tokio::test]
    async fn test_close_idempotent() {
        let dir = TempDir::new().unwrap();
        let manager = ConnectionManager::open(create_database(&dir)).unwrap();

        assert!(manager.is_open().await);
        manager.close().await.unwrap();
        assert!(!manager.is_open().await);
        manager.close().await.unwrap();

        let ct = CancellationToken::new();
        let result = manager.run(&ct, |_| Ok(())).await;
        assert!(matches!(result, Err(ServerError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token() {
        let dir = TempDir::new().unwrap();
        let manager = ConnectionManager::open(create_database(&dir)).unwrap();
        let ct = CancellationToken::new();
        ct.cancel();

        let result = manager.run(&ct, |_| Ok(())).await;
        assert!(matches!(result, Err(ServerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_running_statement() {
        let dir = TempDir::new().unwrap();
        let manager = ConnectionManager::open(create_database(&dir)).unwrap();
        let ct = CancellationToken::new();

        let canceller = ct.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            manager.run(&ct, move |conn| {
                conn.query_row(ENDLESS_QUERY, [], |row| row.get::<_, i64>(0))
                    .map_err(|e| ServerError::execution("endless", e))
            }),
        )
        .await
        .expect("cancellation did not interrupt the statement");
        assert!(matches!(result, Err(ServerError::Cancelled)));

        // The connection stays usable afterwards.
        let fresh = CancellationToken::new();
        let value = manager
            .run(&fresh, |conn| {
                conn.query_row("SELECT 7", [], |row| row.get::<_, i64>(0))
                    .map_err(|e| ServerError::execution("select", e))
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_close_interrupts_uncancelled_statement() {
        let dir = TempDir::new().unwrap();
        let manager = Arc::new(ConnectionManager::open(create_database(&dir)).unwrap());

        let running = manager.clone();
        let job = tokio::spawn(async move {
            let ct = CancellationToken::new();
            running
                .run(&ct, |conn| {
                    conn.query_row(ENDLESS_QUERY, [], |row| row.get::<_, i64>(0))
                        .map_err(|e| ServerError::execution("endless", e))
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(200)).await;

        tokio::time::timeout(Duration::from_secs(5), manager.close())
            .await
            .expect("close waited on the running statement")
            .unwrap();
        assert!(!manager.is_open().await);

        let result = job.await.unwrap();
        assert!(matches!(result, Err(ServerError::Connection { .. })));
    }
}
