//! Graceful shutdown handling.
//!
//! This module provides:
//! - Signal handling (SIGTERM, SIGHUP, Ctrl+C)
//! - Bounded wait for the transport to stop
//! - Database connection close

use crate::constants::DEFAULT_TRANSPORT_STOP_TIMEOUT;
use crate::database::ConnectionManager;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Shutdown signal that can be awaited.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for the shutdown signal.
    pub async fn recv(&mut self) {
        let _ = self.receiver.wait_for(|&v| v).await;
    }
}

/// Shutdown phases, logged as cleanup progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Shutdown has been initiated.
    Initiated,

    /// Waiting for the transport to stop serving.
    StoppingTransport,

    /// Closing the database connection.
    ClosingConnection,

    /// Final cleanup complete.
    Complete,
}

impl std::fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownPhase::Initiated => write!(f, "initiated"),
            ShutdownPhase::StoppingTransport => write!(f, "stopping_transport"),
            ShutdownPhase::ClosingConnection => write!(f, "closing_connection"),
            ShutdownPhase::Complete => write!(f, "complete"),
        }
    }
}

/// Controller for managing graceful shutdown.
pub struct ShutdownController {
    sender: watch::Sender<bool>,
    shutting_down: AtomicBool,
    transport_stop_timeout: Duration,
}

impl ShutdownController {
    /// Create a new shutdown controller with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TRANSPORT_STOP_TIMEOUT)
    }

    /// Create a shutdown controller with a custom transport stop timeout.
    pub fn with_timeout(transport_stop_timeout: Duration) -> Self {
        let (sender, _) = watch::channel(false);

        Self {
            sender,
            shutting_down: AtomicBool::new(false),
            transport_stop_timeout,
        }
    }

    /// Get a shutdown signal receiver.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Initiate shutdown. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.notify_phase(ShutdownPhase::Initiated);
            let _ = self.sender.send(true);
        }
    }

    fn notify_phase(&self, phase: ShutdownPhase) {
        info!("Shutdown phase: {}", phase);
    }

    /// Perform graceful shutdown.
    ///
    /// Signals every listener, waits up to the transport stop timeout for
    /// `transport_stopped` to resolve, then closes the database connection.
    /// Closing interrupts any query still running, so this always completes.
    pub async fn graceful_shutdown<F>(&self, db: &ConnectionManager, transport_stopped: F)
    where
        F: Future<Output = ()>,
    {
        self.shutdown();

        self.notify_phase(ShutdownPhase::StoppingTransport);
        if tokio::time::timeout(self.transport_stop_timeout, transport_stopped)
            .await
            .is_err()
        {
            warn!(
                "Transport did not stop within {:?}, continuing shutdown",
                self.transport_stop_timeout
            );
        }

        self.notify_phase(ShutdownPhase::ClosingConnection);
        if let Err(e) = db.close().await {
            error!("Failed to close database connection: {}", e);
        }

        self.notify_phase(ShutdownPhase::Complete);
        info!("Graceful shutdown complete");
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared shutdown controller type.
pub type SharedShutdownController = Arc<ShutdownController>;

/// Create a new shared shutdown controller.
pub fn new_shutdown_controller() -> SharedShutdownController {
    Arc::new(ShutdownController::new())
}

/// Install signal handlers for graceful shutdown.
///
/// Ctrl+C, SIGTERM and SIGHUP (Unix) all trigger the controller.
pub async fn install_signal_handlers(controller: SharedShutdownController) {
    let ctrl_c_controller = controller.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating shutdown...");
                ctrl_c_controller.shutdown();
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C signal: {}", e);
            }
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        for (kind, name) in [
            (SignalKind::terminate(), "SIGTERM"),
            (SignalKind::hangup(), "SIGHUP"),
        ] {
            let controller = controller.clone();
            tokio::spawn(async move {
                match signal(kind) {
                    Ok(mut stream) => {
                        stream.recv().await;
                        info!("Received {}, initiating shutdown...", name);
                        controller.shutdown();
                    }
                    Err(e) => {
                        error!("Failed to install {} handler: {}", name, e);
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::server::SqliteMcpServer;
    use rusqlite::Connection;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn open_server(dir: &TempDir) -> SqliteMcpServer {
        let path = dir.path().join("shutdown.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER);")
            .unwrap();
        SqliteMcpServer::connect(&DatabaseConfig::new(&path)).unwrap()
    }

    #[tokio::test]
    async fn test_shutdown_signal() {
        let controller = ShutdownController::new();
        let mut signal = controller.signal();

        controller.shutdown();
        controller.shutdown();

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("shutdown signal not delivered");
    }

    #[tokio::test]
    async fn test_graceful_shutdown_closes_connection() {
        let dir = TempDir::new().unwrap();
        let server = open_server(&dir);
        let controller = new_shutdown_controller();
        let mut signal = controller.signal();

        controller.graceful_shutdown(server.database(), async {}).await;

        signal.recv().await;
        assert!(!server.database().is_open().await);
    }

    #[tokio::test]
    async fn test_stuck_transport_times_out() {
        let dir = TempDir::new().unwrap();
        let server = open_server(&dir);
        let controller = ShutdownController::with_timeout(Duration::from_millis(50));

        controller
            .graceful_shutdown(server.database(), std::future::pending::<()>())
            .await;

        assert!(!server.database().is_open().await);
    }

    #[tokio::test]
    async fn test_graceful_shutdown_with_query_in_flight() {
        let dir = TempDir::new().unwrap();
        let server = open_server(&dir);

        let running = server.clone();
        let query = tokio::spawn(async move {
            running
                .execute_query(
                    "SELECT count(*) FROM (WITH RECURSIVE c(x) AS \
                     (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c)",
                    &CancellationToken::new(),
                )
                .await
        });
        tokio::time::sleep(Duration::from_millis(200)).await;

        let controller = ShutdownController::with_timeout(Duration::from_millis(50));
        tokio::time::timeout(
            Duration::from_secs(5),
            controller.graceful_shutdown(server.database(), async {}),
        )
        .await
        .expect("graceful shutdown waited on the running query");

        assert!(!server.database().is_open().await);
        assert!(query.await.unwrap().is_err());
    }

    #[test]
    fn test_shutdown_phase_display() {
        assert_eq!(ShutdownPhase::Initiated.to_string(), "initiated");
        assert_eq!(
            ShutdownPhase::StoppingTransport.to_string(),
            "stopping_transport"
        );
        assert_eq!(
            ShutdownPhase::ClosingConnection.to_string(),
            "closing_connection"
        );
        assert_eq!(ShutdownPhase::Complete.to_string(), "complete");
    }
}
