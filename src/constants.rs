//! Centralized constants for the SQLite read-only MCP server.
//!
//! Fixed limits, default configuration values and literal protocol strings
//! live here so they are easy to find and audit.

use std::time::Duration;

// =============================================================================
// Server Identity
// =============================================================================

/// Server name reported during the MCP handshake.
pub const SERVER_NAME: &str = "sqlite-readonly-mcp-server";

// =============================================================================
// Result Size Constants
// =============================================================================

/// Maximum size in bytes of an encoded result before it is truncated.
pub const MAX_OUTPUT_BYTES: usize = 10_000;

/// Literal appended to an encoded result that was cut at [`MAX_OUTPUT_BYTES`].
pub const TRUNCATION_MARKER: &str = "\n... (results truncated)";

// =============================================================================
// Query Execution Constants
// =============================================================================

/// Number of SQLite virtual machine instructions between cancellation checks.
pub const PROGRESS_HANDLER_OPS: i32 = 1_000;

/// Catalog query used to verify the database is readable at startup.
pub const PING_SQL: &str = "SELECT COUNT(*) FROM sqlite_schema";

/// Catalog query listing user tables, internal `sqlite_` tables excluded.
pub const LIST_TABLES_SQL: &str =
    "SELECT name FROM sqlite_schema WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name;";

/// Error text fragments the driver reports when a table does not exist.
pub const TABLE_NOT_FOUND_SIGNATURES: &[&str] = &["no such table", "unable to use function"];

// =============================================================================
// Transport Constants
// =============================================================================

/// Default HTTP listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default HTTP bind host (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Path the streamable HTTP MCP endpoint is mounted on.
pub const MCP_HTTP_PATH: &str = "/mcp";

// =============================================================================
// Shutdown Constants
// =============================================================================

/// Maximum time to wait for the transport to stop after a shutdown signal.
pub const DEFAULT_TRANSPORT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Logging Constants
// =============================================================================

/// Default truncation length for query logging.
pub const LOG_QUERY_TRUNCATE_LENGTH: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_marker_literal() {
        assert_eq!(TRUNCATION_MARKER, "\n... (results truncated)");
        assert_eq!(TRUNCATION_MARKER.len(), 24);
    }

    #[test]
    fn test_list_tables_excludes_internal_tables() {
        assert!(LIST_TABLES_SQL.contains("NOT LIKE 'sqlite_%'"));
        assert!(LIST_TABLES_SQL.contains("ORDER BY name"));
    }

    #[test]
    fn test_progress_handler_granularity_positive() {
        assert!(PROGRESS_HANDLER_OPS > 0);
    }
}
