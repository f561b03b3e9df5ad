//! Error types for the SQLite read-only MCP server.
//!
//! Startup errors (`Config`, `Connection`) are fatal and propagate out of
//! `main`. Every other variant is produced while serving a tool call and is
//! rendered back to the caller as an error-flagged tool result.

use thiserror::Error;

/// Domain-specific errors for the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or invalid startup input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database could not be opened, verified, or is no longer open
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Missing or invalid tool argument
    #[error("{0}")]
    InvalidArgument(String),

    /// Query or identifier rejected by the read-only policy
    #[error("{0}")]
    Policy(String),

    /// Table passed to `describe_table` does not exist
    #[error("Table '{0}' not found or PRAGMA query failed.")]
    TableNotFound(String),

    /// Statement preparation, execution, or row scan failure
    #[error("{context}: {source}")]
    Execution {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Result serialization failure
    #[error("Error formatting results: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The caller canceled the request while it was waiting or running
    #[error("Query was cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a connection error with a source.
    pub fn connection_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a policy rejection error.
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::Policy(msg.into())
    }

    /// Wrap a driver error with the operation that produced it.
    pub fn execution(context: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Execution {
            context: context.into(),
            source,
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error should halt startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Connection { .. })
    }

    /// Short category name used in logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection { .. } => "connect",
            Self::InvalidArgument(_) => "argument",
            Self::Policy(_) => "policy",
            Self::TableNotFound(_) => "not_found",
            Self::Execution { .. } => "execution",
            Self::Encoding(_) => "encoding",
            Self::Cancelled => "cancelled",
            Self::Internal(_) => "internal",
        }
    }

    /// The driver's message for execution errors.
    pub fn driver_message(&self) -> Option<String> {
        match self {
            Self::Execution { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}
