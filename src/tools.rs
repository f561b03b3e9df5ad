//! MCP tools for read-only SQLite access.
//!
//! - `read_query`: Execute a read-only SELECT query and return rows as JSON
//! - `list_tables`: List user tables in the database
//! - `describe_table`: Show column definitions for a table

mod inputs;

pub use inputs::*;

use crate::constants::LOG_QUERY_TRUNCATE_LENGTH;
use crate::database::{self, truncate_for_log};
use crate::encoding::encode;
use crate::error::ServerError;
use crate::security::{classify, validate_identifier, Classification, READ_ONLY_VIOLATION};
use crate::server::SqliteMcpServer;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Tools exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ReadQuery,
    ListTables,
    DescribeTable,
}

impl ToolName {
    /// All tools in advertisement order.
    pub const ALL: [ToolName; 3] = [
        ToolName::ReadQuery,
        ToolName::ListTables,
        ToolName::DescribeTable,
    ];

    /// Wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReadQuery => "read_query",
            ToolName::ListTables => "list_tables",
            ToolName::DescribeTable => "describe_table",
        }
    }

    /// Human-readable description shown to clients.
    pub fn description(&self) -> &'static str {
        match self {
            ToolName::ReadQuery => "Execute a read-only SELECT query on the SQLite database",
            ToolName::ListTables => "List all tables in the SQLite database",
            ToolName::DescribeTable => "Get the schema information for a specific table",
        }
    }

    /// Tool definition advertised in `tools/list`.
    pub fn definition(&self) -> Tool {
        let schema = match self {
            ToolName::ReadQuery => ExecuteQueryInput::input_schema(),
            ToolName::ListTables => ListTablesInput::input_schema(),
            ToolName::DescribeTable => DescribeTableInput::input_schema(),
        };
        Tool::new(self.as_str(), self.description(), schema)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a tool name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToolError(String);

impl fmt::Display for UnknownToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown tool: {}", self.0)
    }
}

impl std::error::Error for UnknownToolError {}

impl FromStr for ToolName {
    type Err = UnknownToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| UnknownToolError(s.to_string()))
    }
}

/// Definitions of every tool, in advertisement order.
pub fn tool_definitions() -> Vec<Tool> {
    ToolName::ALL.iter().map(ToolName::definition).collect()
}

impl SqliteMcpServer {
    // =========================================================================
    // Query Execution
    // =========================================================================

    /// Execute a read-only query and return its rows as JSON.
    ///
    /// Queries that are not admitted by the classifier never reach the database.
    pub async fn execute_query(
        &self,
        query: &str,
        ct: &CancellationToken,
    ) -> Result<String, ServerError> {
        debug!(
            "Executing query: {}",
            truncate_for_log(query, LOG_QUERY_TRUNCATE_LENGTH)
        );

        if let Classification::Rejected(reason) = classify(query) {
            warn!("Rejected query: {}", reason);
            return Err(ServerError::policy(READ_ONLY_VIOLATION));
        }

        let sql = query.to_string();
        let rows = self
            .db
            .run(ct, move |conn| database::run_query(conn, &sql))
            .await?;
        encode(&rows)
    }

    // =========================================================================
    // Schema Discovery
    // =========================================================================

    /// List user tables as a JSON array of names.
    pub async fn list_tables(&self, ct: &CancellationToken) -> Result<String, ServerError> {
        debug!("Listing tables");
        let tables = self.db.run(ct, database::list_tables).await?;
        encode(&tables)
    }

    /// Describe the columns of one table as JSON.
    pub async fn describe_table(
        &self,
        table_name: &str,
        ct: &CancellationToken,
    ) -> Result<String, ServerError> {
        debug!("Describing table: {}", table_name);

        if let Err(e) = validate_identifier(table_name) {
            warn!("Rejected table name: {}", table_name);
            return Err(e);
        }

        let name = table_name.to_string();
        let rows = self
            .db
            .run(ct, move |conn| database::describe_table(conn, &name))
            .await?;
        encode(&rows)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Run one tool invocation, rendering failures as error-flagged results.
    pub async fn invoke(
        &self,
        tool: ToolName,
        arguments: Option<JsonObject>,
        ct: &CancellationToken,
    ) -> CallToolResult {
        let outcome = match tool {
            ToolName::ReadQuery => match ExecuteQueryInput::from_arguments(arguments) {
                Ok(input) => self.execute_query(&input.query, ct).await,
                Err(e) => Err(e),
            },
            ToolName::ListTables => match ListTablesInput::from_arguments(arguments) {
                Ok(_) => self.list_tables(ct).await,
                Err(e) => Err(e),
            },
            ToolName::DescribeTable => match DescribeTableInput::from_arguments(arguments) {
                Ok(input) => self.describe_table(&input.table_name, ct).await,
                Err(e) => Err(e),
            },
        };

        match outcome {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                if e.is_fatal() {
                    error!("Tool {} failed [{}]: {}", tool, e.category(), e);
                } else {
                    warn!("Tool {} failed [{}]: {}", tool, e.category(), e);
                }
                CallToolResult::error(vec![Content::text(e.to_string())])
            }
        }
    }
}
