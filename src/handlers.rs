//! ServerHandler implementation for the SQLite read-only MCP server.
//!
//! This module implements the rmcp `ServerHandler` trait which defines how
//! the server responds to MCP protocol requests.

use crate::constants::SERVER_NAME;
use crate::server::SqliteMcpServer;
use crate::tools::{tool_definitions, ToolName};
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ProtocolVersion, ServerCapabilities, ServerInfo, SetLevelRequestParam,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData;
use tracing::{debug, info, warn};

impl ServerHandler for SqliteMcpServer {
    /// Server identification - called during initialization handshake.
    fn get_info(&self) -> ServerInfo {
        info!("MCP client requesting server info");

        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,

            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),

            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                title: Some("SQLite Read-Only MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },

            instructions: Some(build_instructions(self)),
        }
    }

    /// List available tools.
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(tool_definitions()))
    }

    /// Dispatch a tool call.
    ///
    /// Unknown tools are a protocol error; every other failure is reported
    /// as an error-flagged tool result.
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool: ToolName = request.name.parse().map_err(|e| {
            warn!("Rejected call to unknown tool '{}'", request.name);
            ErrorData::invalid_params(format!("{}", e), None)
        })?;

        debug!("Calling tool {}", tool);
        Ok(self.invoke(tool, request.arguments, &context.ct).await)
    }

    /// Accept a client log level. Server logs stay governed by `RUST_LOG`.
    async fn set_level(
        &self,
        request: SetLevelRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<(), ErrorData> {
        debug!("Client requested log level {:?}", request.level);
        Ok(())
    }
}

/// Build server instructions for the connected database.
fn build_instructions(server: &SqliteMcpServer) -> String {
    let mut instructions = String::new();

    instructions.push_str("# SQLite Read-Only MCP Server\n\n");
    instructions.push_str(&format!(
        "**Connected to database:** `{}`\n\n",
        server.database_path().display()
    ));

    instructions.push_str("## Available Tools\n\n");
    for tool in ToolName::ALL {
        instructions.push_str(&format!("- `{}`: {}\n", tool, tool.description()));
    }

    instructions.push_str("\n### Access Policy\n");
    instructions.push_str("- **Read-only mode**: Only SELECT queries are allowed\n");
    instructions.push_str("- Results larger than 10,000 bytes are truncated\n");
    instructions.push_str("- BLOB columns are reported by length only\n");

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use rusqlite::Connection;
    use tempfile::TempDir;

    #[test]
    fn test_server_info() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("info.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER);")
            .unwrap();
        let server = SqliteMcpServer::connect(&DatabaseConfig::new(&path)).unwrap();

        let info = server.get_info();
        assert_eq!(info.server_info.name, "sqlite-readonly-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.logging.is_some());

        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("info.db"));
        assert!(instructions.contains("`read_query`"));
        assert!(instructions.contains("Only SELECT queries"));
    }
}
