//! Tool input types with JSON Schema generation.

use crate::error::ServerError;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Arguments accepted by one tool.
pub trait ToolInput: DeserializeOwned + JsonSchema {
    /// Message returned when the arguments are missing or malformed.
    const INVALID_ARGUMENTS: &'static str;

    /// Whether every required argument carries a usable value.
    fn is_complete(&self) -> bool {
        true
    }

    /// Decode the raw call arguments.
    fn from_arguments(arguments: Option<JsonObject>) -> Result<Self, ServerError> {
        let value = Value::Object(arguments.unwrap_or_default());
        let input: Self = serde_json::from_value(value).map_err(|e| {
            debug!("Rejected tool arguments: {}", e);
            ServerError::invalid_argument(Self::INVALID_ARGUMENTS)
        })?;

        if !input.is_complete() {
            return Err(ServerError::invalid_argument(Self::INVALID_ARGUMENTS));
        }
        Ok(input)
    }

    /// JSON Schema advertised for the tool's input.
    fn input_schema() -> Arc<JsonObject> {
        let schema = schemars::schema_for!(Self);
        match serde_json::to_value(schema) {
            Ok(Value::Object(map)) => Arc::new(map),
            _ => Arc::new(JsonObject::new()),
        }
    }
}

/// Input for the `read_query` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// The SQL query to execute.
    #[schemars(description = "SELECT SQL query to execute")]
    pub query: String,
}

impl ToolInput for ExecuteQueryInput {
    const INVALID_ARGUMENTS: &'static str = "Missing or invalid 'query' argument.";

    fn is_complete(&self) -> bool {
        !self.query.is_empty()
    }
}

/// Input for the `list_tables` tool, which takes no arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListTablesInput {}

impl ToolInput for ListTablesInput {
    const INVALID_ARGUMENTS: &'static str = "Invalid arguments for 'list_tables'.";
}

/// Input for the `describe_table` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe.
    #[schemars(description = "Name of the table to describe")]
    pub table_name: String,
}

impl ToolInput for DescribeTableInput {
    const INVALID_ARGUMENTS: &'static str = "Missing or invalid 'table_name' argument.";

    fn is_complete(&self) -> bool {
        !self.table_name.is_empty()
    }
}
