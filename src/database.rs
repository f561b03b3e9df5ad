//! Database connectivity and query execution.

mod connection;
pub mod metadata;
mod query;
pub mod types;

pub use connection::ConnectionManager;
pub use metadata::{describe_table, list_tables};
pub use query::{materialize, run_query, truncate_for_log, ResultRow};
pub use types::{CellValue, ColumnDescriptor};
