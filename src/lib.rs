//! # SQLite Read-Only MCP Server
//!
//! A Model Context Protocol (MCP) server exposing one SQLite database file
//! to tool-calling clients, restricted to read-only access.
//!
//! This crate provides three tools:
//! - **read_query**: Execute a read-only SELECT query and return rows as JSON
//! - **list_tables**: List user tables
//! - **describe_table**: Show a table's column definitions
//!
//! ## Architecture
//!
//! Each tool call flows through the statement classifier (queries only),
//! the shared connection manager, the row materializer and the size-bounded
//! result encoder. Failures become error-flagged tool results; only startup
//! failures are fatal.

pub mod config;
pub mod constants;
pub mod database;
pub mod encoding;
pub mod error;
pub mod handlers;
pub mod security;
pub mod server;
pub mod shutdown;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::ServerError;
pub use server::SqliteMcpServer;
