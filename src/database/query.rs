//! Query execution and row materialization.

use crate::database::types::{CellValue, ColumnDescriptor};
use crate::error::ServerError;
use rusqlite::{Connection, Statement};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A single row of query results.
///
/// Column names are shared between all rows of one result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    columns: Arc<[String]>,
    values: Vec<CellValue>,
}

impl ResultRow {
    /// Create a new result row.
    pub fn new(columns: Arc<[String]>, values: Vec<CellValue>) -> Self {
        Self { columns, values }
    }

    /// Get a value by column name. With duplicate names the last column wins.
    #[cfg(test)]
    pub(crate) fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .rposition(|name| name == column)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Serialized as a JSON object with keys in ascending order.
impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields: BTreeMap<&str, &CellValue> = self
            .columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
            .collect();

        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Prepare `sql` and materialize every row it produces.
///
/// The statement is finalized before returning, on success or failure.
pub fn run_query(conn: &Connection, sql: &str) -> Result<Vec<ResultRow>, ServerError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ServerError::execution("Error executing query", e))?;
    materialize(&mut stmt)
}

/// Drive a prepared statement to completion, converting each row.
///
/// All-or-nothing: any scan failure discards the rows read so far.
pub fn materialize(stmt: &mut Statement<'_>) -> Result<Vec<ResultRow>, ServerError> {
    let columns: Vec<ColumnDescriptor> = stmt
        .columns()
        .iter()
        .map(|col| ColumnDescriptor::new(col.name(), col.decl_type()))
        .collect();
    let names: Arc<[String]> = columns.iter().map(|col| col.name.clone()).collect();

    let mut cursor = stmt
        .query([])
        .map_err(|e| ServerError::execution("Error executing query", e))?;

    let mut rows = Vec::new();
    while let Some(row) = cursor
        .next()
        .map_err(|e| ServerError::execution("Error reading result row", e))?
    {
        let values = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| row.get_ref(idx).map(|value| CellValue::from_sqlite(value, col)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServerError::execution("Error reading result column", e))?;
        rows.push(ResultRow::new(names.clone(), values));
    }

    debug!("Materialized {} row(s) across {} column(s)", rows.len(), columns.len());
    Ok(rows)
}

/// Truncate a string for logging purposes.
pub fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}
