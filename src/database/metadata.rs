//! Schema catalog queries.

use crate::constants::{LIST_TABLES_SQL, TABLE_NOT_FOUND_SIGNATURES};
use crate::database::query::{materialize, ResultRow};
use crate::error::ServerError;
use crate::security::safe_identifier;
use rusqlite::Connection;

/// List user table names in ascending order.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>, ServerError> {
    let mut stmt = conn
        .prepare(LIST_TABLES_SQL)
        .map_err(|e| ServerError::execution("Error listing tables", e))?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| ServerError::execution("Error listing tables", e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::execution("Error reading table name", e))?;

    Ok(names)
}

/// Build the column-introspection statement for a table.
///
/// The name must already have passed the identifier guard; it is quoted here.
pub fn table_info_sql(table_name: &str) -> Result<String, ServerError> {
    Ok(format!("PRAGMA table_info({});", safe_identifier(table_name)?))
}

/// Describe the columns of `table_name`.
///
/// A missing table is reported as [`ServerError::TableNotFound`], whether the
/// driver signals it with an error or with an empty column list.
pub fn describe_table(conn: &Connection, table_name: &str) -> Result<Vec<ResultRow>, ServerError> {
    let sql = table_info_sql(table_name)?;

    let described = conn
        .prepare(&sql)
        .map_err(|e| ServerError::execution(format!("Error describing table '{}'", table_name), e))
        .and_then(|mut stmt| materialize(&mut stmt));

    match described {
        Ok(rows) if rows.is_empty() => Err(ServerError::TableNotFound(table_name.to_string())),
        Ok(rows) => Ok(rows),
        Err(err) if is_table_not_found(&err) => {
            Err(ServerError::TableNotFound(table_name.to_string()))
        }
        Err(ServerError::Execution { source, .. }) => Err(ServerError::execution(
            format!("Error describing table '{}'", table_name),
            source,
        )),
        Err(err) => Err(err),
    }
}

/// Whether an execution error means the requested table does not exist.
///
/// Matches on driver error text, which varies across SQLite versions.
pub fn is_table_not_found(err: &ServerError) -> bool {
    err.driver_message()
        .map(|message| is_table_not_found_message(&message))
        .unwrap_or(false)
}

fn is_table_not_found_message(message: &str) -> bool {
    let message = message.to_lowercase();
    TABLE_NOT_FOUND_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}
