//! SQLite identifier guarding and quoting.
//!
//! Table names that reach a schema-introspection statement are first checked
//! for forbidden characters, then wrapped in double quotes with embedded
//! quotes doubled.

use crate::error::ServerError;

/// Characters that may not appear in an interpolated table name.
pub const FORBIDDEN_IDENTIFIER_CHARS: &[char] = &['\'', ';', '-'];

/// Message returned when a table name contains a forbidden character.
pub const INVALID_IDENTIFIER: &str = "Invalid characters in table name.";

/// Validate that a table name contains none of the forbidden characters.
pub fn validate_identifier(identifier: &str) -> Result<(), ServerError> {
    if identifier.contains(FORBIDDEN_IDENTIFIER_CHARS) {
        return Err(ServerError::policy(INVALID_IDENTIFIER));
    }
    Ok(())
}

/// Quote an identifier using SQLite double-quote notation.
///
/// ```
/// use sqlite_readonly_mcp_server::security::quote_identifier;
///
/// assert_eq!(quote_identifier("Users"), "\"Users\"");
/// assert_eq!(quote_identifier("My Table"), "\"My Table\"");
/// assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Validate and quote an identifier for safe interpolation.
pub fn safe_identifier(identifier: &str) -> Result<String, ServerError> {
    validate_identifier(identifier)?;
    Ok(quote_identifier(identifier))
}
