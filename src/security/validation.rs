//! Read-only statement classification.
//!
//! Classification is a prefix check: after trimming surrounding whitespace
//! and case-folding, a query is admitted only if it starts with `SELECT`.
//! Comment-prefixed queries are rejected, and statements stacked after a
//! leading `SELECT` are not detected here.

/// Message returned to callers whose query is not admitted.
pub const READ_ONLY_VIOLATION: &str = "Only SELECT queries are allowed for read-only access.";

/// Keyword a query must start with to be admitted.
const ALLOWED_PREFIX: &str = "SELECT";

/// Outcome of classifying a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The query may be executed.
    Allowed,
    /// The query must not be executed; carries a reason for logs.
    Rejected(String),
}

impl Classification {
    /// Check if the query was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Classification::Allowed)
    }
}

/// Classify a raw query string.
pub fn classify(query: &str) -> Classification {
    let normalized = query.trim().to_uppercase();

    if normalized.starts_with(ALLOWED_PREFIX) {
        return Classification::Allowed;
    }

    let reason = match leading_token(&normalized) {
        Some(token) => format!("statement begins with '{}'", token),
        None => "statement is empty".to_string(),
    };
    Classification::Rejected(reason)
}

/// First run of non-whitespace characters in the normalized query.
fn leading_token(normalized: &str) -> Option<&str> {
    normalized.split_whitespace().next()
}
