//! Security module for read-only query classification and identifier guarding.

mod identifiers;
mod validation;

pub use identifiers::{
    quote_identifier, safe_identifier, validate_identifier, FORBIDDEN_IDENTIFIER_CHARS,
    INVALID_IDENTIFIER,
};
pub use validation::{classify, Classification, READ_ONLY_VIOLATION};
