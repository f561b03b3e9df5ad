//! SQLite value mapping to JSON-safe cell values.
//!
//! SQLite's dynamic typing means the storage class of a cell says little
//! about the column. The declared column type is the only reliable signal
//! for telling binary payloads apart from text, so coercion consults it.

use rusqlite::types::ValueRef;
use serde::{Serialize, Serializer};

/// Metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as reported by the statement.
    pub name: String,

    /// Declared type, empty for expressions and untyped columns.
    pub decl_type: String,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(name: impl Into<String>, decl_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            decl_type: decl_type.unwrap_or_default().to_string(),
        }
    }

    /// Whether the declared type marks this column as binary.
    pub fn is_blob(&self) -> bool {
        self.decl_type.to_uppercase().contains("BLOB")
    }

    /// Whether the declared type marks this column as boolean.
    pub fn is_boolean(&self) -> bool {
        matches!(self.decl_type.trim().to_uppercase().as_str(), "BOOL" | "BOOLEAN")
    }
}

/// A cell value that can be serialized to JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    /// Binary payload withheld from output; only its length is kept.
    Blob { len: usize },
}

impl CellValue {
    /// Convert a raw SQLite value using its column's declared type.
    pub fn from_sqlite(value: ValueRef<'_>, column: &ColumnDescriptor) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Blob(bytes) if column.is_blob() => CellValue::Blob { len: bytes.len() },
            ValueRef::Blob(bytes) | ValueRef::Text(bytes) => {
                CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
            ValueRef::Integer(v) if column.is_boolean() => CellValue::Bool(v != 0),
            ValueRef::Integer(v) => CellValue::Integer(v),
            ValueRef::Real(v) => CellValue::Real(v),
        }
    }

    /// Placeholder text emitted in place of binary data.
    pub fn blob_placeholder(len: usize) -> String {
        format!("BLOB data (length {})", len)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(v) => serializer.serialize_bool(*v),
            CellValue::Integer(v) => serializer.serialize_i64(*v),
            CellValue::Real(v) => serializer.serialize_f64(*v),
            CellValue::Text(v) => serializer.serialize_str(v),
            CellValue::Blob { len } => serializer.serialize_str(&Self::blob_placeholder(*len)),
        }
    }
}
