use thiserror::Error;

use crate::common::types::TableId;

/// Errors raised by the field codecs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Need {needed} bytes to decode {type_name}, got {available}")]
    ShortBuffer {
        type_name: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("String length prefix {0} exceeds the fixed string width")]
    StringTooLong(usize),
    #[error("String bytes are not valid UTF-8")]
    InvalidUtf8,
}

/// Errors raised while building schemas, records, or resolving tables
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("A record schema needs at least one field")]
    EmptySchema,
    #[error("Field index {index} out of range for a schema of {num_fields} fields")]
    FieldIndexOutOfRange { index: usize, num_fields: usize },
    #[error("Expected {expected} field values, got {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },
    #[error("Type mismatch for field {index}: expected {expected}, got {actual}")]
    FieldTypeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Table not found: {0}")]
    TableNotFound(TableId),
    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),
    #[error("Invalid schema spec: {0}")]
    InvalidSchemaSpec(String),
    #[error("Invalid value '{value}' for type {type_name}")]
    InvalidLiteral { value: String, type_name: String },
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Catalog result type
pub type CatalogResult<T> = Result<T, CatalogError>;
