// Query Result Implementation
//
// This module defines the error and result types for query execution.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::disk::HeapFileError;
use crate::storage::page::{ParseError, StorageError};

/// Represents query execution error
#[derive(Error, Debug)]
pub enum QueryError {
    /// `open` called on an operator that is already open
    #[error("Operator is already open")]
    AlreadyOpen,
    /// Operator used before `open` or after `close`
    #[error("Operator is not open")]
    NotOpen,
    /// `next` called past the end of the output
    #[error("No more elements")]
    NoMoreElements,
    /// Aggregate requested over a field type it cannot apply to
    #[error("Invalid aggregate: {0}")]
    InvalidAggregate(String),
    /// Error in data type of an input value
    #[error("Type error: {0}")]
    TypeError(String),
    /// Numeric overflow
    #[error("Numeric overflow")]
    NumericOverflow,
    #[error("Catalog error: {0}")]
    CatalogError(#[from] CatalogError),
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Page parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Heap file error: {0}")]
    HeapFileError(#[from] HeapFileError),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
