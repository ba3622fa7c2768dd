use thiserror::Error;

use crate::catalog::CodecError;
use crate::common::types::{PageId, TableId};

/// Failures while materializing a page from raw bytes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Page buffer holds {actual} bytes, expected at least {expected}")]
    Truncated { expected: usize, actual: usize },
    #[error("Failed to decode field {field} of slot {slot}: {source}")]
    Field {
        slot: usize,
        field: usize,
        #[source]
        source: CodecError,
    },
    #[error("No schema registered for {0}")]
    SchemaNotFound(TableId),
}

/// Misuse or capacity failures of page mutations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Record schema does not match the schema of page {0}")]
    SchemaMismatch(PageId),
    #[error("Page {0} has no free slot")]
    PageFull(PageId),
    #[error("Record is not stored on page {0}")]
    RecordNotOnPage(PageId),
    #[error("Slot {slot} of page {page_id} is already empty")]
    SlotAlreadyEmpty { page_id: PageId, slot: usize },
    #[error("Slot {slot} is out of range for a page of {slot_count} slots")]
    SlotOutOfRange { slot: usize, slot_count: usize },
}

pub type ParseResult<T> = Result<T, ParseError>;
pub type StorageResult<T> = Result<T, StorageError>;
