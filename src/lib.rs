// HeapDB storage and aggregation core

pub mod catalog;
pub mod common;
pub mod query;
pub mod storage;

// Re-export key items for convenient access
pub use catalog::{Catalog, FieldValue, Record, RecordSchema, SchemaCatalog, Type};
pub use common::types::{PageId, RecordId, StorageConfig, TableId, TransactionId};
pub use query::executor::operators::{AggregateOp, AggregateOperator, AggregationEngine, GroupBy, Operator, PageScanOperator};
pub use query::executor::result::{QueryError, QueryResult};
pub use storage::disk::{HeapFile, HeapFileError};
pub use storage::page::{ParseError, SlottedPage, StorageError};
