pub mod types;

pub use types::{PageId, RecordId, StorageConfig, TableId, TransactionId, DEFAULT_PAGE_SIZE};
