// Query Processing Module
//
// This module contains the iterator-based operators that consume records.

pub mod executor;

// Export key public interfaces
pub use executor::result::{QueryError, QueryResult};
