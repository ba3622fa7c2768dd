// Query Executor Module
//
// This module implements the iterator-based execution model: every operator
// is opened, pulled record by record, optionally rewound, and closed.

pub mod operators;
pub mod result;

// Export key types
pub use self::operators::Operator;
pub use self::result::{QueryError, QueryResult};
