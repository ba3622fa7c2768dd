// Query Operators Module
//
// This module defines the operators used for query execution in the
// iterator-based execution model.

pub mod agg;
pub mod scan;

pub use agg::{AggregateOp, AggregateOperator, AggregationEngine, GroupBy};
pub use scan::PageScanOperator;

use std::sync::Arc;

use crate::catalog::{Record, RecordSchema};
use crate::query::executor::result::QueryResult;

/// The Operator trait defines the interface for all query execution operators
/// in the iterator-based execution model. Each operator produces records and
/// passes them to the next operator in the execution plan.
pub trait Operator: Send {
    /// Prepare the operator to produce records
    fn open(&mut self) -> QueryResult<()>;

    /// Whether another record is available
    fn has_next(&mut self) -> QueryResult<bool>;

    /// Get the next record; fails with `NoMoreElements` past the end
    fn next(&mut self) -> QueryResult<Record>;

    /// Restart output from the first record
    fn rewind(&mut self) -> QueryResult<()>;

    /// Close the operator and release any resources
    fn close(&mut self) -> QueryResult<()>;

    /// Schema of the records this operator produces
    fn schema(&self) -> Arc<RecordSchema>;
}
