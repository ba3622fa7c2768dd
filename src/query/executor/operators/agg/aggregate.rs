// Aggregate Operator
//
// Blocking operator: `open` drains the child into an AggregationEngine,
// then the grouped results are served through the operator protocol.

use std::sync::Arc;

use log::{info, warn};

use super::hash::AggregationEngine;
use super::{AggregateOp, GroupBy};
use crate::catalog::{Record, RecordSchema};
use crate::query::executor::operators::Operator;
use crate::query::executor::result::{QueryError, QueryResult};

/// Computes one aggregate over its child's output, optionally grouped
///
/// `rewind` replays the results computed at `open`; it does not read the
/// child again, so changes to the child's source after `open` are not seen
/// until the operator is closed and reopened.
pub struct AggregateOperator {
    child: Box<dyn Operator>,
    group_by: GroupBy,
    aggregate_field: usize,
    op: AggregateOp,
    output_schema: Arc<RecordSchema>,
    /// Materialized output, computed on open
    results: Vec<Record>,
    /// Position in `results`; `None` while closed
    cursor: Option<usize>,
}

impl AggregateOperator {
    /// Create a new aggregate operator
    ///
    /// # Arguments
    /// * `child` - Operator that provides records to aggregate
    /// * `aggregate_field` - Index of the aggregated field in the child's records
    /// * `group_by` - Grouping field, or `GroupBy::NoGrouping`
    /// * `op` - Aggregate to compute
    ///
    /// Invalid field indexes and operations that do not apply to the
    /// aggregated field's type are rejected here.
    pub fn new(
        child: Box<dyn Operator>,
        aggregate_field: usize,
        group_by: GroupBy,
        op: AggregateOp,
    ) -> QueryResult<Self> {
        let engine = AggregationEngine::new(&child.schema(), group_by, aggregate_field, op)?;
        let output_schema = engine.output_schema().clone();

        Ok(Self {
            child,
            group_by,
            aggregate_field,
            op,
            output_schema,
            results: Vec::new(),
            cursor: None,
        })
    }

    /// Grouping field index in the input records
    pub fn group_field(&self) -> GroupBy {
        self.group_by
    }

    /// Name of the grouping column in the output records
    pub fn group_field_name(&self) -> Option<&str> {
        match self.group_by {
            GroupBy::NoGrouping => None,
            GroupBy::Field(_) => self.output_schema.field_name(0).ok(),
        }
    }

    /// Aggregated field index in the input records
    pub fn aggregate_field(&self) -> usize {
        self.aggregate_field
    }

    /// Name of the aggregate column in the output records, e.g. `sum price`
    pub fn aggregate_field_name(&self) -> &str {
        let index = self.output_schema.num_fields() - 1;
        self.output_schema.field_name(index).unwrap_or_default()
    }

    pub fn aggregate_op(&self) -> AggregateOp {
        self.op
    }

    /// The operator feeding this aggregate
    pub fn child(&self) -> &dyn Operator {
        self.child.as_ref()
    }

    /// Replace the input operator, returning the previous one
    ///
    /// Only allowed while closed. The new child's schema must support the
    /// same grouping and aggregate fields; the output schema is rebuilt
    /// from it.
    pub fn set_child(&mut self, child: Box<dyn Operator>) -> QueryResult<Box<dyn Operator>> {
        if self.cursor.is_some() {
            return Err(QueryError::AlreadyOpen);
        }
        let engine = AggregationEngine::new(&child.schema(), self.group_by, self.aggregate_field, self.op)?;
        self.output_schema = engine.output_schema().clone();
        Ok(std::mem::replace(&mut self.child, child))
    }

    /// Next result record, or `None` once the results are exhausted
    pub fn produce_next(&mut self) -> QueryResult<Option<Record>> {
        let position = self.cursor.ok_or(QueryError::NotOpen)?;
        let record = self.results.get(position).cloned();
        if record.is_some() {
            self.cursor = Some(position + 1);
        }
        Ok(record)
    }

    fn aggregate_child(&mut self) -> QueryResult<AggregationEngine> {
        let mut engine = AggregationEngine::new(&self.child.schema(), self.group_by, self.aggregate_field, self.op)?;
        let mut merged = 0usize;
        while self.child.has_next()? {
            let record = self.child.next()?;
            engine.merge_record(&record)?;
            merged += 1;
        }
        info!("Aggregated {} records into {} groups", merged, engine.group_count());
        Ok(engine)
    }
}

impl Operator for AggregateOperator {
    fn open(&mut self) -> QueryResult<()> {
        if self.cursor.is_some() {
            return Err(QueryError::AlreadyOpen);
        }

        self.child.open()?;
        let engine = match self.aggregate_child() {
            Ok(engine) => engine,
            Err(err) => {
                if let Err(close_err) = self.child.close() {
                    warn!("Failed to close child after aggregation error: {}", close_err);
                }
                return Err(err);
            }
        };

        self.results = engine.results().collect();
        self.cursor = Some(0);
        Ok(())
    }

    fn has_next(&mut self) -> QueryResult<bool> {
        let position = self.cursor.ok_or(QueryError::NotOpen)?;
        Ok(position < self.results.len())
    }

    fn next(&mut self) -> QueryResult<Record> {
        self.produce_next()?.ok_or(QueryError::NoMoreElements)
    }

    fn rewind(&mut self) -> QueryResult<()> {
        if self.cursor.is_none() {
            return Err(QueryError::NotOpen);
        }
        self.cursor = Some(0);
        Ok(())
    }

    fn close(&mut self) -> QueryResult<()> {
        self.cursor = None;
        self.results.clear();
        self.child.close()
    }

    fn schema(&self) -> Arc<RecordSchema> {
        self.output_schema.clone()
    }
}
