// Hash-based Aggregation Engine
//
// Buckets records by group key in a hash table and keeps one running
// accumulator per group.

use std::cmp::Ordering;
use std::sync::Arc;

use linked_hash_map::LinkedHashMap;
use log::debug;

use super::{AggregateOp, GroupBy};
use crate::catalog::{FieldDef, FieldValue, Record, RecordSchema, Type};
use crate::query::executor::result::{QueryError, QueryResult};

/// Key for the grouping hash table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// The single group used when no grouping field is set
    NoGrouping,
    Value(FieldValue),
}

/// Exact running sum for AVG; divided only when the result is read
#[derive(Debug, Clone, Copy)]
enum RunningSum {
    Int(i64),
    Double(f64),
}

/// Per-group running state
#[derive(Debug, Clone)]
enum Accumulator {
    Count(i32),
    Sum(FieldValue),
    Avg { sum: RunningSum, count: i64 },
    Min(FieldValue),
    Max(FieldValue),
}

impl Accumulator {
    /// State after seeing the first value of a group
    fn init(op: AggregateOp, value: &FieldValue) -> QueryResult<Self> {
        Ok(match op {
            AggregateOp::Count => Accumulator::Count(1),
            AggregateOp::Sum => Accumulator::Sum(value.clone()),
            AggregateOp::Avg => Accumulator::Avg {
                sum: match value {
                    FieldValue::Int(v) => RunningSum::Int(*v as i64),
                    FieldValue::Double(v) => RunningSum::Double(*v),
                    FieldValue::Str(_) => return Err(non_numeric(value)),
                },
                count: 1,
            },
            AggregateOp::Min => Accumulator::Min(value.clone()),
            AggregateOp::Max => Accumulator::Max(value.clone()),
        })
    }

    /// Fold one more value in; on error the state is left untouched
    fn update(&mut self, value: &FieldValue) -> QueryResult<()> {
        match self {
            Accumulator::Count(count) => {
                *count = count.checked_add(1).ok_or(QueryError::NumericOverflow)?;
            }
            Accumulator::Sum(sum) => {
                *sum = add_values(sum, value)?;
            }
            Accumulator::Avg { sum, count } => {
                let next = match (*sum, value) {
                    (RunningSum::Int(s), FieldValue::Int(v)) => {
                        RunningSum::Int(s.checked_add(*v as i64).ok_or(QueryError::NumericOverflow)?)
                    }
                    (RunningSum::Double(s), FieldValue::Double(v)) => RunningSum::Double(s + v),
                    _ => return Err(non_numeric(value)),
                };
                *sum = next;
                *count += 1;
            }
            Accumulator::Min(current) => {
                if compare(value, current)? == Ordering::Less {
                    *current = value.clone();
                }
            }
            Accumulator::Max(current) => {
                if compare(value, current)? == Ordering::Greater {
                    *current = value.clone();
                }
            }
        }
        Ok(())
    }

    /// Get the final aggregate value
    fn result(&self) -> FieldValue {
        match self {
            Accumulator::Count(count) => FieldValue::Int(*count),
            Accumulator::Sum(sum) => sum.clone(),
            Accumulator::Avg { sum, count } => {
                let total = match sum {
                    RunningSum::Int(s) => *s as f64,
                    RunningSum::Double(s) => *s,
                };
                FieldValue::Double(total / *count as f64)
            }
            Accumulator::Min(value) | Accumulator::Max(value) => value.clone(),
        }
    }
}

fn add_values(a: &FieldValue, b: &FieldValue) -> QueryResult<FieldValue> {
    match (a, b) {
        (FieldValue::Int(x), FieldValue::Int(y)) => x
            .checked_add(*y)
            .map(FieldValue::Int)
            .ok_or(QueryError::NumericOverflow),
        (FieldValue::Double(x), FieldValue::Double(y)) => Ok(FieldValue::Double(x + y)),
        _ => Err(non_numeric(b)),
    }
}

fn compare(a: &FieldValue, b: &FieldValue) -> QueryResult<Ordering> {
    a.partial_cmp(b).ok_or_else(|| {
        QueryError::TypeError(format!(
            "Cannot compare {} with {}",
            a.field_type(),
            b.field_type()
        ))
    })
}

fn non_numeric(value: &FieldValue) -> QueryError {
    QueryError::TypeError(format!("Expected a numeric value, got {}", value.field_type()))
}

/// Computes one aggregate over one field, optionally grouped by another field
///
/// Groups are kept in first-seen order, so `results` is stable for a given
/// sequence of merges.
#[derive(Debug)]
pub struct AggregationEngine {
    group_by: GroupBy,
    group_type: Option<Type>,
    aggregate_field: usize,
    aggregate_type: Type,
    op: AggregateOp,
    output_schema: Arc<RecordSchema>,
    groups: LinkedHashMap<GroupKey, Accumulator>,
}

impl AggregationEngine {
    /// Create an engine for records of `input_schema`
    ///
    /// Fails if a field index is out of range or `op` does not apply to the
    /// aggregated field's type.
    pub fn new(
        input_schema: &RecordSchema,
        group_by: GroupBy,
        aggregate_field: usize,
        op: AggregateOp,
    ) -> QueryResult<Self> {
        let aggregate_type = input_schema.field_type(aggregate_field)?;
        op.check_applicable(aggregate_type)?;

        let aggregate_column = FieldDef::new(
            format!("{} {}", op, input_schema.field_name(aggregate_field)?),
            op.output_type(aggregate_type),
        );

        let (group_type, fields) = match group_by {
            GroupBy::NoGrouping => (None, vec![aggregate_column]),
            GroupBy::Field(index) => {
                let group_column = input_schema.field(index)?.clone();
                (Some(group_column.field_type), vec![group_column, aggregate_column])
            }
        };
        let output_schema = Arc::new(RecordSchema::new(fields)?);

        debug!("Created {} aggregation engine with output [{}]", op, output_schema);
        Ok(Self {
            group_by,
            group_type,
            aggregate_field,
            aggregate_type,
            op,
            output_schema,
            groups: LinkedHashMap::new(),
        })
    }

    /// Fold one record into its group's accumulator
    pub fn merge_record(&mut self, record: &Record) -> QueryResult<()> {
        let key = match (self.group_by, self.group_type) {
            (GroupBy::Field(index), Some(group_type)) => {
                let value = record.field(index)?;
                expect_type(value, group_type)?;
                GroupKey::Value(value.clone())
            }
            _ => GroupKey::NoGrouping,
        };

        let value = record.field(self.aggregate_field)?;
        expect_type(value, self.aggregate_type)?;

        match self.groups.get_mut(&key) {
            Some(accumulator) => accumulator.update(value)?,
            None => {
                let accumulator = Accumulator::init(self.op, value)?;
                self.groups.insert(key, accumulator);
            }
        }
        Ok(())
    }

    /// One output record per group: `[group, aggregate]` or `[aggregate]`
    ///
    /// Each call walks the groups afresh and yields the same sequence.
    pub fn results(&self) -> impl Iterator<Item = Record> + '_ {
        self.groups.iter().map(move |(key, accumulator)| {
            let fields = match key {
                GroupKey::NoGrouping => vec![accumulator.result()],
                GroupKey::Value(group) => vec![group.clone(), accumulator.result()],
            };
            Record::from_values(self.output_schema.clone(), fields)
        })
    }

    pub fn output_schema(&self) -> &Arc<RecordSchema> {
        &self.output_schema
    }

    pub fn group_by(&self) -> GroupBy {
        self.group_by
    }

    pub fn aggregate_field(&self) -> usize {
        self.aggregate_field
    }

    pub fn op(&self) -> AggregateOp {
        self.op
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

fn expect_type(value: &FieldValue, expected: Type) -> QueryResult<()> {
    if value.field_type() != expected {
        return Err(QueryError::TypeError(format!(
            "Expected {} value, got {}",
            expected,
            value.field_type()
        )));
    }
    Ok(())
}
