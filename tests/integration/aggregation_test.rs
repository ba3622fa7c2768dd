use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use parking_lot::Mutex;
use tempfile::tempdir;

#[path = "../common/mod.rs"]
mod common;

use heapdb::catalog::{FieldValue, Record, RecordSchema, Type};
use heapdb::common::types::{StorageConfig, TableId};
use heapdb::query::executor::operators::{AggregateOp, AggregateOperator, GroupBy, Operator, PageScanOperator};
use heapdb::query::executor::result::{QueryError, QueryResult};
use heapdb::storage::disk::HeapFile;

/// Upstream operator over a shared, mutable list of records
struct SharedSource {
    schema: Arc<RecordSchema>,
    rows: Arc<Mutex<Vec<Record>>>,
    opens: Arc<AtomicUsize>,
    position: Option<usize>,
}

impl SharedSource {
    fn new(schema: Arc<RecordSchema>, rows: Vec<Record>) -> (Self, Arc<Mutex<Vec<Record>>>, Arc<AtomicUsize>) {
        let rows = Arc::new(Mutex::new(rows));
        let opens = Arc::new(AtomicUsize::new(0));
        let source = Self {
            schema,
            rows: rows.clone(),
            opens: opens.clone(),
            position: None,
        };
        (source, rows, opens)
    }
}

impl Operator for SharedSource {
    fn open(&mut self) -> QueryResult<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.position = Some(0);
        Ok(())
    }

    fn has_next(&mut self) -> QueryResult<bool> {
        let position = self.position.ok_or(QueryError::NotOpen)?;
        Ok(position < self.rows.lock().len())
    }

    fn next(&mut self) -> QueryResult<Record> {
        let position = self.position.ok_or(QueryError::NotOpen)?;
        let record = self.rows.lock().get(position).cloned().ok_or(QueryError::NoMoreElements)?;
        self.position = Some(position + 1);
        Ok(record)
    }

    fn rewind(&mut self) -> QueryResult<()> {
        self.position.ok_or(QueryError::NotOpen)?;
        self.position = Some(0);
        Ok(())
    }

    fn close(&mut self) -> QueryResult<()> {
        self.position = None;
        Ok(())
    }

    fn schema(&self) -> Arc<RecordSchema> {
        self.schema.clone()
    }
}

fn group_schema() -> Arc<RecordSchema> {
    Arc::new(RecordSchema::from_pairs([("g", Type::String), ("f1", Type::Int)]).unwrap())
}

fn row(schema: &Arc<RecordSchema>, group: &str, value: i32) -> Record {
    Record::new(schema.clone(), vec![group.into(), value.into()]).unwrap()
}

fn drain(op: &mut dyn Operator) -> QueryResult<Vec<Record>> {
    let mut out = Vec::new();
    while op.has_next()? {
        out.push(op.next()?);
    }
    Ok(out)
}

fn grouped_values(records: &[Record]) -> HashMap<FieldValue, FieldValue> {
    records
        .iter()
        .map(|r| (r.fields()[0].clone(), r.fields()[1].clone()))
        .collect()
}

#[test]
fn test_grouped_sum() -> Result<()> {
    let schema = group_schema();
    let rows = vec![row(&schema, "a", 1), row(&schema, "b", 5), row(&schema, "a", 2), row(&schema, "b", 1)];
    let (source, _, _) = SharedSource::new(schema, rows);

    let mut agg = AggregateOperator::new(Box::new(source), 1, GroupBy::Field(0), AggregateOp::Sum)?;
    agg.open()?;
    let results = drain(&mut agg)?;
    agg.close()?;

    assert_eq!(results.len(), 2);
    let values = grouped_values(&results);
    assert_eq!(values[&FieldValue::from("a")], FieldValue::Int(3));
    assert_eq!(values[&FieldValue::from("b")], FieldValue::Int(6));
    Ok(())
}

#[test]
fn test_grouped_average_is_not_incremental() -> Result<()> {
    let schema = group_schema();
    // Averaging running averages would give 2.5 for "a"
    let rows = vec![row(&schema, "a", 1), row(&schema, "a", 2), row(&schema, "a", 6), row(&schema, "b", 3)];
    let (source, _, _) = SharedSource::new(schema, rows);

    let mut agg = AggregateOperator::new(Box::new(source), 1, GroupBy::Field(0), AggregateOp::Avg)?;
    agg.open()?;
    let values = grouped_values(&drain(&mut agg)?);

    assert_eq!(values[&FieldValue::from("a")], FieldValue::Double(3.0));
    assert_eq!(values[&FieldValue::from("b")], FieldValue::Double(3.0));
    Ok(())
}

#[test]
fn test_ungrouped_aggregates() -> Result<()> {
    let schema = group_schema();
    let rows = vec![row(&schema, "a", 3), row(&schema, "b", 5), row(&schema, "c", 2)];

    let expected = [
        (AggregateOp::Sum, FieldValue::Int(10)),
        (AggregateOp::Count, FieldValue::Int(3)),
        (AggregateOp::Min, FieldValue::Int(2)),
        (AggregateOp::Max, FieldValue::Int(5)),
    ];
    for (op, value) in expected {
        let (source, _, _) = SharedSource::new(schema.clone(), rows.clone());
        let mut agg = AggregateOperator::new(Box::new(source), 1, GroupBy::NoGrouping, op)?;
        agg.open()?;
        let results = drain(&mut agg)?;
        assert_eq!(results.len(), 1, "{}", op);
        assert_eq!(results[0].fields(), &[value], "{}", op);
    }
    Ok(())
}

#[test]
fn test_rewind_replays_without_rereading_upstream() -> Result<()> {
    let schema = group_schema();
    let (source, rows, opens) = SharedSource::new(schema.clone(), vec![row(&schema, "a", 3), row(&schema, "a", 4)]);

    let mut agg = AggregateOperator::new(Box::new(source), 1, GroupBy::NoGrouping, AggregateOp::Sum)?;
    agg.open()?;
    let first = drain(&mut agg)?;
    assert_eq!(opens.load(Ordering::SeqCst), 1);

    rows.lock().push(row(&schema, "a", 100));
    agg.rewind()?;
    let second = drain(&mut agg)?;

    assert_eq!(first, second);
    assert_eq!(second[0].fields(), &[FieldValue::Int(7)]);
    assert_eq!(opens.load(Ordering::SeqCst), 1);

    // A fresh open sees the new upstream state
    agg.close()?;
    agg.open()?;
    let third = drain(&mut agg)?;
    assert_eq!(third[0].fields(), &[FieldValue::Int(107)]);
    assert_eq!(opens.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_protocol_errors() -> Result<()> {
    let schema = group_schema();
    let (source, _, _) = SharedSource::new(schema.clone(), vec![row(&schema, "a", 1)]);
    let mut agg = AggregateOperator::new(Box::new(source), 1, GroupBy::NoGrouping, AggregateOp::Count)?;

    assert!(matches!(agg.has_next(), Err(QueryError::NotOpen)));
    assert!(matches!(agg.next(), Err(QueryError::NotOpen)));
    assert!(matches!(agg.rewind(), Err(QueryError::NotOpen)));

    agg.open()?;
    assert!(matches!(agg.open(), Err(QueryError::AlreadyOpen)));

    agg.next()?;
    assert!(!agg.has_next()?);
    assert!(matches!(agg.next(), Err(QueryError::NoMoreElements)));

    agg.close()?;
    assert!(matches!(agg.next(), Err(QueryError::NotOpen)));
    Ok(())
}

#[test]
fn test_output_schema_and_accessors() -> Result<()> {
    let schema = group_schema();
    let (source, _, _) = SharedSource::new(schema.clone(), Vec::new());
    let agg = AggregateOperator::new(Box::new(source), 1, GroupBy::Field(0), AggregateOp::Sum)?;

    let output = agg.schema();
    assert_eq!(output.num_fields(), 2);
    assert_eq!(output.field_name(0)?, "g");
    assert_eq!(output.field_name(1)?, "sum f1");
    assert_eq!(output.field_type(1)?, Type::Int);
    assert_eq!(agg.group_field(), GroupBy::Field(0));
    assert_eq!(agg.group_field_name(), Some("g"));
    assert_eq!(agg.aggregate_field(), 1);
    assert_eq!(agg.aggregate_field_name(), "sum f1");
    assert_eq!(agg.aggregate_op(), AggregateOp::Sum);

    let (source, _, _) = SharedSource::new(schema, Vec::new());
    let agg = AggregateOperator::new(Box::new(source), 1, GroupBy::NoGrouping, AggregateOp::Avg)?;
    assert_eq!(agg.schema().num_fields(), 1);
    assert_eq!(agg.schema().field_type(0)?, Type::Double);
    assert_eq!(agg.group_field_name(), None);
    Ok(())
}

#[test]
fn test_string_field_only_supports_count() -> Result<()> {
    let schema = group_schema();
    let rows = vec![row(&schema, "a", 1), row(&schema, "b", 2)];

    let (source, _, _) = SharedSource::new(schema.clone(), rows.clone());
    let mut agg = AggregateOperator::new(Box::new(source), 0, GroupBy::NoGrouping, AggregateOp::Count)?;
    agg.open()?;
    assert_eq!(drain(&mut agg)?[0].fields(), &[FieldValue::Int(2)]);

    for op in [AggregateOp::Sum, AggregateOp::Avg, AggregateOp::Min, AggregateOp::Max] {
        let (source, _, _) = SharedSource::new(schema.clone(), rows.clone());
        let result = AggregateOperator::new(Box::new(source), 0, GroupBy::NoGrouping, op);
        assert!(matches!(result, Err(QueryError::InvalidAggregate(_))), "{}", op);
    }
    Ok(())
}

#[test]
fn test_replace_child() -> Result<()> {
    let schema = group_schema();
    let (first, _, _) = SharedSource::new(schema.clone(), vec![row(&schema, "a", 1)]);
    let mut agg = AggregateOperator::new(Box::new(first), 1, GroupBy::NoGrouping, AggregateOp::Sum)?;
    assert_eq!(agg.child().schema().field_name(1)?, "f1");

    let renamed = Arc::new(RecordSchema::from_pairs([("g", Type::String), ("total", Type::Int)])?);
    let rows = vec![row(&renamed, "a", 10), row(&renamed, "b", 20)];
    let (second, _, second_opens) = SharedSource::new(renamed.clone(), rows);

    // Swapping while open is refused
    agg.open()?;
    let (spare, _, _) = SharedSource::new(renamed.clone(), Vec::new());
    assert!(matches!(agg.set_child(Box::new(spare)), Err(QueryError::AlreadyOpen)));
    agg.close()?;

    let previous = agg.set_child(Box::new(second))?;
    assert_eq!(previous.schema().field_name(1)?, "f1");
    assert_eq!(agg.aggregate_field_name(), "sum total");

    agg.open()?;
    assert_eq!(drain(&mut agg)?[0].fields(), &[FieldValue::Int(30)]);
    assert_eq!(second_opens.load(Ordering::SeqCst), 1);

    // A child whose aggregate field is a string cannot be summed
    agg.close()?;
    let strings = Arc::new(RecordSchema::from_pairs([("g", Type::String), ("s", Type::String)])?);
    let (bad, _, _) = SharedSource::new(strings, Vec::new());
    assert!(matches!(agg.set_child(Box::new(bad)), Err(QueryError::InvalidAggregate(_))));
    assert_eq!(agg.aggregate_field_name(), "sum total");
    Ok(())
}

#[test]
fn test_empty_input_without_grouping() -> Result<()> {
    let schema = group_schema();
    let (source, _, _) = SharedSource::new(schema, Vec::new());
    let mut agg = AggregateOperator::new(Box::new(source), 1, GroupBy::NoGrouping, AggregateOp::Sum)?;
    agg.open()?;
    assert!(drain(&mut agg)?.is_empty());
    Ok(())
}

#[test]
fn test_aggregate_over_heap_file_scan() -> Result<()> {
    let dir = tempdir()?;
    let schema = common::int_schema(2);
    let heap_file = HeapFile::open(dir.path().join("t.dat"), TableId(1), schema.clone(), StorageConfig::with_page_size(64))?;
    for (group, value) in [(1, 10), (2, 20), (1, 30), (3, 5), (2, 1), (1, 2), (3, 3), (1, 1)] {
        let mut record = Record::new(schema.clone(), vec![group.into(), value.into()])?;
        heap_file.insert_record(&mut record)?;
    }
    assert_eq!(heap_file.num_pages()?, 2);

    let scan = PageScanOperator::new(schema.clone(), heap_file.read_all_pages()?);
    let mut agg = AggregateOperator::new(Box::new(scan), 1, GroupBy::Field(0), AggregateOp::Max)?;
    agg.open()?;
    let values = grouped_values(&drain(&mut agg)?);
    agg.close()?;

    assert_eq!(values.len(), 3);
    assert_eq!(values[&FieldValue::Int(1)], FieldValue::Int(30));
    assert_eq!(values[&FieldValue::Int(2)], FieldValue::Int(20));
    assert_eq!(values[&FieldValue::Int(3)], FieldValue::Int(5));
    Ok(())
}
