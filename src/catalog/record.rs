// Record Module
//
// A record is a row of field values conforming to a RecordSchema, plus the
// location it occupies once stored on a page.

use std::fmt;
use std::sync::Arc;

use super::error::{CatalogError, CatalogResult};
use super::schema::RecordSchema;
use super::value::FieldValue;
use crate::common::types::RecordId;

/// A typed row of field values
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<RecordSchema>,
    fields: Vec<FieldValue>,
    record_id: Option<RecordId>,
}

impl Record {
    /// Create a record, checking the values against the schema
    ///
    /// Over-long strings are cut to what a page can store (see
    /// `FieldValue::fit`), so a stored record reads back equal.
    pub fn new(schema: Arc<RecordSchema>, fields: Vec<FieldValue>) -> CatalogResult<Self> {
        if fields.len() != schema.num_fields() {
            return Err(CatalogError::FieldCountMismatch {
                expected: schema.num_fields(),
                actual: fields.len(),
            });
        }
        for (index, value) in fields.iter().enumerate() {
            check_type(&schema, index, value)?;
        }
        let fields = fields.into_iter().map(FieldValue::fit).collect();
        Ok(Self {
            schema,
            fields,
            record_id: None,
        })
    }

    /// Build a record from values the caller already decoded with `schema`
    pub(crate) fn from_decoded(schema: Arc<RecordSchema>, fields: Vec<FieldValue>, record_id: RecordId) -> Self {
        Self {
            schema,
            fields,
            record_id: Some(record_id),
        }
    }

    /// Build a record from values already known to match `schema`
    pub(crate) fn from_values(schema: Arc<RecordSchema>, fields: Vec<FieldValue>) -> Self {
        debug_assert_eq!(fields.len(), schema.num_fields());
        Self {
            schema,
            fields,
            record_id: None,
        }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> CatalogResult<&FieldValue> {
        self.fields.get(index).ok_or(CatalogError::FieldIndexOutOfRange {
            index,
            num_fields: self.fields.len(),
        })
    }

    /// Replace a field value; the value must match the field's type
    pub fn set_field(&mut self, index: usize, value: FieldValue) -> CatalogResult<()> {
        check_type(&self.schema, index, &value)?;
        self.fields[index] = value.fit();
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: RecordId) {
        self.record_id = Some(record_id);
    }

    pub fn clear_record_id(&mut self) {
        self.record_id = None;
    }

    /// Append the fixed-width encoding of every field to `buf`
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        for value in &self.fields {
            value.serialize(buf);
        }
    }
}

fn check_type(schema: &RecordSchema, index: usize, value: &FieldValue) -> CatalogResult<()> {
    let expected = schema.field_type(index)?;
    if value.field_type() != expected {
        return Err(CatalogError::FieldTypeMismatch {
            index,
            expected: expected.to_string(),
            actual: value.field_type().to_string(),
        });
    }
    Ok(())
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join("\t"))
    }
}
