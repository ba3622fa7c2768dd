// Record Schema Module
//
// This module defines field types and the fixed-width record schema that
// pages use to compute their slot layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CatalogError, CatalogResult, CodecError};
use super::value::FieldValue;

/// Maximum number of string bytes stored in a STRING field
pub const STRING_LEN: usize = 128;

/// Field types supported by the storage layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    String,
    Double,
}

impl Type {
    /// Get the encoded width of this type in bytes
    pub fn byte_len(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::String => 4 + STRING_LEN, // length prefix + padded bytes
            Type::Double => 8,
        }
    }

    /// Whether SUM/AVG/MIN/MAX may be computed over this type
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Double)
    }

    /// Decode a value of this type from the front of `bytes`
    pub fn parse(&self, bytes: &[u8]) -> Result<FieldValue, CodecError> {
        FieldValue::decode(*self, bytes)
    }

    /// Parse a textual literal (as typed on the command line) into a value
    pub fn parse_literal(&self, literal: &str) -> CatalogResult<FieldValue> {
        let invalid = || CatalogError::InvalidLiteral {
            value: literal.to_string(),
            type_name: self.to_string(),
        };
        match self {
            Type::Int => literal.trim().parse().map(FieldValue::Int).map_err(|_| invalid()),
            Type::Double => literal.trim().parse().map(FieldValue::Double).map_err(|_| invalid()),
            Type::String => Ok(FieldValue::from(literal)),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::String => write!(f, "STRING"),
            Type::Double => write!(f, "DOUBLE"),
        }
    }
}

impl FromStr for Type {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INT" | "INTEGER" => Ok(Type::Int),
            "STRING" | "TEXT" | "VARCHAR" => Ok(Type::String),
            "DOUBLE" | "FLOAT" => Ok(Type::Double),
            other => Err(CatalogError::InvalidSchemaSpec(format!("unknown type '{}'", other))),
        }
    }
}

/// A named, typed field of a record schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: Type,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: Type) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered list of typed fields describing a fixed-width record
///
/// Equality compares field types only: two schemas with the same types in
/// the same order describe the same byte layout, whatever the field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSchema {
    fields: Vec<FieldDef>,
}

impl RecordSchema {
    /// Create a schema from field definitions; at least one field is required
    pub fn new(fields: Vec<FieldDef>) -> CatalogResult<Self> {
        if fields.is_empty() {
            return Err(CatalogError::EmptySchema);
        }
        Ok(Self { fields })
    }

    /// Convenience constructor from `(name, type)` pairs
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, Type)>) -> CatalogResult<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, ty)| FieldDef::new(name, ty))
                .collect(),
        )
    }

    /// Concatenate two schemas, `a` first
    pub fn merge(a: &RecordSchema, b: &RecordSchema) -> RecordSchema {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.iter().cloned());
        RecordSchema { fields }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> CatalogResult<&FieldDef> {
        self.fields.get(index).ok_or(CatalogError::FieldIndexOutOfRange {
            index,
            num_fields: self.fields.len(),
        })
    }

    pub fn field_type(&self, index: usize) -> CatalogResult<Type> {
        self.field(index).map(|f| f.field_type)
    }

    pub fn field_name(&self, index: usize) -> CatalogResult<&str> {
        self.field(index).map(|f| f.name.as_str())
    }

    /// Find the index of the first field with the given name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Total encoded width of a record in bytes
    pub fn byte_len(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.byte_len()).sum()
    }
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for RecordSchema {}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("{}({})", field.field_type, field.name))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Parses `"id:int,name:string"`
impl FromStr for RecordSchema {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, ty) = part
                .split_once(':')
                .ok_or_else(|| CatalogError::InvalidSchemaSpec(format!("expected name:type, got '{}'", part)))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(CatalogError::InvalidSchemaSpec(format!("missing field name in '{}'", part)));
            }
            fields.push(FieldDef::new(name, ty.parse()?));
        }
        RecordSchema::new(fields)
    }
}
