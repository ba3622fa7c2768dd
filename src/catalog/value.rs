// Field Value Module
//
// Typed field values and their fixed-width binary codec.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use super::error::CodecError;
use super::schema::{STRING_LEN, Type};

/// A single field value of a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i32),
    Str(String),
    Double(f64),
}

impl FieldValue {
    pub fn field_type(&self) -> Type {
        match self {
            FieldValue::Int(_) => Type::Int,
            FieldValue::Str(_) => Type::String,
            FieldValue::Double(_) => Type::Double,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Str(_) => None,
        }
    }

    /// The value as it will be stored: strings longer than `STRING_LEN`
    /// bytes are cut at the last char boundary that fits
    pub fn fit(self) -> Self {
        match self {
            FieldValue::Str(s) if s.len() > STRING_LEN => FieldValue::Str(fit_str(&s).to_string()),
            other => other,
        }
    }

    /// Append the fixed-width encoding of this value to `buf`
    ///
    /// Over-long strings are cut as by `fit`; the unused tail of the string
    /// area is zeroed.
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        let start = buf.len();
        buf.resize(start + self.field_type().byte_len(), 0);
        let out = &mut buf[start..];

        match self {
            FieldValue::Int(v) => LittleEndian::write_i32(&mut out[0..4], *v),
            FieldValue::Double(v) => LittleEndian::write_f64(&mut out[0..8], *v),
            FieldValue::Str(s) => {
                let stored = fit_str(s);
                LittleEndian::write_u32(&mut out[0..4], stored.len() as u32);
                out[4..4 + stored.len()].copy_from_slice(stored.as_bytes());
            }
        }
    }

    /// Decode a value of `field_type` from the front of `bytes`
    pub fn decode(field_type: Type, bytes: &[u8]) -> Result<FieldValue, CodecError> {
        let needed = field_type.byte_len();
        if bytes.len() < needed {
            return Err(CodecError::ShortBuffer {
                type_name: match field_type {
                    Type::Int => "INT",
                    Type::String => "STRING",
                    Type::Double => "DOUBLE",
                },
                needed,
                available: bytes.len(),
            });
        }

        match field_type {
            Type::Int => Ok(FieldValue::Int(LittleEndian::read_i32(&bytes[0..4]))),
            Type::Double => Ok(FieldValue::Double(LittleEndian::read_f64(&bytes[0..8]))),
            Type::String => {
                let len = LittleEndian::read_u32(&bytes[0..4]) as usize;
                if len > STRING_LEN {
                    return Err(CodecError::StringTooLong(len));
                }
                let s = std::str::from_utf8(&bytes[4..4 + len]).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(FieldValue::Str(s.to_string()))
            }
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Str(a), FieldValue::Str(b)) => a == b,
            // Bit equality keeps Eq consistent with Hash
            (FieldValue::Double(a), FieldValue::Double(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

fn fit_str(s: &str) -> &str {
    let mut end = s.len().min(STRING_LEN);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            FieldValue::Int(i) => {
                1.hash(state);
                i.hash(state);
            }
            FieldValue::Str(s) => {
                2.hash(state);
                s.hash(state);
            }
            FieldValue::Double(f) => {
                3.hash(state);
                f.to_bits().hash(state);
            }
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Str(a), FieldValue::Str(b)) => Some(a.cmp(b)),
            (FieldValue::Double(a), FieldValue::Double(b)) => Some(a.total_cmp(b)),
            (FieldValue::Int(a), FieldValue::Double(b)) => Some((*a as f64).total_cmp(b)),
            (FieldValue::Double(a), FieldValue::Int(b)) => Some(a.total_cmp(&(*b as f64))),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Double(d) => write!(f, "{}", d),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(fit_str(v).to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v).fit()
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}
