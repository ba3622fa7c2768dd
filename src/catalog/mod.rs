//! Catalog Module
//!
//! Field types, record schemas, records, and the table-to-schema lookup the
//! storage layer resolves page layouts through.

pub mod catalog;
pub mod error;
pub mod record;
pub mod schema;
pub mod value;

// Re-export key types
pub use self::catalog::{Catalog, SchemaCatalog};
pub use self::error::{CatalogError, CatalogResult, CodecError};
pub use self::record::Record;
pub use self::schema::{FieldDef, RecordSchema, STRING_LEN, Type};
pub use self::value::FieldValue;
