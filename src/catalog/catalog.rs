use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;
use parking_lot::RwLock;

use super::error::{CatalogError, CatalogResult};
use super::schema::RecordSchema;
use crate::common::types::TableId;

/// Schema resolution keyed by table identity
///
/// Pages and heap files only need this lookup, so callers can plug in any
/// catalog implementation.
pub trait SchemaCatalog: Send + Sync {
    fn schema(&self, table_id: TableId) -> Option<Arc<RecordSchema>>;
}

struct TableEntry {
    name: String,
    schema: Arc<RecordSchema>,
}

/// In-memory catalog of tables and their record schemas
pub struct Catalog {
    tables: RwLock<HashMap<TableId, TableEntry>>,
    table_id_counter: AtomicU32,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            tables: RwLock::new(HashMap::new()),
            table_id_counter: AtomicU32::new(1),
        }
    }

    /// Register a table and return its freshly assigned id
    pub fn add_table(&self, name: &str, schema: RecordSchema) -> CatalogResult<TableId> {
        let mut tables = self.tables.write();
        if tables.values().any(|entry| entry.name == name) {
            return Err(CatalogError::TableAlreadyExists(name.to_string()));
        }
        let table_id = TableId(self.table_id_counter.fetch_add(1, Ordering::SeqCst));
        debug!("Registered table '{}' as {} with schema [{}]", name, table_id, schema);
        tables.insert(
            table_id,
            TableEntry {
                name: name.to_string(),
                schema: Arc::new(schema),
            },
        );
        Ok(table_id)
    }

    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables
            .read()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id)
    }

    pub fn table_name(&self, table_id: TableId) -> CatalogResult<String> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or(CatalogError::TableNotFound(table_id))
    }

    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }
}

impl SchemaCatalog for Catalog {
    fn schema(&self, table_id: TableId) -> Option<Arc<RecordSchema>> {
        self.tables.read().get(&table_id).map(|entry| entry.schema.clone())
    }
}
