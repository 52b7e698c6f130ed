use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::storage::HeapFile;
use crate::tuple::TupleDesc;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Table {0} not found")]
    TableNotFound(i32),

    #[error("Table {0} not found")]
    TableNameNotFound(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
    primary_key: String,
}

/// Registry of the tables known to the database: table id to backing file,
/// table name, and primary-key field name.
///
/// Populated by an external front-end; the core only reads it.
pub struct Catalog {
    tables: HashMap<i32, TableEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Register a table. A duplicate table id or name replaces the
    /// previous entry.
    pub fn add_table(
        &mut self,
        file: Arc<HeapFile>,
        name: impl Into<String>,
        primary_key: impl Into<String>,
    ) {
        let name = name.into();
        self.tables.retain(|_, entry| entry.name != name);
        self.tables.insert(
            file.id(),
            TableEntry {
                file,
                name,
                primary_key: primary_key.into(),
            },
        );
    }

    /// Get the backing file of a table
    pub fn file(&self, table_id: i32) -> CatalogResult<Arc<HeapFile>> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.file.clone())
            .ok_or(CatalogError::TableNotFound(table_id))
    }

    /// Get the descriptor of the table's tuples
    pub fn tuple_desc(&self, table_id: i32) -> CatalogResult<Arc<TupleDesc>> {
        Ok(self.file(table_id)?.tuple_desc().clone())
    }

    /// Get a table's name
    pub fn table_name(&self, table_id: i32) -> CatalogResult<&str> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.name.as_str())
            .ok_or(CatalogError::TableNotFound(table_id))
    }

    /// Get the name of a table's primary-key field
    pub fn primary_key(&self, table_id: i32) -> CatalogResult<&str> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.primary_key.as_str())
            .ok_or(CatalogError::TableNotFound(table_id))
    }

    /// Find a table id by table name
    pub fn table_id(&self, name: &str) -> CatalogResult<i32> {
        self.tables
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(&id, _)| id)
            .ok_or_else(|| CatalogError::TableNameNotFound(name.to_string()))
    }

    /// Iterate over all registered table ids
    pub fn table_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.tables.keys().copied()
    }

    /// Remove every registered table
    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
