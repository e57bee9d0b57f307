//! Local store contract consumed by the sync engine, plus an in-memory
//! implementation for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::catalog::TableDescriptor;
use crate::errors::{Result, StoreError};
use crate::value::Record;

/// One table's worth of rows, as read locally or fetched remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRows {
    pub table: String,
    pub rows: Vec<Record>,
}

impl TableRows {
    pub fn new(table: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            table: table.into(),
            rows,
        }
    }
}

/// Contract the sync engine requires from the local store.
///
/// `replace_all` is the pull coordinator's atomicity boundary: either the
/// whole snapshot becomes visible or the previous local state survives.
pub trait LocalStore: Send + Sync {
    /// Read every row of one synchronized table.
    fn read_table(&self, descriptor: &TableDescriptor) -> Result<Vec<Record>>;

    /// Atomically clear every synchronized table and insert the snapshot.
    /// Tables present in the catalog but absent from the snapshot end up
    /// empty; snapshot tables outside the catalog are an error.
    fn replace_all(&self, catalog: &[TableDescriptor], snapshot: Vec<TableRows>) -> Result<()>;
}

/// In-memory `LocalStore`. Holds rows per table behind one mutex so
/// `replace_all` is trivially atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows into one table, appending to whatever is there.
    pub fn seed(&self, table: &str, rows: Vec<Record>) {
        let mut tables = self.tables.lock().expect("memory store lock");
        tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Number of rows currently held for a table.
    pub fn row_count(&self, table: &str) -> usize {
        let tables = self.tables.lock().expect("memory store lock");
        tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    /// Snapshot of one table's rows.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        let tables = self.tables.lock().expect("memory store lock");
        tables.get(table).cloned().unwrap_or_default()
    }
}

impl LocalStore for MemoryStore {
    fn read_table(&self, descriptor: &TableDescriptor) -> Result<Vec<Record>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::query("memory store lock poisoned"))?;
        Ok(tables.get(descriptor.name).cloned().unwrap_or_default())
    }

    fn replace_all(&self, catalog: &[TableDescriptor], snapshot: Vec<TableRows>) -> Result<()> {
        for table in &snapshot {
            if !catalog.iter().any(|descriptor| descriptor.name == table.table) {
                return Err(StoreError::UnknownTable(table.table.clone()).into());
            }
        }

        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::transaction("memory store lock poisoned"))?;
        for descriptor in catalog {
            tables.insert(descriptor.name.to_string(), Vec::new());
        }
        for table in snapshot {
            tables.insert(table.table, table.rows);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_catalog, descriptor};
    use crate::value::Value;

    fn worker(id: i64, name: &str) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::Integer(id));
        record.insert("name".to_string(), Value::from(name));
        record
    }

    #[test]
    fn replace_all_clears_unlisted_tables() {
        let store = MemoryStore::new();
        store.seed("workers", vec![worker(1, "Ada")]);
        store.seed("projects", vec![worker(9, "unused shape")]);

        store
            .replace_all(
                default_catalog(),
                vec![TableRows::new("workers", vec![worker(2, "Grace")])],
            )
            .unwrap();

        assert_eq!(store.row_count("workers"), 1);
        assert_eq!(store.row_count("projects"), 0);
        let workers = descriptor("workers").unwrap();
        let rows = store.read_table(workers).unwrap();
        assert_eq!(rows[0].get("name"), Some(&Value::from("Grace")));
    }

    #[test]
    fn replace_all_rejects_unknown_tables() {
        let store = MemoryStore::new();
        let result = store.replace_all(
            default_catalog(),
            vec![TableRows::new("invoices", Vec::new())],
        );
        assert!(result.is_err());
    }
}
