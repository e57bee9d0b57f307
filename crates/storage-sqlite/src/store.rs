//! Catalog-driven SQLite implementation of the local store.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crewline_core::catalog::{default_catalog, TableDescriptor};
use crewline_core::codec::decode_value;
use crewline_core::errors::{Error, Result, StoreError};
use crewline_core::store::{LocalStore, TableRows};
use crewline_core::value::{Record, Value};

use crate::db::{self, quote_identifier, sql_err};
use crate::settings::SqliteSettingsRepository;

/// Local store over one SQLite database file. Tables are created from the
/// catalog on open; `replace_all` runs as a single rolled-back-on-error
/// transaction spanning every synchronized table.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    catalog: &'static [TableDescriptor],
}

impl SqliteStore {
    /// Open (or create) a store at `path` with the default catalog.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_catalog(path, default_catalog())
    }

    pub fn open_with_catalog(path: &Path, catalog: &'static [TableDescriptor]) -> Result<Self> {
        let conn = db::open(path)?;
        db::ensure_schema(&conn, catalog)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            catalog,
        })
    }

    /// Open a private in-memory store with the default catalog.
    pub fn in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        db::ensure_schema(&conn, default_catalog())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            catalog: default_catalog(),
        })
    }

    /// Settings repository sharing this store's connection.
    pub fn settings(&self) -> SqliteSettingsRepository {
        SqliteSettingsRepository::new(Arc::clone(&self.conn))
    }

    /// The catalog this store was opened with.
    pub fn catalog(&self) -> &'static [TableDescriptor] {
        self.catalog
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::query("sqlite connection lock poisoned").into())
    }

    /// Insert one row into a synchronized table. Used by the data-entry
    /// layer; sync itself only reads and bulk-replaces.
    pub fn insert_record(&self, descriptor: &TableDescriptor, record: &Record) -> Result<()> {
        let conn = self.lock()?;
        let mut statement = conn
            .prepare(&insert_sql(descriptor))
            .map_err(sql_err)?;
        statement
            .execute(rusqlite::params_from_iter(row_params(descriptor, record)))
            .map_err(|e| StoreError::transaction(e.to_string()))?;
        Ok(())
    }

    /// Number of rows currently held in one table.
    pub fn row_count(&self, table: &str) -> Result<usize> {
        let conn = self.lock()?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let count: i64 = conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(sql_err)?;
        Ok(count as usize)
    }
}

fn insert_sql(descriptor: &TableDescriptor) -> String {
    let columns = descriptor
        .columns
        .iter()
        .map(|column| quote_identifier(column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=descriptor.columns.len())
        .map(|index| format!("?{}", index))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(descriptor.name),
        columns,
        placeholders
    )
}

/// Render one record as positional parameters in descriptor column order.
fn row_params(descriptor: &TableDescriptor, record: &Record) -> Vec<rusqlite::types::Value> {
    descriptor
        .columns
        .iter()
        .map(|column| to_sql_value(record.get(column.name).unwrap_or(&Value::Null)))
        .collect()
}

fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Sql::Null,
        Value::Integer(n) => Sql::Integer(*n),
        Value::Bool(b) => Sql::Integer(i64::from(*b)),
        Value::Decimal(d) => Sql::Text(d.to_string()),
        Value::Text(text) => Sql::Text(text.clone()),
        Value::Date(date) => Sql::Text(date.format("%Y-%m-%d").to_string()),
        Value::DateTime(datetime) => Sql::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Structured(json) => Sql::Text(serde_json::to_string(json).unwrap_or_default()),
    }
}

/// Lift one stored cell into the codec's wire shape so both decode paths
/// share one set of conversion rules.
fn json_from_sql(raw: ValueRef<'_>) -> Result<serde_json::Value> {
    match raw {
        ValueRef::Null => Ok(serde_json::Value::Null),
        ValueRef::Integer(n) => Ok(serde_json::Value::from(n)),
        ValueRef::Real(f) => Ok(serde_json::Value::from(f)),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(serde_json::Value::String)
            .map_err(|_| Error::decode("stored text is not valid UTF-8")),
        ValueRef::Blob(_) => Err(Error::decode("unexpected blob in synchronized table")),
    }
}

impl LocalStore for SqliteStore {
    fn read_table(&self, descriptor: &TableDescriptor) -> Result<Vec<Record>> {
        let conn = self.lock()?;
        let columns = descriptor
            .columns
            .iter()
            .map(|column| quote_identifier(column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {}",
            columns,
            quote_identifier(descriptor.name)
        );

        let mut statement = conn.prepare(&sql).map_err(sql_err)?;
        let mut rows = statement.query([]).map_err(sql_err)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(sql_err)? {
            let mut record = Record::with_capacity(descriptor.columns.len());
            for (index, column) in descriptor.columns.iter().enumerate() {
                let raw = row.get_ref(index).map_err(sql_err)?;
                let json = json_from_sql(raw)?;
                record.insert(
                    column.name.to_string(),
                    decode_value(&json, column.semantic)?,
                );
            }
            records.push(record);
        }
        Ok(records)
    }

    fn replace_all(&self, catalog: &[TableDescriptor], snapshot: Vec<TableRows>) -> Result<()> {
        for table in &snapshot {
            if !catalog
                .iter()
                .any(|descriptor| descriptor.name == table.table)
            {
                return Err(StoreError::UnknownTable(table.table.clone()).into());
            }
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::transaction(e.to_string()))?;

        // Rows arrive in catalog order, not FK dependency order; let
        // constraints validate at commit time.
        tx.execute_batch("PRAGMA defer_foreign_keys = ON")
            .map_err(|e| StoreError::transaction(e.to_string()))?;

        for descriptor in catalog {
            let clear_sql = format!("DELETE FROM {}", quote_identifier(descriptor.name));
            tx.execute(&clear_sql, [])
                .map_err(|e| StoreError::transaction(e.to_string()))?;
        }

        for table in &snapshot {
            if table.rows.is_empty() {
                continue;
            }
            let descriptor = catalog
                .iter()
                .find(|descriptor| descriptor.name == table.table)
                .ok_or_else(|| StoreError::UnknownTable(table.table.clone()))?;

            let mut statement = tx
                .prepare(&insert_sql(descriptor))
                .map_err(|e| StoreError::transaction(e.to_string()))?;
            for record in &table.rows {
                statement
                    .execute(rusqlite::params_from_iter(row_params(descriptor, record)))
                    .map_err(|e| {
                        StoreError::transaction(format!(
                            "bulk insert into '{}' failed: {}",
                            table.table, e
                        ))
                    })?;
            }
        }

        tx.commit()
            .map_err(|e| StoreError::transaction(e.to_string()))?;
        Ok(())
    }
}
