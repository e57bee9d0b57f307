//! Connection management and catalog-driven schema creation.

use rusqlite::Connection;

use crewline_core::catalog::{SemanticType, TableDescriptor};
use crewline_core::errors::{Result, StoreError};

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub(crate) fn sql_err(err: rusqlite::Error) -> StoreError {
    StoreError::query(err.to_string())
}

/// Local column affinity for each semantic type. Decimals are stored as
/// text to preserve precision across the round trip.
fn column_type(semantic: SemanticType) -> &'static str {
    match semantic {
        SemanticType::Integer => "INTEGER",
        SemanticType::Boolean => "INTEGER",
        SemanticType::Decimal => "TEXT",
        SemanticType::Text => "TEXT",
        SemanticType::Date => "TEXT",
        SemanticType::DateTime => "TEXT",
        SemanticType::Structured => "TEXT",
    }
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(sql_err)?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(sql_err)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(sql_err)?;
    Ok(())
}

/// Open (or create) the database file and apply connection pragmas.
pub fn open(path: &std::path::Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(sql_err)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(sql_err)?;
    configure(&conn)?;
    Ok(conn)
}

fn create_table_sql(descriptor: &TableDescriptor) -> String {
    let columns = descriptor
        .columns
        .iter()
        .map(|column| {
            let mut definition = format!(
                "{} {}",
                quote_identifier(column.name),
                column_type(column.semantic)
            );
            if column.name == "id" {
                definition.push_str(" PRIMARY KEY");
            }
            definition
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(descriptor.name),
        columns
    )
}

/// Create the settings table and every catalog table that does not exist
/// yet. Existing tables are left untouched.
pub fn ensure_schema(conn: &Connection, catalog: &[TableDescriptor]) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS settings (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
    )
    .map_err(sql_err)?;

    for descriptor in catalog {
        conn.execute_batch(&create_table_sql(descriptor))
            .map_err(sql_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewline_core::catalog::default_catalog;

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = open_in_memory().unwrap();
        ensure_schema(&conn, default_catalog()).unwrap();
        ensure_schema(&conn, default_catalog()).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='payrolls'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn id_columns_become_primary_keys() {
        let workers = crewline_core::catalog::descriptor("workers").unwrap();
        let sql = create_table_sql(workers);
        assert!(sql.contains("`id` INTEGER PRIMARY KEY"));
    }
}
