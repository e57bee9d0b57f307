//! Schema catalog: the static description of every synchronized table.
//!
//! Descriptor declaration order is the order used by the dump generator,
//! and column order within a descriptor drives the positional order of
//! bulk-insert value tuples. Encode and decode paths both walk the same
//! descriptor, so the ordering invariant holds by construction.

use serde::{Deserialize, Serialize};

/// Canonical list of local tables that participate in bridge sync.
pub const SYNC_TABLES: [&str; 6] = [
    "clients",
    "projects",
    "workers",
    "attendance",
    "payrolls",
    "expenses",
];

/// Semantic type of a synchronized column. Selects the escaping rule on
/// encode and the conversion rule on decode; remote column types are not
/// enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Integer,
    Decimal,
    Text,
    Date,
    DateTime,
    Boolean,
    Structured,
}

/// One column of a synchronized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub semantic: SemanticType,
}

/// Static description of one synchronized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableDescriptor {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Columns carrying structured (nested object/array) values.
    pub fn structured_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns
            .iter()
            .filter(|column| column.semantic == SemanticType::Structured)
    }

    /// Whether the table carries an `id` column usable as a primary key.
    pub fn has_id_column(&self) -> bool {
        self.column("id").is_some()
    }
}

use SemanticType::*;

const fn col(name: &'static str, semantic: SemanticType) -> ColumnSpec {
    ColumnSpec { name, semantic }
}

const CLIENT_COLUMNS: &[ColumnSpec] = &[
    col("id", Integer),
    col("name", Text),
    col("phone", Text),
    col("address", Text),
    col("notes", Text),
    col("created_at", DateTime),
];

const PROJECT_COLUMNS: &[ColumnSpec] = &[
    col("id", Integer),
    col("client_id", Integer),
    col("name", Text),
    col("status", Text),
    col("budget", Decimal),
    col("start_date", Date),
    col("end_date", Date),
    col("metadata", Structured),
    col("created_at", DateTime),
];

const WORKER_COLUMNS: &[ColumnSpec] = &[
    col("id", Integer),
    col("name", Text),
    col("role", Text),
    col("daily_rate", Decimal),
    col("active", Boolean),
    col("joined_on", Date),
];

const ATTENDANCE_COLUMNS: &[ColumnSpec] = &[
    col("id", Integer),
    col("worker_id", Integer),
    col("project_id", Integer),
    col("day", Date),
    col("present", Boolean),
    col("hours", Decimal),
];

const PAYROLL_COLUMNS: &[ColumnSpec] = &[
    col("id", Integer),
    col("worker_id", Integer),
    col("period_start", Date),
    col("period_end", Date),
    col("total", Decimal),
    col("paid", Boolean),
    col("details", Structured),
    col("created_at", DateTime),
];

const EXPENSE_COLUMNS: &[ColumnSpec] = &[
    col("id", Integer),
    col("project_id", Integer),
    col("label", Text),
    col("amount", Decimal),
    col("spent_on", Date),
    col("receipts", Structured),
];

/// The synchronized tables in declaration order.
const CATALOG: &[TableDescriptor] = &[
    TableDescriptor {
        name: "clients",
        columns: CLIENT_COLUMNS,
    },
    TableDescriptor {
        name: "projects",
        columns: PROJECT_COLUMNS,
    },
    TableDescriptor {
        name: "workers",
        columns: WORKER_COLUMNS,
    },
    TableDescriptor {
        name: "attendance",
        columns: ATTENDANCE_COLUMNS,
    },
    TableDescriptor {
        name: "payrolls",
        columns: PAYROLL_COLUMNS,
    },
    TableDescriptor {
        name: "expenses",
        columns: EXPENSE_COLUMNS,
    },
];

/// Returns the default Crewline catalog.
pub fn default_catalog() -> &'static [TableDescriptor] {
    CATALOG
}

/// Look up a descriptor in the default catalog.
pub fn descriptor(table: &str) -> Option<&'static TableDescriptor> {
    CATALOG.iter().find(|descriptor| descriptor.name == table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_sync_table_list() {
        let names = default_catalog()
            .iter()
            .map(|descriptor| descriptor.name)
            .collect::<Vec<_>>();
        assert_eq!(names, SYNC_TABLES);
    }

    #[test]
    fn every_table_has_an_id_column() {
        for descriptor in default_catalog() {
            assert!(
                descriptor.has_id_column(),
                "table {} is missing an id column",
                descriptor.name
            );
        }
    }

    #[test]
    fn structured_columns_are_exposed() {
        let payrolls = descriptor("payrolls").expect("payrolls descriptor");
        let structured = payrolls
            .structured_columns()
            .map(|column| column.name)
            .collect::<Vec<_>>();
        assert_eq!(structured, vec!["details"]);
    }

    #[test]
    fn unknown_table_lookup_returns_none() {
        assert!(descriptor("invoices").is_none());
    }
}
