//! Dump generator: renders the full local dataset as one self-contained
//! remote script.

use crewline_core::catalog::{SemanticType, TableDescriptor};
use crewline_core::codec::sql_literal;
use crewline_core::store::LocalStore;
use crewline_core::value::{Record, Value};

use crate::error::SyncError;

/// Remote column type for each semantic type.
fn column_type(semantic: SemanticType) -> &'static str {
    match semantic {
        SemanticType::Integer => "BIGINT",
        SemanticType::Decimal => "DECIMAL(18,6)",
        SemanticType::Text => "TEXT",
        SemanticType::Date => "DATE",
        SemanticType::DateTime => "DATETIME",
        SemanticType::Boolean => "TINYINT(1)",
        SemanticType::Structured => "LONGTEXT",
    }
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Drop-and-recreate header for one table, so the script is idempotent
/// with respect to remote schema existence.
fn table_header(descriptor: &TableDescriptor) -> String {
    let table = quote_identifier(descriptor.name);
    let mut columns = descriptor
        .columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier(column.name),
                column_type(column.semantic)
            )
        })
        .collect::<Vec<_>>();
    if descriptor.has_id_column() {
        columns.push("PRIMARY KEY (`id`)".to_string());
    }

    format!(
        "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} ({});",
        columns.join(", ")
    )
}

/// Render one row as a positional value tuple in descriptor column order.
/// Columns absent from the record render as NULL.
fn value_tuple(descriptor: &TableDescriptor, record: &Record) -> String {
    let values = descriptor
        .columns
        .iter()
        .map(|column| {
            record
                .get(column.name)
                .map(sql_literal)
                .unwrap_or_else(|| sql_literal(&Value::Null))
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})", values)
}

/// One multi-row bulk insert for a table, or `None` when it has no rows.
fn insert_statement(descriptor: &TableDescriptor, rows: &[Record]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let columns = descriptor
        .columns
        .iter()
        .map(|column| quote_identifier(column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let tuples = rows
        .iter()
        .map(|record| value_tuple(descriptor, record))
        .collect::<Vec<_>>()
        .join(",\n");

    Some(format!(
        "INSERT INTO {} ({}) VALUES\n{};",
        quote_identifier(descriptor.name),
        columns,
        tuples
    ))
}

/// Walk the catalog in declaration order and emit a full snapshot script.
///
/// Referential-integrity checks are disabled for the duration of the
/// script so table order need not respect foreign-key dependency order.
/// Any store read error aborts generation; no partial dump is returned.
pub fn generate_dump(
    catalog: &[TableDescriptor],
    store: &dyn LocalStore,
) -> Result<Option<String>, SyncError> {
    if catalog.is_empty() {
        return Ok(None);
    }

    let mut chunks = Vec::with_capacity(catalog.len() * 2 + 2);
    chunks.push("SET FOREIGN_KEY_CHECKS=0;".to_string());
    for descriptor in catalog {
        let rows = store.read_table(descriptor)?;
        chunks.push(table_header(descriptor));
        if let Some(insert) = insert_statement(descriptor, &rows) {
            chunks.push(insert);
        }
    }
    chunks.push("SET FOREIGN_KEY_CHECKS=1;".to_string());

    Ok(Some(chunks.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewline_core::catalog::default_catalog;
    use crewline_core::store::MemoryStore;

    fn project(id: i64, name: &str) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::Integer(id));
        record.insert("name".to_string(), Value::from(name));
        record
    }

    #[test]
    fn empty_catalog_yields_nothing_to_sync() {
        let store = MemoryStore::new();
        assert!(generate_dump(&[], &store).unwrap().is_none());
    }

    #[test]
    fn dump_is_wrapped_in_fk_directives() {
        let store = MemoryStore::new();
        let script = generate_dump(default_catalog(), &store)
            .unwrap()
            .expect("script");
        assert!(script.starts_with("SET FOREIGN_KEY_CHECKS=0;"));
        assert!(script.ends_with("SET FOREIGN_KEY_CHECKS=1;"));
    }

    #[test]
    fn populated_table_gets_one_insert_and_empty_table_only_a_header() {
        let store = MemoryStore::new();
        store.seed(
            "projects",
            vec![
                project(1, "Harbor wall"),
                project(2, "Mill roof"),
                project(3, "Depot fit-out"),
            ],
        );

        let script = generate_dump(default_catalog(), &store)
            .unwrap()
            .expect("script");

        assert_eq!(script.matches("INSERT INTO `projects`").count(), 1);
        assert_eq!(script.matches("INSERT INTO `workers`").count(), 0);
        assert!(script.contains("DROP TABLE IF EXISTS `workers`;"));
        assert!(script.contains("CREATE TABLE `workers`"));

        let insert_start = script.find("INSERT INTO `projects`").unwrap();
        let insert_end = insert_start + script[insert_start..].find(';').unwrap();
        let tuple_count = script[insert_start..insert_end]
            .lines()
            .filter(|line| line.starts_with('('))
            .count();
        assert_eq!(tuple_count, 3);
    }

    #[test]
    fn tuples_follow_descriptor_column_order() {
        let store = MemoryStore::new();
        let mut record = Record::new();
        // Insert in a scrambled order; the tuple must follow the catalog.
        record.insert("name".to_string(), Value::from("Ada"));
        record.insert("id".to_string(), Value::Integer(7));
        record.insert("active".to_string(), Value::Bool(true));
        store.seed("workers", vec![record]);

        let script = generate_dump(default_catalog(), &store)
            .unwrap()
            .expect("script");
        assert!(script.contains(
            "INSERT INTO `workers` (`id`, `name`, `role`, `daily_rate`, `active`, `joined_on`)"
        ));
        assert!(script.contains("(7, 'Ada', NULL, NULL, 1, NULL)"));
    }

    #[test]
    fn headers_declare_primary_keys() {
        let store = MemoryStore::new();
        let script = generate_dump(default_catalog(), &store)
            .unwrap()
            .expect("script");
        assert!(script.contains("CREATE TABLE `workers` (`id` BIGINT, `name` TEXT, `role` TEXT, `daily_rate` DECIMAL(18,6), `active` TINYINT(1), `joined_on` DATE, PRIMARY KEY (`id`));"));
    }
}
