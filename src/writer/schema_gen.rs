use rusqlite::Connection;

use crate::schema::{PrimaryKey, TableSchema};

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let pk = match schema.primary_key {
            PrimaryKey::AutoIncrement(pk_col) if pk_col == col.name => " PRIMARY KEY AUTOINCREMENT",
            _ => "",
        };
        // An INTEGER PRIMARY KEY is the rowid and can never be NULL
        let null_constraint = if !col.nullable && pk.is_empty() { " NOT NULL" } else { "" };
        let unique = if col.unique { " UNIQUE" } else { "" };
        let check = col
            .check
            .map(|expr| format!(" CHECK ({})", expr))
            .unwrap_or_default();

        columns.push(format!(
            "    {} {}{}{}{}{}",
            col.name,
            col.col_type.sql_type(),
            pk,
            null_constraint,
            unique,
            check
        ));
    }

    if let PrimaryKey::Composite(pk_cols) = schema.primary_key {
        columns.push(format!("    PRIMARY KEY ({})", pk_cols.join(", ")));
    }

    for unique_cols in schema.unique {
        columns.push(format!("    UNIQUE ({})", unique_cols.join(", ")));
    }

    // Every relationship cascades in both directions
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE ON UPDATE CASCADE",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns and explicit indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let fk_indexes = schema.foreign_keys.iter().map(|fk| {
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
            schema.name, fk.column, schema.name, fk.column
        )
    });

    let explicit = schema.indexes.iter().map(|idx| {
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {}({})",
            if idx.unique { "UNIQUE " } else { "" },
            idx.name,
            schema.name,
            idx.columns.join(", ")
        )
    });

    fk_indexes.chain(explicit).collect()
}

/// Create tables and their indexes on an open connection
pub fn create_tables(conn: &Connection, schemas: &[&TableSchema]) -> rusqlite::Result<()> {
    for schema in schemas {
        conn.execute(&generate_create_table(schema), [])?;
        for index_sql in generate_indexes(schema) {
            conn.execute(&index_sql, [])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ITEM_CHARACTERISTICS, ITEM_LOADING, ITEM_PRODUCT_MAP, ITEM_TYPES};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&ITEM_TYPES);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS itemtypes"));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("typename TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_generate_checks_and_cascades() {
        let sql = generate_create_table(&ITEM_LOADING);
        assert!(sql.contains("CHECK (dailyrollupexists IN (0, 1))"));
        assert!(sql.contains("CHECK (percent BETWEEN 0 AND 100)"));
        assert!(sql.contains("monthyear TEXT NOT NULL CHECK (monthyear GLOB"));
        assert!(sql.contains("fkproduct INTEGER,") || sql.contains("fkproduct INTEGER\n"));
        assert!(sql.contains(
            "FOREIGN KEY (fkproduct) REFERENCES items(id) ON DELETE CASCADE ON UPDATE CASCADE"
        ));
    }

    #[test]
    fn test_composite_key_and_table_unique() {
        let map_sql = generate_create_table(&ITEM_PRODUCT_MAP);
        assert!(map_sql.contains("PRIMARY KEY (fkitem, fkproduct)"));
        assert!(!map_sql.contains("AUTOINCREMENT"));

        let chars_sql = generate_create_table(&ITEM_CHARACTERISTICS);
        assert!(chars_sql.contains("UNIQUE (fkitem, itemkey)"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&ITEM_LOADING);
        assert!(indexes.iter().any(|i| i.contains("idx_itemloading_fkitem")));
        assert!(indexes.iter().any(|i| i.contains("idx_itemloading_fkproduct")));
        assert!(indexes.iter().any(|i| i.starts_with(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_itemloading_item_month_product"
        )));
    }

    #[test]
    fn test_generated_sql_is_accepted_by_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn, crate::schema::ALL_TABLES).unwrap();
        // Idempotent
        create_tables(&conn, crate::schema::ALL_TABLES).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, crate::schema::ALL_TABLES.len() as i64);
    }
}
