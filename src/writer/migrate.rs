//! In-place upgrade of databases created by earlier releases.
//!
//! Older databases have an `itemloading` table without `fkproduct` and no
//! `productloading` table. Some were upgraded by an earlier tool that made
//! `fkproduct` mandatory and pointed every existing row at a placeholder
//! `UNALLOCATED` product item. Upgrading rebuilds `itemloading` in both cases
//! (SQLite cannot change a column in place), keeps those rows as unallocated
//! capacity, creates whatever tables are missing and makes sure all indexes
//! exist.
//!
//! Neither older shape enforced one row per item, month and product. When
//! several rows share a scope the one with the highest id is kept.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;

use super::schema_gen::{create_tables, generate_create_table, generate_indexes};
use super::sqlite::CONNECTION_PRAGMAS;
use crate::schema::tables::ITEM_LOADING;
use crate::schema::ALL_TABLES;

const LEGACY_LOADING_TABLE: &str = "itemloading_legacy";

/// Rows pointing at the placeholder product become unallocated
const UNALLOCATED_TO_NULL: &str = "CASE WHEN fkproduct IN (
        SELECT i.id FROM items i JOIN itemtypes t ON t.id = i.fkitemtype
        WHERE t.typename = 'PRODUCT' AND i.itemname = 'UNALLOCATED'
    ) THEN NULL ELSE fkproduct END";

/// Shape of `itemloading.fkproduct` in an existing database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductColumn {
    Missing,
    Required,
    Nullable,
}

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [name],
        |row| row.get(0),
    )
}

fn product_column(conn: &Connection) -> rusqlite::Result<ProductColumn> {
    let not_null: Option<bool> = conn
        .query_row(
            "SELECT \"notnull\" FROM pragma_table_info(?1) WHERE name = 'fkproduct'",
            [ITEM_LOADING.name],
            |row| row.get(0),
        )
        .optional()?;

    Ok(match not_null {
        None => ProductColumn::Missing,
        Some(true) => ProductColumn::Required,
        Some(false) => ProductColumn::Nullable,
    })
}

/// Legacy rows as they will be written, with `product` as the new `fkproduct`
fn source_rows(product: &str) -> String {
    format!(
        "WITH source AS (
            SELECT id, fkitem, dailyrollupexists, monthyear, percent, {} AS fkproduct
            FROM {}
        )",
        product, LEGACY_LOADING_TABLE
    )
}

fn duplicate_scopes(tx: &Transaction, product: &str) -> Result<Vec<(i64, String, i64)>> {
    let sql = format!(
        "{} SELECT fkitem, monthyear, COUNT(*) FROM source
         GROUP BY fkitem, monthyear, IFNULL(fkproduct, 0)
         HAVING COUNT(*) > 1
         ORDER BY fkitem, monthyear",
        source_rows(product)
    );
    let mut stmt = tx.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

/// Row counts from rebuilding `itemloading`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rebuilt {
    copied: usize,
    dropped: usize,
}

fn rebuild_loading(tx: &Transaction, product: &str) -> Result<Rebuilt> {
    tx.execute_batch(&format!(
        "ALTER TABLE itemloading RENAME TO {};",
        LEGACY_LOADING_TABLE
    ))?;
    tx.execute(&generate_create_table(&ITEM_LOADING), [])?;

    let duplicates = duplicate_scopes(tx, product)?;
    for (item_id, month, count) in &duplicates {
        warn!(
            "Item {} has {} loading rows for {} in one product scope; keeping the newest",
            item_id, count, month
        );
    }

    let total: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM {}", LEGACY_LOADING_TABLE),
        [],
        |row| row.get(0),
    )?;

    let copied = tx
        .execute(
            &format!(
                "{} INSERT INTO itemloading (id, fkitem, dailyrollupexists, monthyear, percent, fkproduct)
                 SELECT id, fkitem, dailyrollupexists, monthyear, percent, fkproduct FROM source
                 WHERE id IN (
                     SELECT MAX(id) FROM source GROUP BY fkitem, monthyear, IFNULL(fkproduct, 0)
                 )",
                source_rows(product)
            ),
            [],
        )
        .context("Existing loading rows violate the current constraints")?;

    tx.execute_batch(&format!("DROP TABLE {};", LEGACY_LOADING_TABLE))?;

    Ok(Rebuilt {
        copied,
        dropped: total as usize - copied,
    })
}

/// Apply every pending upgrade step in one transaction.
/// Returns the names of the steps that were applied.
pub fn upgrade(conn: &mut Connection) -> Result<Vec<String>> {
    let tx = conn.transaction()?;
    let mut applied = Vec::new();

    if table_exists(&tx, ITEM_LOADING.name)? {
        let step = match product_column(&tx)? {
            ProductColumn::Missing => Some(("itemloading.fkproduct", "NULL")),
            ProductColumn::Required => Some(("itemloading.fkproduct nullable", UNALLOCATED_TO_NULL)),
            ProductColumn::Nullable => None,
        };
        if let Some((name, product)) = step {
            let rebuilt = rebuild_loading(&tx, product)?;
            info!("Rebuilt itemloading ({}); {} row(s) kept", name, rebuilt.copied);
            applied.push(name.to_string());
            if rebuilt.dropped > 0 {
                applied.push(format!("itemloading: dropped {} duplicate row(s)", rebuilt.dropped));
            }
        }
    }

    for schema in ALL_TABLES {
        if !table_exists(&tx, schema.name)? {
            create_tables(&tx, &[*schema])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;
            applied.push(format!("create {}", schema.name));
        }
    }

    for schema in ALL_TABLES {
        for index_sql in generate_indexes(schema) {
            tx.execute(&index_sql, [])
                .with_context(|| format!("Failed to create index on {}", schema.name))?;
        }
    }

    tx.commit()?;

    if applied.is_empty() {
        info!("Database schema is up to date; no migrations were applied");
    } else {
        info!("Applied {} migration(s): {}", applied.len(), applied.join(", "));
    }

    Ok(applied)
}

/// Open an existing database file and upgrade it
pub fn migrate_database(db_path: &Path) -> Result<Vec<String>> {
    if !db_path.exists() {
        bail!("Database {:?} does not exist", db_path);
    }

    let mut conn = Connection::open(db_path).context("Failed to open database")?;
    conn.execute_batch(CONNECTION_PRAGMAS)?;
    upgrade(&mut conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_SCHEMA: &str = "
        PRAGMA foreign_keys = ON;
        CREATE TABLE itemtypes (id INTEGER PRIMARY KEY AUTOINCREMENT, typename TEXT NOT NULL UNIQUE);
        CREATE TABLE items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            itemname TEXT NOT NULL,
            fkitemtype INTEGER NOT NULL,
            FOREIGN KEY (fkitemtype) REFERENCES itemtypes(id) ON DELETE CASCADE ON UPDATE CASCADE
        );
        CREATE TABLE itemcharacteristics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fkitem INTEGER NOT NULL,
            itemkey TEXT NOT NULL,
            itemvalue TEXT NOT NULL,
            itemkeyvaluetype TEXT,
            UNIQUE (fkitem, itemkey),
            FOREIGN KEY (fkitem) REFERENCES items(id) ON DELETE CASCADE ON UPDATE CASCADE
        );
        CREATE TABLE itemloading (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fkitem INTEGER NOT NULL,
            dailyrollupexists INTEGER NOT NULL CHECK (dailyrollupexists IN (0, 1)),
            monthyear TEXT NOT NULL,
            percent REAL NOT NULL CHECK (percent BETWEEN 0 AND 100),
            FOREIGN KEY (fkitem) REFERENCES items(id) ON DELETE CASCADE ON UPDATE CASCADE
        );
        CREATE INDEX idx_itemloading_fkitem ON itemloading (fkitem);
        INSERT INTO itemtypes (id, typename) VALUES (3, 'STATION');
        INSERT INTO items (id, itemname, fkitemtype) VALUES (6, 'DV-SPYKER', 3);
        INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent) VALUES (6, 0, '2025-01', 14.0);
        INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent) VALUES (6, 1, '2025-02', 22.0);
    ";

    /// Layout left behind by the older tool that made `fkproduct` mandatory
    const REQUIRED_PRODUCT_SCHEMA: &str = "
        PRAGMA foreign_keys = ON;
        CREATE TABLE itemtypes (id INTEGER PRIMARY KEY AUTOINCREMENT, typename TEXT NOT NULL UNIQUE);
        CREATE TABLE items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            itemname TEXT NOT NULL,
            fkitemtype INTEGER NOT NULL,
            FOREIGN KEY (fkitemtype) REFERENCES itemtypes(id) ON DELETE CASCADE ON UPDATE CASCADE
        );
        CREATE TABLE itemloading (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fkitem INTEGER NOT NULL,
            dailyrollupexists INTEGER NOT NULL CHECK (dailyrollupexists IN (0, 1)),
            monthyear TEXT NOT NULL CHECK (
                length(monthyear) = 7 AND substr(monthyear, 5, 1) = '-' AND
                CAST(substr(monthyear, 1, 4) AS INTEGER) BETWEEN 2000 AND 2100 AND
                CAST(substr(monthyear, 6, 2) AS INTEGER) BETWEEN 1 AND 12
            ),
            percent REAL NOT NULL CHECK (percent BETWEEN 0 AND 100),
            fkproduct INTEGER NOT NULL,
            FOREIGN KEY (fkitem) REFERENCES items(id) ON DELETE CASCADE ON UPDATE CASCADE,
            FOREIGN KEY (fkproduct) REFERENCES items(id) ON DELETE CASCADE ON UPDATE CASCADE
        );
        CREATE INDEX idx_itemloading_fkitem ON itemloading (fkitem);
        CREATE INDEX idx_itemloading_fkproduct ON itemloading (fkproduct);
        INSERT INTO itemtypes (id, typename) VALUES (3, 'STATION');
        INSERT INTO itemtypes (id, typename) VALUES (5, 'PRODUCT');
        INSERT INTO items (id, itemname, fkitemtype) VALUES (6, 'DV-SPYKER', 3);
        INSERT INTO items (id, itemname, fkitemtype) VALUES (11, 'UNALLOCATED', 5);
        INSERT INTO items (id, itemname, fkitemtype) VALUES (12, 'WIDGET-A', 5);
        INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent, fkproduct) VALUES (6, 0, '2025-01', 14.0, 11);
        INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent, fkproduct) VALUES (6, 0, '2025-01', 30.0, 12);
    ";

    fn legacy_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(LEGACY_SCHEMA).unwrap();
        conn
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)").unwrap();
        let names = stmt.query_map([table], |row| row.get(0)).unwrap();
        names.collect::<rusqlite::Result<_>>().unwrap()
    }

    fn loading_rows(conn: &Connection) -> Vec<(String, f64, Option<i64>)> {
        conn.prepare("SELECT monthyear, percent, fkproduct FROM itemloading ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_upgrade_legacy_database() {
        let mut conn = legacy_db();
        let applied = upgrade(&mut conn).unwrap();

        assert_eq!(
            applied,
            vec![
                "itemloading.fkproduct".to_string(),
                "create item_product_map".to_string(),
                "create productloading".to_string(),
            ]
        );

        let columns = table_columns(&conn, "itemloading");
        assert!(columns.contains(&"fkproduct".to_string()));
        assert!(!table_exists(&conn, LEGACY_LOADING_TABLE).unwrap());

        let rows: Vec<(String, f64, bool, Option<i64>)> = conn
            .prepare("SELECT monthyear, percent, dailyrollupexists, fkproduct FROM itemloading ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![
                ("2025-01".to_string(), 14.0, false, None),
                ("2025-02".to_string(), 22.0, true, None),
            ]
        );
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let mut conn = legacy_db();
        upgrade(&mut conn).unwrap();
        let second = upgrade(&mut conn).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_upgraded_table_enforces_month_check() {
        let mut conn = legacy_db();
        upgrade(&mut conn).unwrap();

        let result = conn.execute(
            "INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent) VALUES (6, 0, '2025-13', 1.0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_upgrade_rolls_back_on_bad_legacy_rows() {
        let mut conn = legacy_db();
        conn.execute(
            "INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent) VALUES (6, 0, 'March', 5.0)",
            [],
        )
        .unwrap();

        assert!(upgrade(&mut conn).is_err());

        // Nothing changed
        let columns = table_columns(&conn, "itemloading");
        assert!(!columns.contains(&"fkproduct".to_string()));
        assert!(!table_exists(&conn, "productloading").unwrap());
    }

    #[test]
    fn test_upgrade_keeps_newest_row_for_a_repeated_month() {
        let mut conn = legacy_db();
        conn.execute(
            "INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent) VALUES (6, 0, '2025-01', 10.0)",
            [],
        )
        .unwrap();

        let applied = upgrade(&mut conn).unwrap();
        assert_eq!(
            applied,
            vec![
                "itemloading.fkproduct".to_string(),
                "itemloading: dropped 1 duplicate row(s)".to_string(),
                "create item_product_map".to_string(),
                "create productloading".to_string(),
            ]
        );
        assert_eq!(
            loading_rows(&conn),
            vec![("2025-02".to_string(), 22.0, None), ("2025-01".to_string(), 10.0, None)]
        );

        let unique_index: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = 'uq_itemloading_item_month_product')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(unique_index);
    }

    #[test]
    fn test_upgrade_makes_required_product_nullable() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(REQUIRED_PRODUCT_SCHEMA).unwrap();

        let applied = upgrade(&mut conn).unwrap();
        assert_eq!(
            applied,
            vec![
                "itemloading.fkproduct nullable".to_string(),
                "create itemcharacteristics".to_string(),
                "create item_product_map".to_string(),
                "create productloading".to_string(),
            ]
        );
        assert_eq!(product_column(&conn).unwrap(), ProductColumn::Nullable);
        assert_eq!(
            loading_rows(&conn),
            vec![
                ("2025-01".to_string(), 14.0, None),
                ("2025-01".to_string(), 30.0, Some(12)),
            ]
        );

        // Unallocated writes work once the column accepts NULL
        let store = crate::store::Store::from_connection(conn).unwrap();
        let id = store
            .upsert_loading(&crate::model::NewLoading::new(6, "2025-02", 5.0))
            .unwrap();
        assert_eq!(store.loading(id).unwrap().unwrap().product_id, None);

        let mut conn = store.into_connection();
        assert!(upgrade(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_upgrade_creates_everything_on_empty_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        let applied = upgrade(&mut conn).unwrap();
        assert_eq!(applied.len(), ALL_TABLES.len());
    }
}
