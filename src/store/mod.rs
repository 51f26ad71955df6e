//! Typed access to the item / loading database.
//!
//! `Store` owns a single `rusqlite::Connection` with foreign keys enabled.
//! Constraint checks live in the schema; write methods only translate the
//! engine's violations into [`StoreError`] variants. Every method is one
//! statement or one transaction, so a rejected write leaves nothing behind.

mod characteristics;
mod error;
mod item_types;
mod items;
mod loading;
mod product_loading;
mod product_map;
mod reports;

pub use error::{Result, StoreError};

use error::WriteContext;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

use crate::schema::ALL_TABLES;
use crate::writer::{create_tables, CONNECTION_PRAGMAS};

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open an existing database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Fresh in-memory database with every table created and no rows
    pub fn open_in_memory() -> Result<Self> {
        let store = Self::from_connection(Connection::open_in_memory()?)?;
        create_tables(&store.conn, ALL_TABLES)?;
        Ok(store)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(Self { conn })
    }

    /// Raw connection, for queries the typed API does not cover
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// `UPDATE table SET ... WHERE id = ?` over the provided columns
    fn update_row(
        &self,
        table: &'static str,
        id: i64,
        fields: Vec<(&'static str, Value)>,
    ) -> Result<()> {
        if fields.is_empty() {
            return Err(StoreError::NoFieldsToUpdate);
        }

        let set_clause = fields
            .iter()
            .enumerate()
            .map(|(idx, (col, _))| format!("{} = ?{}", col, idx + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            set_clause,
            fields.len() + 1
        );

        let values = fields
            .into_iter()
            .map(|(_, v)| v)
            .chain(std::iter::once(Value::Integer(id)));

        let changed = self.conn.execute(&sql, params_from_iter(values)).on_table(table)?;
        if changed == 0 {
            return Err(StoreError::NotFound { table, id });
        }

        debug!("Updated {} row {}", table, id);
        Ok(())
    }

    /// `DELETE FROM table WHERE id = ?`
    fn delete_row(&self, table: &'static str, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", table), [id])
            .on_table(table)?;
        if changed == 0 {
            return Err(StoreError::NotFound { table, id });
        }

        debug!("Deleted {} row {}", table, id);
        Ok(())
    }

    /// Ids of rows in `table` matching every filter
    fn ids_matching(&self, table: &'static str, filters: Vec<(&'static str, Value)>) -> Result<Vec<i64>> {
        if filters.is_empty() {
            return Err(StoreError::NoFilters);
        }

        let where_clause = filters
            .iter()
            .enumerate()
            .map(|(idx, (col, _))| format!("{} IS ?{}", col, idx + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!("SELECT id FROM {} WHERE {} ORDER BY id", table, where_clause);

        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(filters.into_iter().map(|(_, v)| v)), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}

/// Collect the `Some` fields of a partial update or filter
fn present(fields: Vec<(&'static str, Option<Value>)>) -> Vec<(&'static str, Value)> {
    fields
        .into_iter()
        .filter_map(|(col, v)| v.map(|v| (col, v)))
        .collect()
}

fn text(v: Option<String>) -> Option<Value> {
    v.map(Value::Text)
}

fn integer(v: Option<i64>) -> Option<Value> {
    v.map(Value::Integer)
}

/// `Some(None)` becomes SQL NULL
fn nullable_integer(v: Option<Option<i64>>) -> Option<Value> {
    v.map(|v| v.map(Value::Integer).unwrap_or(Value::Null))
}
